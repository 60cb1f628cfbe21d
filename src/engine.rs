//! Per-user category/board engine.
//!
//! Keeps every board a user can see in exactly one of the user's categories,
//! creating the system default category on first read, and broadcasts each
//! committed change to the user's other sessions through one ordered queue.

use crate::{
    config::EngineConfig,
    domain::{
        category::{claimed_board_ids, find_category},
        verify_permutation, BoardId, Category, CategoryBoardEvent, CategoryBoards, CategoryId,
        TeamId, UserId,
    },
    error::{CategoryBoardsError, Result},
    notify::{ChangeQueue, Notifier},
    storage::{BoardLister, CategoryBoardStore, CategoryCreator},
};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Serializes engine operations on the same (user, team) scope
#[derive(Default)]
struct ScopeLocks {
    scopes: Mutex<HashMap<(UserId, TeamId), Arc<AsyncMutex<()>>>>,
}

impl ScopeLocks {
    async fn lock(&self, user_id: &UserId, team_id: &TeamId) -> OwnedMutexGuard<()> {
        let scope = {
            let mut scopes = self.scopes.lock().unwrap_or_else(PoisonError::into_inner);
            // entries nobody holds or waits on can go
            scopes.retain(|_, lock| Arc::strong_count(lock) > 1);
            scopes
                .entry((user_id.clone(), team_id.clone()))
                .or_default()
                .clone()
        };
        scope.lock_owned().await
    }
}

pub struct CategoryBoardsEngine {
    store: Arc<dyn CategoryBoardStore>,
    creator: Arc<dyn CategoryCreator>,
    lister: Arc<dyn BoardLister>,
    queue: ChangeQueue,
    config: EngineConfig,
    locks: ScopeLocks,
}

impl CategoryBoardsEngine {
    /// Creates an engine and starts its notification queue.
    /// Must be called from within a tokio runtime.
    pub fn new(
        store: Arc<dyn CategoryBoardStore>,
        creator: Arc<dyn CategoryCreator>,
        lister: Arc<dyn BoardLister>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let queue = ChangeQueue::new(notifier, &config);

        Ok(Self {
            store,
            creator,
            lister,
            queue,
            config,
            locks: ScopeLocks::default(),
        })
    }

    /// Creates an engine over a backend that provides all three storage roles
    pub fn with_backend<B>(
        backend: Arc<B>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Result<Self>
    where
        B: CategoryBoardStore + CategoryCreator + BoardLister + 'static,
    {
        Self::new(backend.clone(), backend.clone(), backend, notifier, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns every category of the user in the team with its ordered boards.
    ///
    /// This is a read-repair: when the user has no default category yet, one
    /// is created, and every visible board without a category is moved into
    /// the default category before the view is returned. See
    /// [`Self::ensure_default_category`].
    pub async fn get_user_category_boards(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
    ) -> Result<Vec<CategoryBoards>> {
        let _scope = self.locks.lock(user_id, team_id).await;
        self.load_view(user_id, team_id).await
    }

    /// Makes sure the user has a default category in the team and returns it.
    ///
    /// Visible boards that no category holds are moved into the default
    /// category, whether it was just created or already existed.
    pub async fn ensure_default_category(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
    ) -> Result<CategoryBoards> {
        let _scope = self.locks.lock(user_id, team_id).await;
        let mut view = self.fetch_view(user_id, team_id).await?;

        let index = self.repair_default(user_id, team_id, &mut view).await?;
        Ok(view.swap_remove(index))
    }

    /// Assigns one board to one category, replacing its previous category.
    ///
    /// The change is committed before a notification is queued. A full or
    /// closed queue does not fail the call since the stored state already
    /// reflects the move.
    pub async fn add_update_user_category_board(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
        category_id: &CategoryId,
        board_id: &BoardId,
    ) -> Result<()> {
        let _scope = self.locks.lock(user_id, team_id).await;

        self.store
            .add_update_category_board(user_id, category_id, board_id)
            .await
            .map_err(|e| {
                CategoryBoardsError::store(
                    "add_update_category_board",
                    format!(
                        "user: {user_id}, team: {team_id}, category: {category_id}, board: {board_id}"
                    ),
                    e,
                )
            })?;

        self.notify(CategoryBoardEvent::board_change(
            team_id.clone(),
            user_id.clone(),
            board_id.clone(),
            category_id.clone(),
        ));
        Ok(())
    }

    /// Batched form of [`Self::add_update_user_category_board`]. The boards
    /// are committed together and one notification per board is queued.
    pub async fn add_update_user_category_boards(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
        category_id: &CategoryId,
        board_ids: &[BoardId],
    ) -> Result<()> {
        if board_ids.is_empty() {
            return Ok(());
        }
        let _scope = self.locks.lock(user_id, team_id).await;
        self.assign_boards(team_id, user_id, category_id, board_ids)
            .await
    }

    /// Replaces the board order of one category.
    ///
    /// `new_order` must hold exactly the boards currently in the category.
    /// Membership changes go through [`Self::add_update_user_category_board`].
    pub async fn reorder_category_boards(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        category_id: &CategoryId,
        new_order: &[BoardId],
    ) -> Result<Vec<BoardId>> {
        let _scope = self.locks.lock(user_id, team_id).await;

        let view = self.load_view(user_id, team_id).await?;
        let existing = find_category(&view, category_id).ok_or_else(|| {
            CategoryBoardsError::CategoryNotFound {
                user_id: user_id.to_string(),
                team_id: team_id.to_string(),
                category_id: category_id.to_string(),
            }
        })?;
        verify_permutation(existing, user_id, team_id, new_order)?;

        let applied = self
            .store
            .reorder_category_boards(category_id, new_order)
            .await
            .map_err(|e| {
                CategoryBoardsError::store(
                    "reorder_category_boards",
                    format!("user: {user_id}, team: {team_id}, category: {category_id}"),
                    e,
                )
            })?;

        self.notify(CategoryBoardEvent::reorder(
            team_id.clone(),
            user_id.clone(),
            category_id.clone(),
            applied.clone(),
        ));
        Ok(applied)
    }

    /// Waits until all notifications queued so far have been handled
    pub async fn flush_notifications(&self) -> Result<()> {
        self.queue.flush().await
    }

    /// Stops the engine after delivering pending notifications
    pub async fn shutdown(self) {
        self.queue.shutdown().await;
    }

    async fn fetch_view(&self, user_id: &UserId, team_id: &TeamId) -> Result<Vec<CategoryBoards>> {
        self.store
            .get_user_category_boards(user_id, team_id)
            .await
            .map_err(|e| {
                CategoryBoardsError::store(
                    "get_user_category_boards",
                    format!("user: {user_id}, team: {team_id}"),
                    e,
                )
            })
    }

    /// Reads the view and repairs the default category. Caller holds the scope lock.
    async fn load_view(&self, user_id: &UserId, team_id: &TeamId) -> Result<Vec<CategoryBoards>> {
        let mut view = self.fetch_view(user_id, team_id).await?;
        self.repair_default(user_id, team_id, &mut view).await?;

        debug!(%user_id, %team_id, categories = view.len(), "loaded category boards");
        Ok(view)
    }

    /// Creates the default category when it is missing and moves every
    /// visible board without a category into it. Boards that already have a
    /// category are never touched, so repeated calls change nothing.
    ///
    /// Returns the index of the default category within `view`.
    async fn repair_default(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        view: &mut Vec<CategoryBoards>,
    ) -> Result<usize> {
        // list first so a listing failure leaves nothing behind
        let uncategorized = self.uncategorized_boards(user_id, team_id, view).await?;

        if let Some(index) = view.iter().position(|cb| cb.category.is_system()) {
            if !uncategorized.is_empty() {
                let category_id = view[index].id().clone();
                self.assign_boards(team_id, user_id, &category_id, &uncategorized)
                    .await?;
                info!(
                    %user_id,
                    %team_id,
                    %category_id,
                    boards = uncategorized.len(),
                    "moved uncategorized boards into default category"
                );
                view[index].board_ids.extend(uncategorized);
            }
            return Ok(index);
        }

        let category = self
            .creator
            .create_category(Category::new_system(
                self.config.default_category_name.clone(),
                user_id.clone(),
                team_id.clone(),
            ))
            .await
            .map_err(|e| default_creation_failed(user_id, team_id, e))?;

        if !uncategorized.is_empty() {
            self.assign_boards(team_id, user_id, &category.id, &uncategorized)
                .await?;
        }

        info!(
            %user_id,
            %team_id,
            category_id = %category.id,
            boards = uncategorized.len(),
            "created default category"
        );
        view.push(CategoryBoards::with_boards(category, uncategorized));
        Ok(view.len() - 1)
    }

    /// Visible boards that no category of `view` holds, in listing order
    async fn uncategorized_boards(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        view: &[CategoryBoards],
    ) -> Result<Vec<BoardId>> {
        let include_archived = self.config.include_archived_in_default;
        let boards = self
            .lister
            .get_boards_for_user_and_team(user_id, team_id, include_archived)
            .await
            .map_err(|e| default_creation_failed(user_id, team_id, e))?;

        let claimed = claimed_board_ids(view);
        let mut seen = HashSet::new();
        Ok(boards
            .into_iter()
            // a lister may ignore the archive flag
            .filter(|board| board.is_listed(include_archived))
            .map(|board| board.id)
            .filter(|id| !claimed.contains(id) && seen.insert(id.clone()))
            .collect())
    }

    async fn assign_boards(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
        category_id: &CategoryId,
        board_ids: &[BoardId],
    ) -> Result<()> {
        self.store
            .add_update_category_boards(user_id, category_id, board_ids)
            .await
            .map_err(|e| {
                CategoryBoardsError::store(
                    "add_update_category_boards",
                    format!(
                        "user: {user_id}, team: {team_id}, category: {category_id}, boards: {}",
                        board_ids.len()
                    ),
                    e,
                )
            })?;

        for board_id in board_ids {
            self.notify(CategoryBoardEvent::board_change(
                team_id.clone(),
                user_id.clone(),
                board_id.clone(),
                category_id.clone(),
            ));
        }
        Ok(())
    }

    fn notify(&self, event: CategoryBoardEvent) {
        if let Err(e) = self.queue.enqueue(event) {
            warn!(error = %e, "category change committed but notification was dropped");
        }
    }
}

fn default_creation_failed(
    user_id: &UserId,
    team_id: &TeamId,
    source: CategoryBoardsError,
) -> CategoryBoardsError {
    CategoryBoardsError::DefaultCategoryCreation {
        user_id: user_id.to_string(),
        team_id: team_id.to_string(),
        source: Box::new(source),
    }
}
