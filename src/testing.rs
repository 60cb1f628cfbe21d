//! Test doubles shared by the unit tests.

use crate::{
    domain::{
        Board, BoardId, Category, CategoryBoardEvent, CategoryBoards, CategoryId, TeamId, UserId,
    },
    error::{CategoryBoardsError, Result},
    notify::Notifier,
    storage::{memory_storage::MemoryStorage, BoardLister, CategoryBoardStore, CategoryCreator},
};
use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};
use tokio::sync::watch;

/// Notifier that records delivered events and can fail or stall on demand
pub struct RecordingNotifier {
    events: Mutex<Vec<CategoryBoardEvent>>,
    attempts: AtomicUsize,
    fail_first: usize,
    paused: watch::Sender<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::failing_first(0)
    }

    /// Fails the first `n` delivery attempts
    pub fn failing_first(n: usize) -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            events: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            fail_first: n,
            paused,
        }
    }

    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    pub fn events(&self) -> Vec<CategoryBoardEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    async fn record(&self, event: CategoryBoardEvent) -> Result<()> {
        let mut paused = self.paused.subscribe();
        let _ = paused.wait_for(|p| !*p).await;

        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_first {
            return Err(CategoryBoardsError::Notify(format!(
                "transport unavailable (attempt {})",
                attempt + 1
            )));
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn broadcast_category_board_change(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
        board_id: &BoardId,
        category_id: &CategoryId,
    ) -> Result<()> {
        self.record(CategoryBoardEvent::board_change(
            team_id.clone(),
            user_id.clone(),
            board_id.clone(),
            category_id.clone(),
        ))
        .await
    }

    async fn broadcast_category_boards_reorder(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
        category_id: &CategoryId,
        board_ids: &[BoardId],
    ) -> Result<()> {
        self.record(CategoryBoardEvent::reorder(
            team_id.clone(),
            user_id.clone(),
            category_id.clone(),
            board_ids.to_vec(),
        ))
        .await
    }
}

/// Memory storage with switchable failures and call counters
#[derive(Default)]
pub struct FaultyStorage {
    pub inner: MemoryStorage,
    pub fail_writes: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_listing: AtomicBool,
    pub created: AtomicUsize,
    pub writes: AtomicUsize,
}

impl FaultyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn injected(flag: &AtomicBool, what: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(CategoryBoardsError::StorageError(format!("injected {what} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryBoardStore for FaultyStorage {
    async fn get_user_category_boards(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
    ) -> Result<Vec<CategoryBoards>> {
        self.inner.get_user_category_boards(user_id, team_id).await
    }

    async fn add_update_category_board(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        board_id: &BoardId,
    ) -> Result<()> {
        Self::injected(&self.fail_writes, "write")?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner
            .add_update_category_board(user_id, category_id, board_id)
            .await
    }

    async fn add_update_category_boards(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        board_ids: &[BoardId],
    ) -> Result<()> {
        Self::injected(&self.fail_writes, "write")?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner
            .add_update_category_boards(user_id, category_id, board_ids)
            .await
    }

    async fn reorder_category_boards(
        &self,
        category_id: &CategoryId,
        new_order: &[BoardId],
    ) -> Result<Vec<BoardId>> {
        Self::injected(&self.fail_writes, "write")?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner
            .reorder_category_boards(category_id, new_order)
            .await
    }
}

#[async_trait]
impl CategoryCreator for FaultyStorage {
    async fn create_category(&self, category: Category) -> Result<Category> {
        Self::injected(&self.fail_create, "create")?;
        self.created.fetch_add(1, Ordering::SeqCst);
        self.inner.create_category(category).await
    }
}

#[async_trait]
impl BoardLister for FaultyStorage {
    async fn get_boards_for_user_and_team(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        include_archived: bool,
    ) -> Result<Vec<Board>> {
        Self::injected(&self.fail_listing, "listing")?;
        // widen the window between listing and assignment for race tests
        tokio::task::yield_now().await;
        self.inner
            .get_boards_for_user_and_team(user_id, team_id, include_archived)
            .await
    }
}
