//! In-memory model shared by the reference backends.

use crate::{
    domain::{Board, BoardId, Category, CategoryBoards, CategoryId, TeamId, UserId},
    error::{CategoryBoardsError, Result},
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One board's category assignment for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub board_id: BoardId,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryState {
    pub categories: Vec<Category>,
    pub memberships: Vec<Membership>,
}

impl CategoryState {
    pub fn user_category_boards(&self, user_id: &UserId, team_id: &TeamId) -> Vec<CategoryBoards> {
        let mut categories: Vec<&Category> = self
            .categories
            .iter()
            .filter(|c| c.belongs_to(user_id, team_id))
            .collect();
        categories.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        categories
            .into_iter()
            .map(|category| {
                let mut members: Vec<&Membership> = self
                    .memberships
                    .iter()
                    .filter(|m| &m.user_id == user_id && m.category_id == category.id)
                    .collect();
                members.sort_by_key(|m| m.sort_order);

                CategoryBoards::with_boards(
                    category.clone(),
                    members.into_iter().map(|m| m.board_id.clone()).collect(),
                )
            })
            .collect()
    }

    /// Stores a new category, placing it after the owner's existing ones
    pub fn create_category(&mut self, mut category: Category) -> Result<Category> {
        if self.categories.iter().any(|c| c.id == category.id) {
            return Err(CategoryBoardsError::StorageError(format!(
                "category {} already exists",
                category.id
            )));
        }

        category.sort_order = self
            .categories
            .iter()
            .filter(|c| c.belongs_to(&category.user_id, &category.team_id))
            .map(|c| c.sort_order + 1)
            .max()
            .unwrap_or(0);

        self.categories.push(category.clone());
        Ok(category)
    }

    fn owned_category(&self, user_id: &UserId, category_id: &CategoryId) -> Result<&Category> {
        self.categories
            .iter()
            .find(|c| &c.id == category_id && &c.user_id == user_id)
            .ok_or_else(|| {
                CategoryBoardsError::StorageError(format!(
                    "category {} not found for user {}",
                    category_id, user_id
                ))
            })
    }

    /// Moves boards into a category. Any previous assignment of the same board
    /// for the same user and team is dropped first, so a board never ends up
    /// in two categories.
    pub fn assign(
        &mut self,
        user_id: &UserId,
        category_id: &CategoryId,
        board_ids: &[BoardId],
    ) -> Result<()> {
        let team_id = self.owned_category(user_id, category_id)?.team_id.clone();

        let team_categories: HashSet<CategoryId> = self
            .categories
            .iter()
            .filter(|c| c.belongs_to(user_id, &team_id))
            .map(|c| c.id.clone())
            .collect();
        let moving: HashSet<&BoardId> = board_ids.iter().collect();

        self.memberships.retain(|m| {
            !(&m.user_id == user_id
                && team_categories.contains(&m.category_id)
                && moving.contains(&m.board_id))
        });

        let mut next = self
            .memberships
            .iter()
            .filter(|m| &m.user_id == user_id && &m.category_id == category_id)
            .map(|m| m.sort_order + 1)
            .max()
            .unwrap_or(0);

        let mut placed = HashSet::new();
        for board_id in board_ids {
            if !placed.insert(board_id) {
                continue;
            }
            self.memberships.push(Membership {
                user_id: user_id.clone(),
                category_id: category_id.clone(),
                board_id: board_id.clone(),
                sort_order: next,
            });
            next += 1;
        }

        Ok(())
    }

    /// Rewrites the sort order of a category's boards. All boards in
    /// `new_order` must already be members; nothing changes otherwise.
    pub fn reorder(&mut self, category_id: &CategoryId, new_order: &[BoardId]) -> Result<Vec<BoardId>> {
        if !self.categories.iter().any(|c| &c.id == category_id) {
            return Err(CategoryBoardsError::StorageError(format!(
                "category {} not found",
                category_id
            )));
        }

        let positions: HashMap<&BoardId, i64> = new_order
            .iter()
            .enumerate()
            .map(|(i, id)| (id, i as i64))
            .collect();

        let members: HashSet<&BoardId> = self
            .memberships
            .iter()
            .filter(|m| &m.category_id == category_id)
            .map(|m| &m.board_id)
            .collect();
        if let Some(missing) = new_order.iter().find(|id| !members.contains(id)) {
            return Err(CategoryBoardsError::StorageError(format!(
                "board {} is not in category {}",
                missing, category_id
            )));
        }

        for membership in self
            .memberships
            .iter_mut()
            .filter(|m| &m.category_id == category_id)
        {
            if let Some(position) = positions.get(&membership.board_id) {
                membership.sort_order = *position;
            }
        }

        Ok(new_order.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardEntry {
    pub board: Board,
    pub members: Vec<UserId>,
}

/// Boards and who can see them, in creation order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardRegistry {
    pub boards: Vec<BoardEntry>,
}

impl BoardRegistry {
    /// Inserts or replaces a board, merging its member list
    pub fn upsert(&mut self, board: Board, members: impl IntoIterator<Item = UserId>) {
        match self.boards.iter_mut().find(|e| e.board.id == board.id) {
            Some(entry) => {
                entry.board = board;
                for member in members {
                    if !entry.members.contains(&member) {
                        entry.members.push(member);
                    }
                }
            }
            None => {
                let mut unique: Vec<UserId> = Vec::new();
                for member in members {
                    if !unique.contains(&member) {
                        unique.push(member);
                    }
                }
                self.boards.push(BoardEntry {
                    board,
                    members: unique,
                });
            }
        }
    }

    pub fn visible_to(&self, user_id: &UserId, team_id: &TeamId, include_archived: bool) -> Vec<Board> {
        self.boards
            .iter()
            .filter(|e| &e.board.team_id == team_id && e.members.contains(user_id))
            .filter(|e| e.board.is_listed(include_archived))
            .map(|e| e.board.clone())
            .collect()
    }
}
