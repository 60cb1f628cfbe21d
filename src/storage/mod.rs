use crate::{
    domain::{Board, BoardId, Category, CategoryBoards, CategoryId, TeamId, UserId},
    error::Result,
};
use async_trait::async_trait;

#[cfg(feature = "file-storage")]
pub mod file_storage;
pub mod memory_storage;
pub(crate) mod state;

/// Persistence of per-user category/board assignments and their order
#[async_trait]
pub trait CategoryBoardStore: Send + Sync {
    /// Loads every category the user owns in the team, each with its ordered boards
    async fn get_user_category_boards(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
    ) -> Result<Vec<CategoryBoards>>;

    /// Assigns a board to a category, superseding any previous assignment
    /// of that board for the same user and team. The board goes last.
    async fn add_update_category_board(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        board_id: &BoardId,
    ) -> Result<()>;

    /// Assigns several boards to one category as a single unit, in the given order
    async fn add_update_category_boards(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        board_ids: &[BoardId],
    ) -> Result<()>;

    /// Replaces the board order of a category and returns the applied order
    async fn reorder_category_boards(
        &self,
        category_id: &CategoryId,
        new_order: &[BoardId],
    ) -> Result<Vec<BoardId>>;
}

/// Creation of categories, used for the default bucket
#[async_trait]
pub trait CategoryCreator: Send + Sync {
    async fn create_category(&self, category: Category) -> Result<Category>;
}

/// Source of the boards a user can see in a team
#[async_trait]
pub trait BoardLister: Send + Sync {
    async fn get_boards_for_user_and_team(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        include_archived: bool,
    ) -> Result<Vec<Board>>;
}
