use crate::{
    domain::{Board, BoardId, Category, CategoryBoards, CategoryId, TeamId, UserId},
    error::Result,
    storage::{
        state::{BoardRegistry, CategoryState},
        BoardLister, CategoryBoardStore, CategoryCreator,
    },
};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-process storage backend. State lives for the lifetime of the value.
#[derive(Default)]
pub struct MemoryStorage {
    categories: RwLock<CategoryState>,
    boards: RwLock<BoardRegistry>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a board and the users who can see it
    pub async fn add_board(&self, board: Board, members: impl IntoIterator<Item = UserId>) {
        self.boards.write().await.upsert(board, members);
    }
}

#[async_trait]
impl CategoryBoardStore for MemoryStorage {
    async fn get_user_category_boards(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
    ) -> Result<Vec<CategoryBoards>> {
        Ok(self
            .categories
            .read()
            .await
            .user_category_boards(user_id, team_id))
    }

    async fn add_update_category_board(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        board_id: &BoardId,
    ) -> Result<()> {
        self.categories
            .write()
            .await
            .assign(user_id, category_id, std::slice::from_ref(board_id))
    }

    async fn add_update_category_boards(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        board_ids: &[BoardId],
    ) -> Result<()> {
        self.categories
            .write()
            .await
            .assign(user_id, category_id, board_ids)
    }

    async fn reorder_category_boards(
        &self,
        category_id: &CategoryId,
        new_order: &[BoardId],
    ) -> Result<Vec<BoardId>> {
        self.categories.write().await.reorder(category_id, new_order)
    }
}

#[async_trait]
impl CategoryCreator for MemoryStorage {
    async fn create_category(&self, category: Category) -> Result<Category> {
        self.categories.write().await.create_category(category)
    }
}

#[async_trait]
impl BoardLister for MemoryStorage {
    async fn get_boards_for_user_and_team(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        include_archived: bool,
    ) -> Result<Vec<Board>> {
        Ok(self
            .boards
            .read()
            .await
            .visible_to(user_id, team_id, include_archived))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_move_between_categories() {
        let storage = MemoryStorage::new();
        let user = UserId::new("u1");
        let team = TeamId::new("t1");

        let a = storage
            .create_category(Category::new("A", user.clone(), team.clone()))
            .await
            .unwrap();
        let b = storage
            .create_category(Category::new("B", user.clone(), team.clone()))
            .await
            .unwrap();

        let board = BoardId::new("b1");
        storage
            .add_update_category_board(&user, &a.id, &board)
            .await
            .unwrap();
        storage
            .add_update_category_board(&user, &b.id, &board)
            .await
            .unwrap();

        let view = storage.get_user_category_boards(&user, &team).await.unwrap();
        assert!(view[0].board_ids.is_empty());
        assert_eq!(view[1].board_ids, vec![board]);
    }

    #[tokio::test]
    async fn test_lists_only_visible_boards() {
        let storage = MemoryStorage::new();
        let user = UserId::new("u1");
        storage
            .add_board(Board::new("b1", "t1", "Mine"), vec![user.clone()])
            .await;
        storage
            .add_board(Board::new("b2", "t1", "Theirs"), vec![UserId::new("u2")])
            .await;

        let boards = storage
            .get_boards_for_user_and_team(&user, &TeamId::new("t1"), false)
            .await
            .unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].title, "Mine");
    }

    #[tokio::test]
    async fn test_unknown_user_gets_empty_view() {
        let storage = MemoryStorage::new();
        let view = storage
            .get_user_category_boards(&UserId::new("nobody"), &TeamId::new("t1"))
            .await
            .unwrap();
        assert!(view.is_empty());
    }
}
