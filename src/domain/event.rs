use crate::domain::ids::{BoardId, CategoryId, TeamId, UserId};
use serde::{Deserialize, Serialize};

/// A change to a user's category view that other sessions must learn about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBoardEvent {
    pub team_id: TeamId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub kind: CategoryBoardEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CategoryBoardEventKind {
    /// A board was (re)assigned to a category
    #[serde(rename_all = "camelCase")]
    BoardCategoryChange {
        board_id: BoardId,
        category_id: CategoryId,
    },
    /// The board order inside a category was replaced
    #[serde(rename_all = "camelCase")]
    CategoryBoardsReorder {
        category_id: CategoryId,
        board_ids: Vec<BoardId>,
    },
}

impl CategoryBoardEvent {
    pub fn board_change(
        team_id: TeamId,
        user_id: UserId,
        board_id: BoardId,
        category_id: CategoryId,
    ) -> Self {
        Self {
            team_id,
            user_id,
            kind: CategoryBoardEventKind::BoardCategoryChange {
                board_id,
                category_id,
            },
        }
    }

    pub fn reorder(
        team_id: TeamId,
        user_id: UserId,
        category_id: CategoryId,
        board_ids: Vec<BoardId>,
    ) -> Self {
        Self {
            team_id,
            user_id,
            kind: CategoryBoardEventKind::CategoryBoardsReorder {
                category_id,
                board_ids,
            },
        }
    }

    pub fn category_id(&self) -> &CategoryId {
        match &self.kind {
            CategoryBoardEventKind::BoardCategoryChange { category_id, .. }
            | CategoryBoardEventKind::CategoryBoardsReorder { category_id, .. } => category_id,
        }
    }
}
