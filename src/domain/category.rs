use crate::domain::ids::{BoardId, CategoryId, TeamId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt};

/// Whether a category was created by the system or by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    /// Created automatically, e.g. the default bucket
    System,
    #[default]
    Custom,
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// A user-owned grouping of boards within a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub user_id: UserId,
    pub team_id: TeamId,
    pub collapsed: bool,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Creates a new user category with a fresh ID
    pub fn new(name: impl Into<String>, user_id: UserId, team_id: TeamId) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::generate(),
            name: name.into(),
            user_id,
            team_id,
            collapsed: false,
            category_type: CategoryType::Custom,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the system bucket that holds otherwise uncategorized boards
    pub fn new_system(name: impl Into<String>, user_id: UserId, team_id: TeamId) -> Self {
        Self {
            category_type: CategoryType::System,
            ..Self::new(name, user_id, team_id)
        }
    }

    pub fn is_system(&self) -> bool {
        self.category_type == CategoryType::System
    }

    pub fn belongs_to(&self, user_id: &UserId, team_id: &TeamId) -> bool {
        &self.user_id == user_id && &self.team_id == team_id
    }
}

/// A category together with the ordered IDs of the boards it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBoards {
    #[serde(flatten)]
    pub category: Category,
    pub board_ids: Vec<BoardId>,
}

impl CategoryBoards {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            board_ids: Vec::new(),
        }
    }

    pub fn with_boards(category: Category, board_ids: Vec<BoardId>) -> Self {
        Self {
            category,
            board_ids,
        }
    }

    pub fn id(&self) -> &CategoryId {
        &self.category.id
    }

    pub fn contains(&self, board_id: &BoardId) -> bool {
        self.board_ids.contains(board_id)
    }
}

/// Finds the system default category of a view, if any
pub fn find_default(view: &[CategoryBoards]) -> Option<&CategoryBoards> {
    view.iter().find(|cb| cb.category.is_system())
}

/// Finds a category of a view by ID
pub fn find_category<'a>(
    view: &'a [CategoryBoards],
    category_id: &CategoryId,
) -> Option<&'a CategoryBoards> {
    view.iter().find(|cb| cb.id() == category_id)
}

/// Collects every board ID already placed in some category of the view
pub fn claimed_board_ids(view: &[CategoryBoards]) -> HashSet<&BoardId> {
    view.iter().flat_map(|cb| cb.board_ids.iter()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str) -> Category {
        Category::new(name, UserId::new("u1"), TeamId::new("t1"))
    }

    #[test]
    fn test_system_category_creation() {
        let cat = Category::new_system("Boards", UserId::new("u1"), TeamId::new("t1"));
        assert!(cat.is_system());
        assert!(!cat.collapsed);
        assert_eq!(cat.name, "Boards");
        assert!(cat.belongs_to(&UserId::new("u1"), &TeamId::new("t1")));
        assert!(!cat.belongs_to(&UserId::new("u2"), &TeamId::new("t1")));
    }

    #[test]
    fn test_default_lookup_ignores_custom_named_boards() {
        let custom = CategoryBoards::new(category("Boards"));
        let view = vec![custom];
        assert!(find_default(&view).is_none());

        let system = CategoryBoards::new(Category::new_system(
            "Boards",
            UserId::new("u1"),
            TeamId::new("t1"),
        ));
        let view = vec![view[0].clone(), system.clone()];
        assert_eq!(find_default(&view).map(|cb| cb.id()), Some(system.id()));
    }

    #[test]
    fn test_claimed_board_ids_spans_categories() {
        let a = CategoryBoards::with_boards(category("A"), vec![BoardId::new("b1")]);
        let b = CategoryBoards::with_boards(
            category("B"),
            vec![BoardId::new("b2"), BoardId::new("b3")],
        );
        let view = vec![a, b];

        let claimed = claimed_board_ids(&view);
        assert_eq!(claimed.len(), 3);
        assert!(claimed.contains(&BoardId::new("b3")));
        assert!(find_category(&view, view[1].id()).unwrap().contains(&BoardId::new("b2")));
    }

    #[test]
    fn test_category_boards_serialization() {
        let cb = CategoryBoards::with_boards(category("Work"), vec![BoardId::new("b1")]);
        let json = serde_json::to_value(&cb).unwrap();
        assert_eq!(json["name"], "Work");
        assert_eq!(json["type"], "custom");
        assert_eq!(json["boardIds"][0], "b1");

        let back: CategoryBoards = serde_json::from_value(json).unwrap();
        assert_eq!(back, cb);
    }
}
