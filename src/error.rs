use thiserror::Error;

pub type Result<T> = std::result::Result<T, CategoryBoardsError>;

#[derive(Debug, Error)]
pub enum CategoryBoardsError {
    #[error("Category not found: {category_id} (user: {user_id}, team: {team_id})")]
    CategoryNotFound {
        user_id: String,
        team_id: String,
        category_id: String,
    },

    #[error(
        "Cannot update category boards order, new order has {new_len} boards but category has {existing_len} \
         (user: {user_id}, team: {team_id}, category: {category_id})"
    )]
    LengthMismatch {
        new_len: usize,
        existing_len: usize,
        user_id: String,
        team_id: String,
        category_id: String,
    },

    #[error("Board {board_id} not found in category {category_id} (user: {user_id}, team: {team_id})")]
    BoardNotInCategory {
        board_id: String,
        category_id: String,
        user_id: String,
        team_id: String,
    },

    #[error("Board {board_id} appears more than once in new order for category {category_id}")]
    DuplicateBoardInOrder {
        board_id: String,
        category_id: String,
    },

    #[error("Store error during {operation} ({context}): {source}")]
    Store {
        operation: &'static str,
        context: String,
        #[source]
        source: Box<CategoryBoardsError>,
    },

    #[error("Default category creation failed (user: {user_id}, team: {team_id}): {source}")]
    DefaultCategoryCreation {
        user_id: String,
        team_id: String,
        #[source]
        source: Box<CategoryBoardsError>,
    },

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Change queue is full")]
    QueueFull,

    #[error("Change queue is closed")]
    QueueClosed,

    #[error("Invalid identifier: {0:?}")]
    InvalidId(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CategoryBoardsError {
    /// Wraps a backend error with the store operation and identifiers it failed on
    pub fn store(operation: &'static str, context: impl Into<String>, source: Self) -> Self {
        Self::Store {
            operation,
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// True for errors caused by a stale or malformed client view.
    /// These are never retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::CategoryNotFound { .. }
                | Self::LengthMismatch { .. }
                | Self::BoardNotInCategory { .. }
                | Self::DuplicateBoardInOrder { .. }
        )
    }
}
