//! # Category Boards
//!
//! Per-user grouping and ordering of boards into categories within a team.
//!
//! The [`CategoryBoardsEngine`] keeps every board a user can see in exactly
//! one of that user's categories, creating a system default category on
//! demand, and propagates each committed change to the user's other sessions
//! in commit order. Persistence and broadcast transport are supplied through
//! the [`storage`] and [`notify`] traits.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod notify;
pub mod storage;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{EngineConfig, DEFAULT_CATEGORY_NAME};
pub use domain::{
    Board, BoardId, Category, CategoryBoardEvent, CategoryBoardEventKind, CategoryBoards,
    CategoryId, CategoryType, TeamId, UserId,
};
pub use engine::CategoryBoardsEngine;
pub use error::{CategoryBoardsError, Result};
pub use notify::{ChangeQueue, Notifier, TracingNotifier};
#[cfg(feature = "file-storage")]
pub use storage::file_storage::FileStorage;
pub use storage::{
    memory_storage::MemoryStorage, BoardLister, CategoryBoardStore, CategoryCreator,
};
