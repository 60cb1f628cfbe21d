pub mod board;
pub mod category;
pub mod event;
pub mod ids;
pub mod order;

pub use board::Board;
pub use category::{Category, CategoryBoards, CategoryType};
pub use event::{CategoryBoardEvent, CategoryBoardEventKind};
pub use ids::{BoardId, CategoryId, TeamId, UserId};
pub use order::verify_permutation;
