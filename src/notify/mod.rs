use crate::{
    domain::{BoardId, CategoryBoardEvent, CategoryBoardEventKind, CategoryId, TeamId, UserId},
    error::Result,
};
use async_trait::async_trait;
use tracing::info;

pub mod queue;

pub use queue::ChangeQueue;

/// Broadcasts category changes to the user's other sessions.
///
/// Delivery is best effort. Errors are retried by the [`ChangeQueue`] and
/// never reach the caller that made the change.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announces that a board now belongs to the given category
    async fn broadcast_category_board_change(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
        board_id: &BoardId,
        category_id: &CategoryId,
    ) -> Result<()>;

    /// Announces the new board order of a category
    async fn broadcast_category_boards_reorder(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
        category_id: &CategoryId,
        board_ids: &[BoardId],
    ) -> Result<()>;
}

/// Routes an event to the matching notifier call
pub async fn deliver(notifier: &dyn Notifier, event: &CategoryBoardEvent) -> Result<()> {
    match &event.kind {
        CategoryBoardEventKind::BoardCategoryChange {
            board_id,
            category_id,
        } => {
            notifier
                .broadcast_category_board_change(
                    &event.team_id,
                    &event.user_id,
                    board_id,
                    category_id,
                )
                .await
        }
        CategoryBoardEventKind::CategoryBoardsReorder {
            category_id,
            board_ids,
        } => {
            notifier
                .broadcast_category_boards_reorder(
                    &event.team_id,
                    &event.user_id,
                    category_id,
                    board_ids,
                )
                .await
        }
    }
}

/// Notifier that only logs, for deployments without a real-time transport
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn broadcast_category_board_change(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
        board_id: &BoardId,
        category_id: &CategoryId,
    ) -> Result<()> {
        info!(%team_id, %user_id, %board_id, %category_id, "category board change");
        Ok(())
    }

    async fn broadcast_category_boards_reorder(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
        category_id: &CategoryId,
        board_ids: &[BoardId],
    ) -> Result<()> {
        info!(
            %team_id,
            %user_id,
            %category_id,
            boards = board_ids.len(),
            "category boards reorder"
        );
        Ok(())
    }
}
