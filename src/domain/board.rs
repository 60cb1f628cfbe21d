use crate::domain::ids::{BoardId, TeamId};
use serde::{Deserialize, Serialize};

/// A board as seen by the board listing collaborator.
///
/// Only the fields needed to place a board into a category are carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub team_id: TeamId,
    pub title: String,
    #[serde(default)]
    pub archived: bool,
}

impl Board {
    pub fn new(id: impl Into<BoardId>, team_id: impl Into<TeamId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            team_id: team_id.into(),
            title: title.into(),
            archived: false,
        }
    }

    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    /// Whether the board should be listed for the given archive filter
    pub fn is_listed(&self, include_archived: bool) -> bool {
        include_archived || !self.archived
    }
}
