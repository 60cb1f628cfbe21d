use crate::{
    domain::{
        category::CategoryBoards,
        ids::{BoardId, TeamId, UserId},
    },
    error::{CategoryBoardsError, Result},
};
use std::collections::HashSet;

/// Checks that `new_order` is exactly a permutation of the boards in `existing`.
///
/// Checks run in order: length, membership, duplicates. The first failure is
/// returned, carrying enough identifiers to reconstruct it without logs.
pub fn verify_permutation(
    existing: &CategoryBoards,
    user_id: &UserId,
    team_id: &TeamId,
    new_order: &[BoardId],
) -> Result<()> {
    let category_id = existing.id();

    if existing.board_ids.len() != new_order.len() {
        return Err(CategoryBoardsError::LengthMismatch {
            new_len: new_order.len(),
            existing_len: existing.board_ids.len(),
            user_id: user_id.to_string(),
            team_id: team_id.to_string(),
            category_id: category_id.to_string(),
        });
    }

    let members: HashSet<&BoardId> = existing.board_ids.iter().collect();
    if let Some(stray) = new_order.iter().find(|id| !members.contains(id)) {
        return Err(CategoryBoardsError::BoardNotInCategory {
            board_id: stray.to_string(),
            category_id: category_id.to_string(),
            user_id: user_id.to_string(),
            team_id: team_id.to_string(),
        });
    }

    // equal length plus containment still admits [b1, b1] for {b1, b2}
    let mut seen = HashSet::with_capacity(new_order.len());
    for board_id in new_order {
        if !seen.insert(board_id) {
            return Err(CategoryBoardsError::DuplicateBoardInOrder {
                board_id: board_id.to_string(),
                category_id: category_id.to_string(),
            });
        }
    }

    Ok(())
}
