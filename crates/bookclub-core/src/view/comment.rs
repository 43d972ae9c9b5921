//! Comment views.

use serde::Serialize;

use super::ViewFilter;
use crate::catalog::EntityKind;
use crate::constraint::UniqueKey;
use crate::model::{Id, Row, RowKey};
use crate::storage::State;

/// A comment that passed moderation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovedComment {
    pub comment_id: Id,
    pub user_id: Option<Id>,
    pub content: Option<String>,
    /// Discussion the comment is posted in, if any.
    pub discussion_id: Option<Id>,
}

pub(super) fn approved(state: &State, filter: &ViewFilter) -> Vec<ApprovedComment> {
    state
        .rows(EntityKind::Comment)
        .filter_map(|row| match row {
            Row::Comment(comment) if !comment.pending => Some(comment),
            _ => None,
        })
        .filter(|comment| filter.user_id.map_or(true, |id| comment.user_id == Some(id)))
        .map(|comment| {
            let discussion_id = match state.unique_owner(&UniqueKey::comment_discussion(comment.id)) {
                Some(RowKey::Pair(discussion_id, _)) => Some(discussion_id),
                _ => None,
            };
            ApprovedComment {
                comment_id: comment.id,
                user_id: comment.user_id,
                content: comment.content.clone(),
                discussion_id,
            }
        })
        .filter(|row| {
            filter
                .discussion_id
                .map_or(true, |id| row.discussion_id == Some(id))
        })
        .collect()
}
