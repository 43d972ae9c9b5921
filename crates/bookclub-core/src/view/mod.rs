//! Read-only projections over committed state.
//!
//! Views are computed on demand from a consistent snapshot and can never be
//! written to.

mod book;
mod club;
mod comment;

use serde::{Deserialize, Serialize};

use crate::catalog::ViewKind;
use crate::model::Id;
use crate::storage::State;

pub use book::{BookActivity, BookRating, BookStatistics};
pub use club::{ClubMember, ClubPopularity};
pub use comment::ApprovedComment;

/// Optional narrowing of a view. Each view applies the fields that make
/// sense for it and ignores the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewFilter {
    pub club_id: Option<Id>,
    pub discussion_id: Option<Id>,
    pub user_id: Option<Id>,
    pub book_id: Option<Id>,
    /// Include soft-deleted rows.
    pub include_deleted: bool,
}

impl ViewFilter {
    pub fn club(club_id: Id) -> Self {
        Self {
            club_id: Some(club_id),
            ..Default::default()
        }
    }

    pub fn book(book_id: Id) -> Self {
        Self {
            book_id: Some(book_id),
            ..Default::default()
        }
    }

    pub fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }
}

/// One row of any view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ViewRow {
    ClubPopularity(ClubPopularity),
    ClubMember(ClubMember),
    ApprovedComment(ApprovedComment),
    BookActivity(BookActivity),
    BookRating(BookRating),
    BookStatistics(BookStatistics),
}

fn limited<T>(rows: Vec<T>, limit: Option<usize>) -> Vec<T> {
    match limit {
        Some(n) => rows.into_iter().take(n).collect(),
        None => rows,
    }
}

/// Compute a view.
pub fn project(state: &State, view: ViewKind, filter: &ViewFilter, limit: Option<usize>) -> Vec<ViewRow> {
    match view {
        ViewKind::ClubPopularity => limited(club::popularity(state, filter), limit)
            .into_iter()
            .map(ViewRow::ClubPopularity)
            .collect(),
        ViewKind::ClubMembers => limited(club::members(state, filter), limit)
            .into_iter()
            .map(ViewRow::ClubMember)
            .collect(),
        ViewKind::ApprovedComments => limited(comment::approved(state, filter), limit)
            .into_iter()
            .map(ViewRow::ApprovedComment)
            .collect(),
        ViewKind::TopActivityBooks => limited(book::top_activity(state, filter), limit)
            .into_iter()
            .map(ViewRow::BookActivity)
            .collect(),
        ViewKind::TopRatedBooks => limited(book::top_rated(state, filter), limit)
            .into_iter()
            .map(ViewRow::BookRating)
            .collect(),
        ViewKind::BookStatistics => limited(book::statistics(state, filter), limit)
            .into_iter()
            .map(ViewRow::BookStatistics)
            .collect(),
    }
}
