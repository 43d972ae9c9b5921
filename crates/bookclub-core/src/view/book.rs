//! Book ranking and statistics views.

use serde::Serialize;

use super::ViewFilter;
use crate::aggregate::BookStats;
use crate::catalog::EntityKind;
use crate::model::{Book, Id, Row, RowKey};
use crate::storage::State;

/// A book ranked by reading activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookActivity {
    pub book_id: Id,
    pub handle: String,
    pub full_name: String,
    pub pending: u64,
    pub reading: u64,
    pub completed: u64,
    pub activity: u64,
}

/// A book ranked by average stars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRating {
    pub book_id: Id,
    pub handle: String,
    pub full_name: String,
    pub rating: f64,
    pub reviews: u64,
}

/// The statistics row of a book with its rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookStatistics {
    #[serde(flatten)]
    pub stats: BookStats,
    pub rating: Option<f64>,
}

/// Statistics rows whose book passes the filter, in book id order.
fn visible<'a>(state: &'a State, filter: &'a ViewFilter) -> impl Iterator<Item = (&'a Book, &'a BookStats)> + 'a {
    state.all_stats().filter_map(move |stats| {
        let book = match state.row(EntityKind::Book, RowKey::Id(stats.book_id)) {
            Some(Row::Book(book)) => book,
            _ => return None,
        };
        if book.deleted && !filter.include_deleted {
            return None;
        }
        if filter.book_id.is_some_and(|id| id != book.id) {
            return None;
        }
        if let Some(club_id) = filter.club_id {
            state.row(EntityKind::ClubBookLink, RowKey::Pair(club_id, book.id))?;
        }
        Some((book, stats))
    })
}

pub(super) fn top_activity(state: &State, filter: &ViewFilter) -> Vec<BookActivity> {
    let mut rows: Vec<BookActivity> = visible(state, filter)
        .map(|(book, stats)| BookActivity {
            book_id: book.id,
            handle: book.handle.clone(),
            full_name: book.full_name.clone(),
            pending: stats.pending,
            reading: stats.reading,
            completed: stats.completed,
            activity: stats.activity(),
        })
        .collect();
    rows.sort_by(|a, b| b.activity.cmp(&a.activity).then(a.book_id.cmp(&b.book_id)));
    rows
}

pub(super) fn top_rated(state: &State, filter: &ViewFilter) -> Vec<BookRating> {
    let mut ranked: Vec<(u64, BookRating)> = visible(state, filter)
        .filter_map(|(book, stats)| {
            let hundredths = stats.rating_hundredths()?;
            Some((
                hundredths,
                BookRating {
                    book_id: book.id,
                    handle: book.handle.clone(),
                    full_name: book.full_name.clone(),
                    rating: hundredths as f64 / 100.0,
                    reviews: stats.reviews,
                },
            ))
        })
        .collect();
    // Sort on the integer key; float ratings are for display only.
    ranked.sort_by(|(a, ra), (b, rb)| b.cmp(a).then(ra.book_id.cmp(&rb.book_id)));
    ranked.into_iter().map(|(_, row)| row).collect()
}

pub(super) fn statistics(state: &State, filter: &ViewFilter) -> Vec<BookStatistics> {
    visible(state, filter)
        .map(|(_, stats)| BookStatistics {
            stats: *stats,
            rating: stats.rating(),
        })
        .collect()
}
