//! Write hooks keeping derived data in step with the rows it summarizes.

use std::collections::BTreeMap;

use super::BookStats;
use crate::catalog::EntityKind;
use crate::constraint::UniqueKey;
use crate::error::Result;
use crate::model::{Friendship, Id, Row, RowKey, UserBookListing};
use crate::storage::{State, Transaction};

/// Fill in the fields a row does not own before it is staged.
pub(crate) fn derive_fields(tx: &mut Transaction<'_>, row: &mut Row) {
    if let Row::UserBookListing(listing) = row {
        listing.reviewed = tx
            .unique_owner(&UniqueKey::review(listing.user_id, listing.book_id))
            .is_some();
    }
}

fn update_stats(tx: &mut Transaction<'_>, book_id: Id, f: impl FnOnce(&mut BookStats)) {
    // Stats rows only exist for books that exist.
    if let Some(mut stats) = tx.stats(book_id) {
        f(&mut stats);
        tx.put_stats(book_id, Some(stats));
    }
}

fn refresh_reviewed(tx: &mut Transaction<'_>, user_id: Id, book_id: Id) -> Result<()> {
    let key = RowKey::Pair(user_id, book_id);
    let Some(Row::UserBookListing(listing)) = tx.get(EntityKind::UserBookListing, key) else {
        return Ok(());
    };
    let reviewed = tx
        .unique_owner(&UniqueKey::review(user_id, book_id))
        .is_some();
    if listing.reviewed == reviewed {
        return Ok(());
    }
    let updated = UserBookListing {
        reviewed,
        ..listing.clone()
    };
    tx.write(Some(listing.into()), Some(updated.into()))
}

/// Run the hooks for one staged write.
pub(crate) fn after_write(
    tx: &mut Transaction<'_>,
    before: Option<&Row>,
    after: Option<&Row>,
) -> Result<()> {
    match (before, after) {
        (None, Some(Row::Book(book))) => tx.put_stats(book.id, Some(BookStats::new(book.id))),
        (Some(Row::Book(book)), None) => tx.put_stats(book.id, None),
        _ => {}
    }

    let old_listing = match before {
        Some(Row::UserBookListing(l)) => Some(l),
        _ => None,
    };
    let new_listing = match after {
        Some(Row::UserBookListing(l)) => Some(l),
        _ => None,
    };
    if old_listing.is_some() || new_listing.is_some() {
        let unchanged = matches!((old_listing, new_listing), (Some(a), Some(b))
            if a.book_id == b.book_id && a.reading_status == b.reading_status && a.liked == b.liked);
        if !unchanged {
            if let Some(old) = old_listing {
                update_stats(tx, old.book_id, |s| s.apply_listing(old, false));
            }
            if let Some(new) = new_listing {
                update_stats(tx, new.book_id, |s| s.apply_listing(new, true));
            }
        }
    }

    let old_review = match before {
        Some(Row::Review(r)) => Some(r),
        _ => None,
    };
    let new_review = match after {
        Some(Row::Review(r)) => Some(r),
        _ => None,
    };
    if old_review.is_some() || new_review.is_some() {
        let unchanged = matches!((old_review, new_review), (Some(a), Some(b))
            if a.book_id == b.book_id && a.stars == b.stars);
        if !unchanged {
            if let Some(old) = old_review {
                update_stats(tx, old.book_id, |s| s.apply_review(old, false));
            }
            if let Some(new) = new_review {
                update_stats(tx, new.book_id, |s| s.apply_review(new, true));
            }
        }

        let mut pairs = Vec::with_capacity(2);
        for review in old_review.into_iter().chain(new_review) {
            if let Some(user_id) = review.user_id {
                if !pairs.contains(&(user_id, review.book_id)) {
                    pairs.push((user_id, review.book_id));
                }
            }
        }
        for (user_id, book_id) in pairs {
            refresh_reviewed(tx, user_id, book_id)?;
        }
    }

    if let Some(Row::FriendRequest(request)) = after {
        // Moving the endpoints of a confirmed request confirms the new pair.
        let was_confirmed = matches!(
            before,
            Some(Row::FriendRequest(b))
                if b.is_confirmed() && b.from_id == request.from_id && b.to_id == request.to_id
        );
        if request.is_confirmed() && !was_confirmed {
            let friendship = Friendship::between(request.from_id, request.to_id);
            let key = RowKey::Pair(friendship.user_a, friendship.user_b);
            if tx.get(EntityKind::Friendship, key).is_none() {
                tx.write(None, Some(friendship.into()))?;
            }
        }
    }

    if let (Some(Row::Friendship(friendship)), None) = (before, after) {
        for (from_id, to_id) in friendship.directions() {
            let Some(RowKey::Id(id)) = tx.unique_owner(&UniqueKey::friend_request(from_id, to_id))
            else {
                continue;
            };
            if let Some(request) = tx.get(EntityKind::FriendRequest, RowKey::Id(id)) {
                if matches!(&request, Row::FriendRequest(r) if r.is_confirmed()) {
                    tx.write(Some(request), None)?;
                }
            }
        }
    }

    Ok(())
}

/// Recompute every statistics row from the committed rows.
pub(crate) fn rebuild(state: &State) -> BTreeMap<Id, BookStats> {
    let mut stats: BTreeMap<Id, BookStats> = state
        .rows(EntityKind::Book)
        .filter_map(|row| row.key().id())
        .map(|id| (id, BookStats::new(id)))
        .collect();

    for row in state.rows(EntityKind::UserBookListing) {
        if let Row::UserBookListing(listing) = row {
            if let Some(s) = stats.get_mut(&listing.book_id) {
                s.apply_listing(listing, true);
            }
        }
    }
    for row in state.rows(EntityKind::Review) {
        if let Row::Review(review) = row {
            if let Some(s) = stats.get_mut(&review.book_id) {
                s.apply_review(review, true);
            }
        }
    }
    stats
}

/// Describe every place where derived data disagrees with the rows.
pub(crate) fn verify(state: &State) -> Vec<String> {
    let mut problems = Vec::new();

    let expected = rebuild(state);
    let actual: BTreeMap<Id, BookStats> = state.all_stats().map(|s| (s.book_id, *s)).collect();
    for (book_id, want) in &expected {
        match actual.get(book_id) {
            Some(have) if have == want => {}
            Some(have) => problems.push(format!(
                "book {book_id}: stats {have:?} differ from recomputed {want:?}"
            )),
            None => problems.push(format!("book {book_id}: statistics row missing")),
        }
    }
    for book_id in actual.keys().filter(|id| !expected.contains_key(id)) {
        problems.push(format!("statistics row for missing book {book_id}"));
    }

    if &state.derive_unique() != state.unique_index() {
        problems.push("unique index differs from the rows".to_string());
    }

    for row in state.rows(EntityKind::UserBookListing) {
        if let Row::UserBookListing(l) = row {
            let reviewed = state
                .unique_owner(&UniqueKey::review(l.user_id, l.book_id))
                .is_some();
            if l.reviewed != reviewed {
                problems.push(format!(
                    "listing ({}, {}): reviewed is {} but a review {}",
                    l.user_id,
                    l.book_id,
                    l.reviewed,
                    if reviewed { "exists" } else { "does not exist" }
                ));
            }
        }
    }

    for row in state.rows(EntityKind::FriendRequest) {
        if let Row::FriendRequest(r) = row {
            let friendship = Friendship::between(r.from_id, r.to_id);
            let key = RowKey::Pair(friendship.user_a, friendship.user_b);
            if r.is_confirmed() && state.row(EntityKind::Friendship, key).is_none() {
                problems.push(format!(
                    "confirmed request #{} has no friendship {key}",
                    r.id
                ));
            }
        }
    }

    problems
}
