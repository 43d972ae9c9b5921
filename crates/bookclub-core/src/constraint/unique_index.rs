//! Unique value index.
//!
//! Maps `constraint name + field values` to the key of the row holding them.
//! Soft-deleted rows and rows with a null constrained field hold no entries,
//! so their values are free for reuse.

use std::fmt;

use crate::catalog::{UniqueDef, UNIQUE_CONSTRAINTS};
use crate::error::{ConstraintError, Error, Result};
use crate::model::{Id, Row};
use crate::storage::Transaction;

/// One entry in the unique index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniqueKey {
    pub constraint: &'static str,
    pub values: Vec<String>,
}

impl UniqueKey {
    pub fn new<V: Into<String>>(
        constraint: &'static str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            constraint,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Index entry naming the review of `book_id` by `user_id`.
    pub fn review(user_id: Id, book_id: Id) -> Self {
        Self::new(
            "reviews_user_book_unique",
            [user_id.to_string(), book_id.to_string()],
        )
    }

    /// Index entry naming the request from `from_id` to `to_id`.
    pub fn friend_request(from_id: Id, to_id: Id) -> Self {
        Self::new(
            "friend_requests_pair_unique",
            [from_id.to_string(), to_id.to_string()],
        )
    }

    /// Index entry naming the parent link of a comment.
    pub fn comment_parent(child_id: Id) -> Self {
        Self::new("comment_comment_link_child_unique", [child_id.to_string()])
    }

    /// Index entry naming the discussion a comment belongs to.
    pub fn comment_discussion(comment_id: Id) -> Self {
        Self::new(
            "discussion_comment_link_comment_unique",
            [comment_id.to_string()],
        )
    }
}

impl fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.values.join(", "))
    }
}

fn field_value(row: &Row, field: &str) -> Option<String> {
    match (row, field) {
        (Row::User(r), "username") => Some(r.username.clone()),
        (Row::Book(r), "handle") => Some(r.handle.clone()),
        (Row::Club(r), "handle") => Some(r.handle.clone()),
        (Row::Discussion(r), "topic") => Some(r.topic.clone()),
        _ => row.reference(field).map(|id| id.to_string()),
    }
}

fn entries(row: &Row) -> Vec<(&'static UniqueDef, UniqueKey)> {
    if row.is_deleted() {
        return Vec::new();
    }
    let kind = row.kind();
    UNIQUE_CONSTRAINTS
        .iter()
        .filter(|def| def.entity == kind)
        .filter_map(|def| {
            let values: Option<Vec<String>> =
                def.fields.iter().map(|f| field_value(row, f)).collect();
            values.map(|values| {
                (
                    def,
                    UniqueKey {
                        constraint: def.name,
                        values,
                    },
                )
            })
        })
        .collect()
}

/// Index entries a row holds while it is live.
pub fn unique_entries(row: &Row) -> Vec<UniqueKey> {
    entries(row).into_iter().map(|(_, key)| key).collect()
}

/// Drop the entries held by `row`.
pub(crate) fn release(tx: &mut Transaction<'_>, row: &Row) {
    let owner = row.key();
    for key in unique_entries(row) {
        if tx.unique_owner(&key) == Some(owner) {
            tx.set_unique(key, None);
        }
    }
}

/// Take the entries `row` needs, failing if another row holds one.
pub(crate) fn claim(tx: &mut Transaction<'_>, row: &Row) -> Result<()> {
    let owner = row.key();
    for (def, key) in entries(row) {
        match tx.unique_owner(&key) {
            Some(existing) if existing != owner => {
                return Err(Error::ConstraintViolation(ConstraintError::UniqueViolation {
                    constraint: def.name.to_string(),
                    entity: def.entity,
                    value: key.to_string(),
                }));
            }
            _ => tx.set_unique(key, Some(owner)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Link, Review, User};

    #[test]
    fn test_entries_per_kind() {
        let user: Row = User::new("ann").into();
        assert_eq!(
            unique_entries(&user),
            vec![UniqueKey::new("users_username_unique", ["ann"])]
        );

        let review: Row = Review::new(Some(3), 9, 5, "ok").into();
        assert_eq!(unique_entries(&review), vec![UniqueKey::review(3, 9)]);

        let link: Row = Link::comment_reply(1, 2).into();
        assert_eq!(unique_entries(&link), vec![UniqueKey::comment_parent(2)]);
    }

    #[test]
    fn test_null_and_deleted_not_indexed() {
        let anonymous: Row = Review::new(None, 9, 5, "ok").into();
        assert!(unique_entries(&anonymous).is_empty());

        let mut user: Row = User::new("ann").into();
        user.set_deleted(true);
        assert!(unique_entries(&user).is_empty());
    }

    #[test]
    fn test_display_joins_values() {
        assert_eq!(UniqueKey::review(1, 2).to_string(), "1, 2");
    }
}
