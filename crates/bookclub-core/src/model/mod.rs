//! Typed records stored in the entity tables.
//!
//! [`Row`] is the type-erased form the store moves around; each variant wraps
//! one typed record. [`Entity`] maps a record type to its [`EntityKind`] at
//! compile time so callers can read rows back as concrete types.

mod entity;
mod fields;
mod link;
mod listing;
mod social;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::EntityKind;

pub use entity::{Book, Club, Comment, Discussion, Review, User, MAX_STARS};
pub use fields::Fields;
pub use link::Link;
pub use listing::{Opinion, ReadingStatus, UserBookListing};
pub use social::{FriendRequest, FriendRequestStatus, Friendship};

/// Opaque 64-bit row handle.
pub type Id = u64;

/// Primary key of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowKey {
    /// Single assigned id.
    Id(Id),
    /// Composite key of two ids (listings, friendships, link tables).
    Pair(Id, Id),
}

impl RowKey {
    /// The id, when this is a single-id key.
    pub fn id(self) -> Option<Id> {
        match self {
            RowKey::Id(id) => Some(id),
            RowKey::Pair(..) => None,
        }
    }
}

impl From<Id> for RowKey {
    fn from(id: Id) -> Self {
        RowKey::Id(id)
    }
}

impl From<(Id, Id)> for RowKey {
    fn from((a, b): (Id, Id)) -> Self {
        RowKey::Pair(a, b)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Id(id) => write!(f, "#{id}"),
            RowKey::Pair(a, b) => write!(f, "({a}, {b})"),
        }
    }
}

/// A row of any entity table.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    User(User),
    Book(Book),
    Club(Club),
    Discussion(Discussion),
    Comment(Comment),
    Review(Review),
    UserBookListing(UserBookListing),
    FriendRequest(FriendRequest),
    Friendship(Friendship),
    Link(Link),
}

impl Row {
    /// The table this row belongs to.
    pub fn kind(&self) -> EntityKind {
        match self {
            Row::User(_) => EntityKind::User,
            Row::Book(_) => EntityKind::Book,
            Row::Club(_) => EntityKind::Club,
            Row::Discussion(_) => EntityKind::Discussion,
            Row::Comment(_) => EntityKind::Comment,
            Row::Review(_) => EntityKind::Review,
            Row::UserBookListing(_) => EntityKind::UserBookListing,
            Row::FriendRequest(_) => EntityKind::FriendRequest,
            Row::Friendship(_) => EntityKind::Friendship,
            Row::Link(link) => link.kind.entity(),
        }
    }

    /// Primary key of this row.
    pub fn key(&self) -> RowKey {
        match self {
            Row::User(r) => RowKey::Id(r.id),
            Row::Book(r) => RowKey::Id(r.id),
            Row::Club(r) => RowKey::Id(r.id),
            Row::Discussion(r) => RowKey::Id(r.id),
            Row::Comment(r) => RowKey::Id(r.id),
            Row::Review(r) => RowKey::Id(r.id),
            Row::FriendRequest(r) => RowKey::Id(r.id),
            Row::UserBookListing(r) => RowKey::Pair(r.user_id, r.book_id),
            Row::Friendship(r) => RowKey::Pair(r.user_a, r.user_b),
            Row::Link(r) => RowKey::Pair(r.left, r.right),
        }
    }

    /// Replace the id of a single-id row. Composite keys are left alone.
    pub(crate) fn assign_id(&mut self, id: Id) {
        match self {
            Row::User(r) => r.id = id,
            Row::Book(r) => r.id = id,
            Row::Club(r) => r.id = id,
            Row::Discussion(r) => r.id = id,
            Row::Comment(r) => r.id = id,
            Row::Review(r) => r.id = id,
            Row::FriendRequest(r) => r.id = id,
            Row::UserBookListing(_) | Row::Friendship(_) | Row::Link(_) => {}
        }
    }

    /// Whether the row is soft-deleted.
    pub fn is_deleted(&self) -> bool {
        match self {
            Row::User(r) => r.deleted,
            Row::Book(r) => r.deleted,
            Row::Club(r) => r.deleted,
            _ => false,
        }
    }

    /// Set the soft-delete flag. Returns false for kinds without one.
    pub(crate) fn set_deleted(&mut self, deleted: bool) -> bool {
        match self {
            Row::User(r) => r.deleted = deleted,
            Row::Book(r) => r.deleted = deleted,
            Row::Club(r) => r.deleted = deleted,
            _ => return false,
        }
        true
    }

    /// Value of a reference field, if set.
    pub fn reference(&self, field: &str) -> Option<Id> {
        match (self, field) {
            (Row::Club(r), "owner_id") => r.owner_id,
            (Row::Discussion(r), "owner_id") => r.owner_id,
            (Row::Comment(r), "user_id") => r.user_id,
            (Row::Review(r), "user_id") => r.user_id,
            (Row::Review(r), "book_id") => Some(r.book_id),
            (Row::UserBookListing(r), "user_id") => Some(r.user_id),
            (Row::UserBookListing(r), "book_id") => Some(r.book_id),
            (Row::FriendRequest(r), "from_id") => Some(r.from_id),
            (Row::FriendRequest(r), "to_id") => Some(r.to_id),
            (Row::Friendship(r), "user_a") => Some(r.user_a),
            (Row::Friendship(r), "user_b") => Some(r.user_b),
            (Row::Link(r), field) => {
                let (left, right) = r.kind.fields();
                if field == left {
                    Some(r.left)
                } else if field == right {
                    Some(r.right)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Clear a nullable reference field. Returns false if the field is not nullable.
    pub(crate) fn clear_reference(&mut self, field: &str) -> bool {
        let slot = match (self, field) {
            (Row::Club(r), "owner_id") => &mut r.owner_id,
            (Row::Discussion(r), "owner_id") => &mut r.owner_id,
            (Row::Comment(r), "user_id") => &mut r.user_id,
            (Row::Review(r), "user_id") => &mut r.user_id,
            _ => return false,
        };
        *slot = None;
        true
    }
}

/// Typed accessor for rows of one entity kind.
pub trait Entity: Sized + Into<Row> {
    /// Table holding this record type.
    const KIND: EntityKind;

    /// Unwrap a row of [`Self::KIND`].
    fn from_row(row: Row) -> Option<Self>;
}

macro_rules! impl_entity {
    ($($ty:ident => $kind:ident),* $(,)?) => {
        $(
            impl From<$ty> for Row {
                fn from(record: $ty) -> Self {
                    Row::$ty(record)
                }
            }

            impl Entity for $ty {
                const KIND: EntityKind = EntityKind::$kind;

                fn from_row(row: Row) -> Option<Self> {
                    match row {
                        Row::$ty(record) => Some(record),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_entity! {
    User => User,
    Book => Book,
    Club => Club,
    Discussion => Discussion,
    Comment => Comment,
    Review => Review,
    UserBookListing => UserBookListing,
    FriendRequest => FriendRequest,
    Friendship => Friendship,
}

impl From<Link> for Row {
    fn from(link: Link) -> Self {
        Row::Link(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LinkKind;

    #[test]
    fn test_row_keys() {
        let mut user: Row = User::new("alice").into();
        user.assign_id(7);
        assert_eq!(user.key(), RowKey::Id(7));
        assert_eq!(user.kind(), EntityKind::User);

        let listing: Row = UserBookListing::new(3, 9).into();
        assert_eq!(listing.key(), RowKey::Pair(3, 9));

        let link: Row = Link::new(LinkKind::ClubBook, 1, 2).into();
        assert_eq!(link.kind(), EntityKind::ClubBookLink);
        assert_eq!(link.key(), RowKey::Pair(1, 2));
    }

    #[test]
    fn test_references() {
        let review: Row = Review::new(Some(4), 5, 8, "Great").into();
        assert_eq!(review.reference("user_id"), Some(4));
        assert_eq!(review.reference("book_id"), Some(5));
        assert_eq!(review.reference("title"), None);

        let link: Row = Link::new(LinkKind::CommentComment, 10, 11).into();
        assert_eq!(link.reference("parent_id"), Some(10));
        assert_eq!(link.reference("child_id"), Some(11));
    }

    #[test]
    fn test_clear_reference() {
        let mut club: Row = Club::new("readers").with_owner(2).into();
        assert!(club.clear_reference("owner_id"));
        assert_eq!(club.reference("owner_id"), None);

        let mut listing: Row = UserBookListing::new(1, 2).into();
        assert!(!listing.clear_reference("user_id"));
    }

    #[test]
    fn test_entity_from_row() {
        let row: Row = Book::new("dune", "Dune").into();
        assert!(User::from_row(row.clone()).is_none());
        assert_eq!(Book::from_row(row).unwrap().handle, "dune");
    }

    #[test]
    fn test_row_key_serde() {
        assert_eq!(serde_json::to_string(&RowKey::Id(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&RowKey::Pair(1, 2)).unwrap(), "[1,2]");
        let key: RowKey = serde_json::from_str("[4,5]").unwrap();
        assert_eq!(key, RowKey::Pair(4, 5));
    }
}
