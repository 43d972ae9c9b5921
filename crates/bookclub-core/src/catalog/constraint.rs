//! Unique constraint definitions.

use super::kind::EntityKind;

/// A uniqueness constraint over one or more fields of an entity.
///
/// Soft-deleted rows and rows with a null constrained field are not indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueDef {
    /// Constraint name.
    pub name: &'static str,
    /// Entity this constraint applies to.
    pub entity: EntityKind,
    /// Fields that must be unique together.
    pub fields: &'static [&'static str],
}

impl UniqueDef {
    const fn new(
        name: &'static str,
        entity: EntityKind,
        fields: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            entity,
            fields,
        }
    }
}

/// Unique constraints beyond the primary keys.
pub const UNIQUE_CONSTRAINTS: &[UniqueDef] = &[
    UniqueDef::new("users_username_unique", EntityKind::User, &["username"]),
    UniqueDef::new("books_handle_unique", EntityKind::Book, &["handle"]),
    UniqueDef::new("clubs_handle_unique", EntityKind::Club, &["handle"]),
    UniqueDef::new("discussions_topic_unique", EntityKind::Discussion, &["topic"]),
    UniqueDef::new(
        "reviews_user_book_unique",
        EntityKind::Review,
        &["user_id", "book_id"],
    ),
    UniqueDef::new(
        "friend_requests_pair_unique",
        EntityKind::FriendRequest,
        &["from_id", "to_id"],
    ),
    UniqueDef::new(
        "discussion_comment_link_comment_unique",
        EntityKind::DiscussionCommentLink,
        &["comment_id"],
    ),
    UniqueDef::new(
        "comment_comment_link_child_unique",
        EntityKind::CommentCommentLink,
        &["child_id"],
    ),
];

