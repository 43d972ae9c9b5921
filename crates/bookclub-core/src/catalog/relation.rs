//! Relation definitions between entities.

use super::kind::EntityKind;

/// Behavior when a referenced row is purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteBehavior {
    /// Delete the referencing rows.
    Cascade,
    /// Clear the reference, keep the referencing row.
    SetNull,
}

/// A foreign key from one entity's field to another entity's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDef {
    /// Relation name (unique within the catalog).
    pub name: &'static str,
    /// Entity holding the reference.
    pub from_entity: EntityKind,
    /// Field on the referencing entity.
    pub from_field: &'static str,
    /// Referenced entity.
    pub to_entity: EntityKind,
    /// What happens to referencing rows when the target is purged.
    pub on_delete: DeleteBehavior,
}

impl RelationDef {
    const fn cascade(
        name: &'static str,
        from_entity: EntityKind,
        from_field: &'static str,
        to_entity: EntityKind,
    ) -> Self {
        Self {
            name,
            from_entity,
            from_field,
            to_entity,
            on_delete: DeleteBehavior::Cascade,
        }
    }

    const fn set_null(
        name: &'static str,
        from_entity: EntityKind,
        from_field: &'static str,
        to_entity: EntityKind,
    ) -> Self {
        Self {
            name,
            from_entity,
            from_field,
            to_entity,
            on_delete: DeleteBehavior::SetNull,
        }
    }
}

use EntityKind::*;

/// Every relation in the store.
pub const RELATIONS: &[RelationDef] = &[
    // Attribution: losing the author keeps the content.
    RelationDef::set_null("clubs_owner_fk", Club, "owner_id", User),
    RelationDef::set_null("discussions_owner_fk", Discussion, "owner_id", User),
    RelationDef::set_null("comments_user_fk", Comment, "user_id", User),
    RelationDef::set_null("reviews_user_fk", Review, "user_id", User),
    // Ownership: the row cannot exist without its target.
    RelationDef::cascade("reviews_book_fk", Review, "book_id", Book),
    RelationDef::cascade("user_book_listing_user_fk", UserBookListing, "user_id", User),
    RelationDef::cascade("user_book_listing_book_fk", UserBookListing, "book_id", Book),
    RelationDef::cascade("friend_requests_from_fk", FriendRequest, "from_id", User),
    RelationDef::cascade("friend_requests_to_fk", FriendRequest, "to_id", User),
    RelationDef::cascade("friends_user_a_fk", Friendship, "user_a", User),
    RelationDef::cascade("friends_user_b_fk", Friendship, "user_b", User),
    RelationDef::cascade("club_user_link_club_fk", ClubUserLink, "club_id", Club),
    RelationDef::cascade("club_user_link_user_fk", ClubUserLink, "user_id", User),
    RelationDef::cascade("club_book_link_club_fk", ClubBookLink, "club_id", Club),
    RelationDef::cascade("club_book_link_book_fk", ClubBookLink, "book_id", Book),
    RelationDef::cascade("club_discussion_link_club_fk", ClubDiscussionLink, "club_id", Club),
    RelationDef::cascade(
        "club_discussion_link_discussion_fk",
        ClubDiscussionLink,
        "discussion_id",
        Discussion,
    ),
    RelationDef::cascade(
        "discussion_book_link_discussion_fk",
        DiscussionBookLink,
        "discussion_id",
        Discussion,
    ),
    RelationDef::cascade("discussion_book_link_book_fk", DiscussionBookLink, "book_id", Book),
    RelationDef::cascade(
        "discussion_comment_link_discussion_fk",
        DiscussionCommentLink,
        "discussion_id",
        Discussion,
    ),
    RelationDef::cascade(
        "discussion_comment_link_comment_fk",
        DiscussionCommentLink,
        "comment_id",
        Comment,
    ),
    RelationDef::cascade("comment_comment_link_parent_fk", CommentCommentLink, "parent_id", Comment),
    RelationDef::cascade("comment_comment_link_child_fk", CommentCommentLink, "child_id", Comment),
    RelationDef::cascade("review_comment_link_review_fk", ReviewCommentLink, "review_id", Review),
    RelationDef::cascade("review_comment_link_comment_fk", ReviewCommentLink, "comment_id", Comment),
];

/// Relations whose target is `entity` (consulted when `entity` is purged).
pub fn relations_to(entity: EntityKind) -> impl Iterator<Item = &'static RelationDef> {
    RELATIONS.iter().filter(move |r| r.to_entity == entity)
}

/// Relations declared on `entity` (consulted when `entity` is written).
pub fn relations_from(entity: EntityKind) -> impl Iterator<Item = &'static RelationDef> {
    RELATIONS.iter().filter(move |r| r.from_entity == entity)
}
