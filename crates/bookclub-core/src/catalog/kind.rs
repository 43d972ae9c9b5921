//! Entity kinds and their lifecycle rules.

use std::fmt;
use std::str::FromStr;

/// How a `delete` request is carried out for an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Set the `deleted` flag and keep the row.
    Soft,
    /// Physically remove the row and cascade to dependents.
    Hard,
}

/// Every table the store owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    User,
    Book,
    Club,
    Discussion,
    Comment,
    Review,
    UserBookListing,
    FriendRequest,
    Friendship,
    ClubUserLink,
    ClubBookLink,
    ClubDiscussionLink,
    DiscussionBookLink,
    DiscussionCommentLink,
    CommentCommentLink,
    ReviewCommentLink,
}

impl EntityKind {
    /// All entity kinds, in storage tag order.
    pub const ALL: [EntityKind; 16] = [
        EntityKind::User,
        EntityKind::Book,
        EntityKind::Club,
        EntityKind::Discussion,
        EntityKind::Comment,
        EntityKind::Review,
        EntityKind::UserBookListing,
        EntityKind::FriendRequest,
        EntityKind::Friendship,
        EntityKind::ClubUserLink,
        EntityKind::ClubBookLink,
        EntityKind::ClubDiscussionLink,
        EntityKind::DiscussionBookLink,
        EntityKind::DiscussionCommentLink,
        EntityKind::CommentCommentLink,
        EntityKind::ReviewCommentLink,
    ];

    /// Table name used in commands and error messages.
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Book => "books",
            EntityKind::Club => "clubs",
            EntityKind::Discussion => "discussions",
            EntityKind::Comment => "comments",
            EntityKind::Review => "reviews",
            EntityKind::UserBookListing => "user_book_listing",
            EntityKind::FriendRequest => "friend_requests",
            EntityKind::Friendship => "friends",
            EntityKind::ClubUserLink => "club_user_link",
            EntityKind::ClubBookLink => "club_book_link",
            EntityKind::ClubDiscussionLink => "club_discussion_link",
            EntityKind::DiscussionBookLink => "discussion_book_link",
            EntityKind::DiscussionCommentLink => "discussion_comment_link",
            EntityKind::CommentCommentLink => "comment_comment_link",
            EntityKind::ReviewCommentLink => "review_comment_link",
        }
    }

    /// Stable one-byte tag used as the storage key prefix.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Resolve a storage tag back into a kind.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Delete policy applied by a plain `delete`.
    pub fn delete_policy(self) -> DeletePolicy {
        match self {
            EntityKind::User | EntityKind::Book | EntityKind::Club => DeletePolicy::Soft,
            _ => DeletePolicy::Hard,
        }
    }

    /// Whether rows carry a `deleted` flag.
    pub fn is_soft_deletable(self) -> bool {
        self.delete_policy() == DeletePolicy::Soft
    }

    /// Whether rows are keyed by a single id rather than an id pair.
    pub fn has_id_key(self) -> bool {
        !matches!(self, EntityKind::UserBookListing | EntityKind::Friendship) && self.link().is_none()
    }

    /// The link definition when this kind is a junction table.
    pub fn link(self) -> Option<LinkKind> {
        match self {
            EntityKind::ClubUserLink => Some(LinkKind::ClubUser),
            EntityKind::ClubBookLink => Some(LinkKind::ClubBook),
            EntityKind::ClubDiscussionLink => Some(LinkKind::ClubDiscussion),
            EntityKind::DiscussionBookLink => Some(LinkKind::DiscussionBook),
            EntityKind::DiscussionCommentLink => Some(LinkKind::DiscussionComment),
            EntityKind::CommentCommentLink => Some(LinkKind::CommentComment),
            EntityKind::ReviewCommentLink => Some(LinkKind::ReviewComment),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a table or view name is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown table or view `{0}`")]
pub struct UnknownName(pub String);

impl FromStr for EntityKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// Junction tables and their two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkKind {
    ClubUser,
    ClubBook,
    ClubDiscussion,
    DiscussionBook,
    DiscussionComment,
    CommentComment,
    ReviewComment,
}

impl LinkKind {
    /// The table backing this link.
    pub fn entity(self) -> EntityKind {
        match self {
            LinkKind::ClubUser => EntityKind::ClubUserLink,
            LinkKind::ClubBook => EntityKind::ClubBookLink,
            LinkKind::ClubDiscussion => EntityKind::ClubDiscussionLink,
            LinkKind::DiscussionBook => EntityKind::DiscussionBookLink,
            LinkKind::DiscussionComment => EntityKind::DiscussionCommentLink,
            LinkKind::CommentComment => EntityKind::CommentCommentLink,
            LinkKind::ReviewComment => EntityKind::ReviewCommentLink,
        }
    }

    /// Field names of the (left, right) endpoints.
    pub fn fields(self) -> (&'static str, &'static str) {
        match self {
            LinkKind::ClubUser => ("club_id", "user_id"),
            LinkKind::ClubBook => ("club_id", "book_id"),
            LinkKind::ClubDiscussion => ("club_id", "discussion_id"),
            LinkKind::DiscussionBook => ("discussion_id", "book_id"),
            LinkKind::DiscussionComment => ("discussion_id", "comment_id"),
            LinkKind::CommentComment => ("parent_id", "child_id"),
            LinkKind::ReviewComment => ("review_id", "comment_id"),
        }
    }

    /// Entity kinds of the (left, right) endpoints.
    pub fn endpoints(self) -> (EntityKind, EntityKind) {
        match self {
            LinkKind::ClubUser => (EntityKind::Club, EntityKind::User),
            LinkKind::ClubBook => (EntityKind::Club, EntityKind::Book),
            LinkKind::ClubDiscussion => (EntityKind::Club, EntityKind::Discussion),
            LinkKind::DiscussionBook => (EntityKind::Discussion, EntityKind::Book),
            LinkKind::DiscussionComment => (EntityKind::Discussion, EntityKind::Comment),
            LinkKind::CommentComment => (EntityKind::Comment, EntityKind::Comment),
            LinkKind::ReviewComment => (EntityKind::Review, EntityKind::Comment),
        }
    }
}

impl From<LinkKind> for EntityKind {
    fn from(link: LinkKind) -> Self {
        link.entity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_roundtrip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(EntityKind::from_tag(200), None);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("users".parse::<EntityKind>().unwrap(), EntityKind::User);
        assert_eq!(
            "comment_comment_link".parse::<EntityKind>().unwrap(),
            EntityKind::CommentCommentLink
        );
        assert!("user".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_delete_policy() {
        assert_eq!(EntityKind::User.delete_policy(), DeletePolicy::Soft);
        assert_eq!(EntityKind::Club.delete_policy(), DeletePolicy::Soft);
        assert_eq!(EntityKind::Review.delete_policy(), DeletePolicy::Hard);
        assert_eq!(EntityKind::ClubUserLink.delete_policy(), DeletePolicy::Hard);
    }

    #[test]
    fn test_link_endpoints() {
        for kind in EntityKind::ALL {
            if let Some(link) = kind.link() {
                assert_eq!(link.entity(), kind);
                assert!(!kind.has_id_key());
            }
        }
        assert!(EntityKind::Review.has_id_key());
        assert!(!EntityKind::UserBookListing.has_id_key());
    }
}
