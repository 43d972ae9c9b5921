//! Junction table rows.

use crate::catalog::LinkKind;

use super::Id;

/// A row in one of the link tables, keyed by its two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub kind: LinkKind,
    pub left: Id,
    pub right: Id,
}

impl Link {
    pub fn new(kind: LinkKind, left: Id, right: Id) -> Self {
        Self { kind, left, right }
    }

    pub fn club_user(club_id: Id, user_id: Id) -> Self {
        Self::new(LinkKind::ClubUser, club_id, user_id)
    }

    pub fn club_book(club_id: Id, book_id: Id) -> Self {
        Self::new(LinkKind::ClubBook, club_id, book_id)
    }

    pub fn club_discussion(club_id: Id, discussion_id: Id) -> Self {
        Self::new(LinkKind::ClubDiscussion, club_id, discussion_id)
    }

    pub fn discussion_book(discussion_id: Id, book_id: Id) -> Self {
        Self::new(LinkKind::DiscussionBook, discussion_id, book_id)
    }

    pub fn discussion_comment(discussion_id: Id, comment_id: Id) -> Self {
        Self::new(LinkKind::DiscussionComment, discussion_id, comment_id)
    }

    pub fn comment_reply(parent_id: Id, child_id: Id) -> Self {
        Self::new(LinkKind::CommentComment, parent_id, child_id)
    }

    pub fn review_comment(review_id: Id, comment_id: Id) -> Self {
        Self::new(LinkKind::ReviewComment, review_id, comment_id)
    }
}
