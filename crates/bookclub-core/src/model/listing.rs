//! Per-user book listings.

use serde::{Deserialize, Serialize};

use super::Id;

/// Where a user is with a book. Absent means no status set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    Pending,
    Reading,
    Complete,
}

/// A user's opinion of a book. Absent means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Opinion {
    Liked,
    Disliked,
}

/// A book on a user's shelf, keyed by (user_id, book_id).
///
/// `reviewed` is maintained by the store: it is true exactly when a review by
/// this user for this book exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserBookListing {
    pub user_id: Id,
    pub book_id: Id,
    #[serde(default)]
    pub reading_status: Option<ReadingStatus>,
    #[serde(default)]
    pub reviewed: bool,
    #[serde(default)]
    pub liked: Option<Opinion>,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub current_page: Option<u32>,
}

impl UserBookListing {
    pub fn new(user_id: Id, book_id: Id) -> Self {
        Self {
            user_id,
            book_id,
            reading_status: None,
            reviewed: false,
            liked: None,
            ignored: false,
            current_page: None,
        }
    }

    pub fn with_status(mut self, status: ReadingStatus) -> Self {
        self.reading_status = Some(status);
        self
    }

    pub fn with_opinion(mut self, opinion: Opinion) -> Self {
        self.liked = Some(opinion);
        self
    }
}
