//! Primary entity records.
//!
//! Ids are assigned by the store on create; any id set on a new record is
//! replaced.

use serde::{Deserialize, Serialize};

use super::Id;

/// Highest star count a review may carry.
pub const MAX_STARS: u8 = 10;

fn default_true() -> bool {
    true
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    #[serde(default)]
    pub id: Id,
    pub username: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: 0,
            username: username.into(),
            description: None,
            deleted: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A book in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Book {
    #[serde(default)]
    pub id: Id,
    pub handle: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub deleted: bool,
}

impl Book {
    pub fn new(handle: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: 0,
            handle: handle.into(),
            full_name: full_name.into(),
            description: None,
            pages: None,
            deleted: false,
        }
    }

    pub fn with_pages(mut self, pages: u32) -> Self {
        self.pages = Some(pages);
        self
    }
}

/// A reading club.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Club {
    #[serde(default)]
    pub id: Id,
    pub handle: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: Option<Id>,
    #[serde(default)]
    pub deleted: bool,
}

impl Club {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            id: 0,
            handle: handle.into(),
            description: None,
            owner_id: None,
            deleted: false,
        }
    }

    pub fn with_owner(mut self, owner_id: Id) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A discussion thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Discussion {
    #[serde(default)]
    pub id: Id,
    pub topic: String,
    #[serde(default)]
    pub owner_id: Option<Id>,
}

impl Discussion {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            id: 0,
            topic: topic.into(),
            owner_id: None,
        }
    }

    pub fn with_owner(mut self, owner_id: Id) -> Self {
        self.owner_id = Some(owner_id);
        self
    }
}

/// A comment; new comments wait for approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Comment {
    #[serde(default)]
    pub id: Id,
    #[serde(default)]
    pub user_id: Option<Id>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default = "default_true")]
    pub pending: bool,
}

impl Comment {
    pub fn new(user_id: Option<Id>, content: impl Into<String>) -> Self {
        Self {
            id: 0,
            user_id,
            content: Some(content.into()),
            pending: true,
        }
    }

    pub fn approved(mut self) -> Self {
        self.pending = false;
        self
    }
}

/// A user's review of a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Review {
    #[serde(default)]
    pub id: Id,
    #[serde(default)]
    pub user_id: Option<Id>,
    pub book_id: Id,
    #[serde(default)]
    pub stars: u8,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl Review {
    pub fn new(user_id: Option<Id>, book_id: Id, stars: u8, title: impl Into<String>) -> Self {
        Self {
            id: 0,
            user_id,
            book_id,
            stars,
            title: title.into(),
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}
