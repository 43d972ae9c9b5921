//! Friend requests and the friendships derived from them.

use serde::{Deserialize, Serialize};

use super::Id;

/// Lifecycle of a friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    #[default]
    Pending,
    Rejected,
    Confirmed,
}

/// A request from one user to another. A user may send one to themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FriendRequest {
    #[serde(default)]
    pub id: Id,
    pub from_id: Id,
    pub to_id: Id,
    #[serde(default)]
    pub status: FriendRequestStatus,
}

impl FriendRequest {
    pub fn new(from_id: Id, to_id: Id) -> Self {
        Self {
            id: 0,
            from_id,
            to_id,
            status: FriendRequestStatus::Pending,
        }
    }

    pub fn with_status(mut self, status: FriendRequestStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == FriendRequestStatus::Confirmed
    }
}

/// An unordered pair of users; stored with `user_a <= user_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Friendship {
    pub user_a: Id,
    pub user_b: Id,
}

impl Friendship {
    /// The friendship between two users, in either order.
    pub fn between(x: Id, y: Id) -> Self {
        Self {
            user_a: x.min(y),
            user_b: x.max(y),
        }
    }

    /// Both request directions that can produce this friendship.
    pub fn directions(&self) -> Vec<(Id, Id)> {
        if self.user_a == self.user_b {
            vec![(self.user_a, self.user_b)]
        } else {
            vec![(self.user_a, self.user_b), (self.user_b, self.user_a)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_is_unordered() {
        assert_eq!(Friendship::between(5, 2), Friendship::between(2, 5));
        assert_eq!(Friendship::between(5, 2).user_a, 2);
    }

    #[test]
    fn test_directions() {
        assert_eq!(Friendship::between(1, 2).directions(), vec![(1, 2), (2, 1)]);
        assert_eq!(Friendship::between(3, 3).directions(), vec![(3, 3)]);
    }

    #[test]
    fn test_status_closed_set() {
        assert!(serde_json::from_str::<FriendRequestStatus>("\"accepted\"").is_err());
        let request: FriendRequest =
            serde_json::from_str(r#"{"from_id": 1, "to_id": 2}"#).unwrap();
        assert_eq!(request.status, FriendRequestStatus::Pending);
    }
}
