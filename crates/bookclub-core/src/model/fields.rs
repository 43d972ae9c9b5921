//! Conversion between typed rows and loose field maps.
//!
//! Field maps are what the dynamic `create(kind, fields)` interface accepts
//! and what rows are persisted as. Decoding goes through serde, so enum
//! fields accept only their closed set of names and unknown fields are
//! rejected.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::catalog::{EntityKind, LinkKind};
use crate::error::{Error, Result};

use super::{Id, Link, Row};

/// Field name to value map.
pub type Fields = Map<String, Value>;

fn decode<T: DeserializeOwned>(kind: EntityKind, fields: Fields) -> Result<T> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| Error::validation(kind, e.to_string()))
}

fn encode<T: Serialize>(record: &T) -> Result<Fields> {
    match serde_json::to_value(record) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(Error::Serialization(format!(
            "record encoded as {other} instead of an object"
        ))),
        Err(e) => Err(Error::Serialization(e.to_string())),
    }
}

fn link_endpoint(link: LinkKind, fields: &Fields, name: &str) -> Result<Id> {
    let entity = link.entity();
    match fields.get(name) {
        Some(value) => value
            .as_u64()
            .ok_or_else(|| Error::validation(entity, format!("`{name}` must be an id, got {value}"))),
        None => Err(Error::validation(entity, format!("missing field `{name}`"))),
    }
}

fn link_from_fields(link: LinkKind, fields: &Fields) -> Result<Link> {
    let (left, right) = link.fields();
    if let Some(unknown) = fields.keys().find(|k| *k != left && *k != right) {
        return Err(Error::validation(
            link.entity(),
            format!("unknown field `{unknown}`, expected `{left}` or `{right}`"),
        ));
    }
    Ok(Link::new(
        link,
        link_endpoint(link, fields, left)?,
        link_endpoint(link, fields, right)?,
    ))
}

impl Row {
    /// Build a row of `kind` from a field map.
    pub fn from_fields(kind: EntityKind, fields: Fields) -> Result<Row> {
        if let Some(link) = kind.link() {
            return link_from_fields(link, &fields).map(Row::Link);
        }

        Ok(match kind {
            EntityKind::User => Row::User(decode(kind, fields)?),
            EntityKind::Book => Row::Book(decode(kind, fields)?),
            EntityKind::Club => Row::Club(decode(kind, fields)?),
            EntityKind::Discussion => Row::Discussion(decode(kind, fields)?),
            EntityKind::Comment => Row::Comment(decode(kind, fields)?),
            EntityKind::Review => Row::Review(decode(kind, fields)?),
            EntityKind::UserBookListing => Row::UserBookListing(decode(kind, fields)?),
            EntityKind::FriendRequest => Row::FriendRequest(decode(kind, fields)?),
            EntityKind::Friendship => Row::Friendship(decode(kind, fields)?),
            _ => return Err(Error::validation(kind, "not a record table")),
        })
    }

    /// All fields of this row, including its key fields.
    pub fn to_fields(&self) -> Result<Fields> {
        match self {
            Row::User(r) => encode(r),
            Row::Book(r) => encode(r),
            Row::Club(r) => encode(r),
            Row::Discussion(r) => encode(r),
            Row::Comment(r) => encode(r),
            Row::Review(r) => encode(r),
            Row::UserBookListing(r) => encode(r),
            Row::FriendRequest(r) => encode(r),
            Row::Friendship(r) => encode(r),
            Row::Link(link) => {
                let (left, right) = link.kind.fields();
                let mut fields = Fields::new();
                fields.insert(left.to_string(), Value::from(link.left));
                fields.insert(right.to_string(), Value::from(link.right));
                Ok(fields)
            }
        }
    }

    /// Apply a partial field map on top of this row.
    pub fn merged(&self, changes: Fields) -> Result<Row> {
        let mut fields = self.to_fields()?;
        fields.extend(changes);
        Row::from_fields(self.kind(), fields)
    }

    /// Encode for the storage substrate.
    pub(crate) fn to_payload(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.to_fields()?).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Decode a row persisted by [`Row::to_payload`].
    pub(crate) fn from_payload(kind: EntityKind, payload: &[u8]) -> Result<Row> {
        let fields: Fields =
            serde_json::from_slice(payload).map_err(|e| Error::Deserialization(e.to_string()))?;
        Row::from_fields(kind, fields).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{ReadingStatus, User, UserBookListing};
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_user_from_fields() {
        let row = Row::from_fields(EntityKind::User, fields(json!({"username": "ann"}))).unwrap();
        assert_eq!(row, Row::User(User::new("ann")));
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let err = Row::from_fields(
            EntityKind::UserBookListing,
            fields(json!({"user_id": 1, "book_id": 2, "reading_status": "finished"})),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Row::from_fields(
            EntityKind::User,
            fields(json!({"username": "ann", "password": "x"})),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = Row::from_fields(
            EntityKind::ClubUserLink,
            fields(json!({"club_id": 1, "user_id": 2, "extra": 3})),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_link_fields() {
        let row = Row::from_fields(
            EntityKind::CommentCommentLink,
            fields(json!({"parent_id": 1, "child_id": 2})),
        )
        .unwrap();
        assert_eq!(row.key(), crate::model::RowKey::Pair(1, 2));
        assert_eq!(
            Value::Object(row.to_fields().unwrap()),
            json!({"parent_id": 1, "child_id": 2})
        );

        let err = Row::from_fields(
            EntityKind::CommentCommentLink,
            fields(json!({"parent_id": 1})),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_merged_update() {
        let row: Row = UserBookListing::new(1, 2).into();
        let updated = row
            .merged(fields(json!({"reading_status": "complete"})))
            .unwrap();
        match updated {
            Row::UserBookListing(listing) => {
                assert_eq!(listing.reading_status, Some(ReadingStatus::Complete))
            }
            other => panic!("unexpected row {other:?}"),
        }
    }

    #[test]
    fn test_payload_roundtrip_preserves_nulls() {
        let row: Row = crate::model::Club::new("c").into();
        let payload = row.to_payload().unwrap();
        assert_eq!(Row::from_payload(EntityKind::Club, &payload).unwrap(), row);
    }
}
