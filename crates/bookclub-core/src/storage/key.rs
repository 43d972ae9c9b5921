//! Storage key encoding.
//!
//! Key format: `[kind tag (1 byte)][key form (1 byte)][id (8 bytes BE)]{[id (8 bytes BE)]}`
//!
//! Big-endian ids keep a table's rows in id order inside the sled tree.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::catalog::EntityKind;
use crate::model::RowKey;

const FORM_ID: u8 = 0;
const FORM_PAIR: u8 = 1;

/// Encode the sled key for a row.
pub fn encode(kind: EntityKind, key: RowKey) -> Vec<u8> {
    let mut buf = Vec::with_capacity(18);
    buf.push(kind.tag());
    match key {
        RowKey::Id(id) => {
            buf.push(FORM_ID);
            buf.extend_from_slice(&id.to_be_bytes());
        }
        RowKey::Pair(a, b) => {
            buf.push(FORM_PAIR);
            buf.extend_from_slice(&a.to_be_bytes());
            buf.extend_from_slice(&b.to_be_bytes());
        }
    }
    buf
}

/// Decode a sled key produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Option<(EntityKind, RowKey)> {
    let (&tag, rest) = bytes.split_first()?;
    let kind = EntityKind::from_tag(tag)?;
    let (&form, ids) = rest.split_first()?;

    let read = |chunk: &[u8]| -> Option<u64> { Some(u64::from_be_bytes(chunk.try_into().ok()?)) };

    let key = match (form, ids.len()) {
        (FORM_ID, 8) => RowKey::Id(read(ids)?),
        (FORM_PAIR, 16) => RowKey::Pair(read(&ids[..8])?, read(&ids[8..])?),
        _ => return None,
    };
    Some((kind, key))
}

/// Current time in microseconds since Unix epoch.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let cases = [
            (EntityKind::User, RowKey::Id(42)),
            (EntityKind::UserBookListing, RowKey::Pair(1, u64::MAX)),
            (EntityKind::ReviewCommentLink, RowKey::Pair(0, 9)),
        ];
        for (kind, key) in cases {
            assert_eq!(decode(&encode(kind, key)), Some((kind, key)));
        }
    }

    #[test]
    fn test_id_ordering() {
        let a = encode(EntityKind::Book, RowKey::Id(2));
        let b = encode(EntityKind::Book, RowKey::Id(256));
        assert!(a < b);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode(&[]), None);
        assert_eq!(decode(&[EntityKind::User.tag(), FORM_ID, 1, 2]), None);
        assert_eq!(decode(&[250, FORM_ID, 0, 0, 0, 0, 0, 0, 0, 1]), None);
    }
}
