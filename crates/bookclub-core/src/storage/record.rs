//! Envelope for persisted rows.

use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};

/// A stored row with commit metadata.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Record {
    /// Encoded row fields.
    pub payload: Vec<u8>,

    /// Commit sequence that last wrote the row.
    pub version: u64,

    /// Commit timestamp in microseconds since Unix epoch.
    pub written_at: u64,
}

impl Record {
    /// Create a record stamped with the current time.
    pub fn new(payload: Vec<u8>, version: u64) -> Self {
        Self {
            payload,
            version,
            written_at: super::key::current_timestamp(),
        }
    }

    /// Serialize the record to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a record from bytes using rkyv.
    ///
    /// sled hands out unaligned buffers, so the bytes are copied into an
    /// aligned buffer before validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let record = Record::new(br#"{"username":"ann"}"#.to_vec(), 12);
        let bytes = record.to_bytes().unwrap();
        let decoded = Record::from_bytes(&bytes).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn test_corrupt_bytes_rejected() {
        assert!(Record::from_bytes(&[1, 2, 3]).is_err());
    }
}
