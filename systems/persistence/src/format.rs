use serde::{de::DeserializeOwned, Serialize};

use crate::PersistenceError;

/// Magic number prefixed to every file written by this crate.
const MAGIC: u32 = 0x5345_4354;

/// Current layout version of the payload.
const FORMAT_VERSION: u32 = 1;

/// Encoded size of the `(magic, version)` header with bincode's fixed-width integers.
const HEADER_LEN: usize = 8;

/// Serializes the payload behind the versioned header.
pub(crate) fn encode<T: Serialize>(payload: &T) -> Result<Vec<u8>, PersistenceError> {
    bincode::serialize(&(MAGIC, FORMAT_VERSION, payload)).map_err(PersistenceError::Encode)
}

/// Validates the header and deserializes the payload that follows it.
pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PersistenceError> {
    let header = bytes.get(..HEADER_LEN).ok_or(PersistenceError::TooShort)?;
    let (magic, version): (u32, u32) =
        bincode::deserialize(header).map_err(PersistenceError::Decode)?;
    if magic != MAGIC {
        return Err(PersistenceError::InvalidMagic(magic));
    }
    if version != FORMAT_VERSION {
        return Err(PersistenceError::UnsupportedVersion(version));
    }
    bincode::deserialize(&bytes[HEADER_LEN..]).map_err(PersistenceError::Decode)
}
