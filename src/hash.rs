//! Cryptographic hash functions

use ring::digest;
use std::convert::TryInto;

use crate::error::Error;

/// SHA-256 hash
pub fn sha256(data: &[u8]) -> Result<[u8; 32], Error> {
    let hash = digest::digest(&digest::SHA256, data).as_ref().try_into()?;
    Ok(hash)
}

/// SHA-256 hash as lowercase hex, the form used by URDNA2015.
pub fn sha256_hex(data: &[u8]) -> Result<String, Error> {
    Ok(sha256(data)?
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect())
}
