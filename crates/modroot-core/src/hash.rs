//! Content hashing for asset deduplication

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

/// SHA-256 of an asset's bytes; equal hashes mean equal content
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    pub fn from_reader<R: io::Read>(mut reader: R) -> io::Result<Self> {
        let mut hasher = Sha256::new();
        io::copy(&mut reader, &mut hasher)?;
        Ok(Self(hasher.finalize().into()))
    }

    /// Streamed, the file is never loaded whole
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_bytes_equal_hash() {
        assert_eq!(ContentHash::from_bytes(b"albedo"), ContentHash::from_bytes(b"albedo"));
        assert_ne!(ContentHash::from_bytes(b"albedo"), ContentHash::from_bytes(b"normal"));
    }

    #[test]
    fn test_streamed_large_input() {
        let data = vec![7u8; 100_000];
        let streamed = ContentHash::from_reader(&data[..]).unwrap();
        assert_eq!(streamed, ContentHash::from_bytes(&data));
        assert_eq!(streamed.to_hex().len(), 64);
        assert_eq!(streamed.to_string().len(), 16);
    }
}
