/*
 * Derives rename cache keys from file names. A key is the SHA256 digest of the UTF-8 name,
 * so it is stable across runs and processes. Cache entries also keep the exact name they
 * were created for, which lets lookups verify a hit instead of trusting the digest alone.
 */
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenameKey([u8; 32]);

impl RenameKey {
    pub fn from_name(file_name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(file_name.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        RenameKey(bytes)
    }
}

impl fmt::Display for RenameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
