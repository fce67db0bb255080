use std::fmt;

use num_bigint::{BigInt, ParseBigIntError};
use num_traits::Num;
use thiserror::Error;

const KEY_DERIVATION_CONTEXT: &str = "dicom-anonymization 2024-05-01 pseudonym key";

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Invalid input: {}", .0.to_lowercase())]
    InvalidInput(String),
}

impl From<ParseBigIntError> for Error {
    fn from(err: ParseBigIntError) -> Self {
        Error::InvalidInput(format!("{err}"))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub trait Hasher {
    /// Returns the digest of `input` as a decimal number.
    fn hash(&self, input: &str) -> Result<String>;

    /// Returns the digest of `input` as exactly `length` lowercase hex characters.
    fn hash_hex(&self, input: &str, length: usize) -> String;
}

/// Keyed blake3 hasher. Instances with the same key produce the same digests.
#[derive(Clone, PartialEq)]
pub struct Blake3Hasher {
    key: [u8; blake3::KEY_LEN],
}

impl Blake3Hasher {
    /// Creates a hasher with a random key.
    pub fn new() -> Self {
        Self {
            key: rand::random(),
        }
    }

    /// Creates a hasher with a key derived from `seed`.
    pub fn from_seed(seed: &str) -> Self {
        Self {
            key: blake3::derive_key(KEY_DERIVATION_CONTEXT, seed.as_bytes()),
        }
    }
}

impl Default for Blake3Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Blake3Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blake3Hasher").finish_non_exhaustive()
    }
}

impl Hasher for Blake3Hasher {
    fn hash(&self, input: &str) -> Result<String> {
        let hash = blake3::keyed_hash(&self.key, input.as_bytes());
        let hash_as_number = BigInt::from_str_radix(hash.to_hex().as_str(), 16)?;
        Ok(hash_as_number.to_string())
    }

    fn hash_hex(&self, input: &str, length: usize) -> String {
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        hasher.update(input.as_bytes());

        let mut output = vec![0u8; length.div_ceil(2)];
        hasher.finalize_xof().fill(&mut output);

        let mut hex: String = output.iter().map(|b| format!("{b:02x}")).collect();
        hex.truncate(length);
        hex
    }
}
