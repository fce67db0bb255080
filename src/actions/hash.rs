use thiserror::Error;

pub const HASH_LENGTH_MINIMUM: usize = 8;

#[derive(Error, Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[error("{0}")]
pub struct HashLengthError(pub(crate) String);

/// A newtype wrapper for specifying the length of a hash value.
/// The internal value represents the number of hex characters the hash should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashLength(pub(crate) usize);

impl HashLength {
    /// Creates a new [`HashLength`] instance.
    ///
    /// # Arguments
    /// * `length` - The desired length of the hash in characters
    ///
    /// # Returns
    /// * `Ok(HashLength)` if length is valid (>= `HASH_LENGTH_MINIMUM`, which is `8`)
    /// * `Err(HashLengthError)` if length is too short
    pub fn new(length: usize) -> Result<Self, HashLengthError> {
        if length < HASH_LENGTH_MINIMUM {
            return Err(HashLengthError(format!(
                "hash length must be at least {}",
                HASH_LENGTH_MINIMUM
            )));
        }
        Ok(HashLength(length))
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for HashLength {
    type Error = HashLengthError;

    fn try_from(value: usize) -> Result<Self, HashLengthError> {
        let hash_length = HashLength::new(value)?;
        Ok(hash_length)
    }
}
