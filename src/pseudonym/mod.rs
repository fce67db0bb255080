//! Deterministic pseudonyms for identifiers, hashed values and dates.
//!
//! All derivations are keyed hashes of the original value, so two [`Pseudonymizer`]s with the same
//! key always agree. The per-instance session cache only memoises results.

mod date;
mod uid;

use std::collections::HashMap;

use crate::actions::errors::ActionError;
use crate::actions::hash::HashLength;
use crate::config::uid_root::UidRoot;
use crate::hasher::{Blake3Hasher, Hasher};

pub use uid::UID_MAX_LENGTH;

#[derive(Debug, Clone)]
pub struct Pseudonymizer<H = Blake3Hasher>
where
    H: Hasher,
{
    hasher: H,
    uid_root: UidRoot,
    uids: HashMap<String, String>,
    hashes: HashMap<(String, usize), String>,
}

impl Pseudonymizer<Blake3Hasher> {
    /// Creates a pseudonymizer with a key derived from `seed`, or a random key when there is none.
    pub fn new(uid_root: UidRoot, seed: Option<&str>) -> Self {
        let hasher = match seed {
            Some(seed) => Blake3Hasher::from_seed(seed),
            None => Blake3Hasher::new(),
        };
        Self::with_hasher(hasher, uid_root)
    }
}

impl<H> Pseudonymizer<H>
where
    H: Hasher,
{
    pub(crate) fn with_hasher(hasher: H, uid_root: UidRoot) -> Self {
        Self {
            hasher,
            uid_root,
            uids: HashMap::new(),
            hashes: HashMap::new(),
        }
    }

    pub fn uid_root(&self) -> &UidRoot {
        &self.uid_root
    }

    /// Maps a UID to a new UID below the UID root. The same original UID always maps to the same
    /// new UID.
    pub fn pseudonymize_identifier(&mut self, original: &str) -> Result<String, ActionError> {
        if let Some(uid) = self.uids.get(original) {
            return Ok(uid.clone());
        }

        let hash = self.hasher.hash(original)?;
        let uid = uid::uid_from_hash(&self.uid_root, &hash);
        self.uids.insert(original.into(), uid.clone());
        Ok(uid)
    }

    /// Hashes a value to exactly `length` hex characters.
    pub fn hash_value(&mut self, original: &str, length: HashLength) -> String {
        let key = (original.to_string(), length.value());
        if let Some(hash) = self.hashes.get(&key) {
            return hash.clone();
        }

        let hash = self.hasher.hash_hex(original, length.value());
        self.hashes.insert(key, hash.clone());
        hash
    }

    /// Shifts a date back by a number of days derived from `other`, typically the patient ID, so
    /// that all dates of one patient keep their relative distances.
    pub fn shift_date(&self, value: &str, other: &str) -> Result<String, ActionError> {
        let hash = self.hasher.hash(other)?;
        date::shift_date(value, &hash)
    }

    /// Number of memoised pseudonyms in this session.
    pub fn session_len(&self) -> usize {
        self.uids.len() + self.hashes.len()
    }
}
