use crate::config::uid_root::UidRoot;

pub const UID_MAX_LENGTH: usize = 64;

/// Builds a UID from the UID root and a decimal hash, cut to the maximum UID length.
pub(crate) fn uid_from_hash(uid_root: &UidRoot, hash: &str) -> String {
    // UID components must not have leading zeros
    let extra = if hash.starts_with('0') { "9" } else { "" };
    let new_uid = format!("{}{}{}", uid_root.as_prefix(), extra, hash);
    new_uid.chars().take(UID_MAX_LENGTH).collect()
}
