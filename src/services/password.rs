//! Legacy password digest
//!
//! Very old installations stored `user_pass` as a bare MD5 hex digest. This
//! module can produce and recognise that form for data migration.
//!
//! # Security
//!
//! - MD5 is broken for password storage: unsalted, fast, precomputed tables exist
//! - Current installations use portable phpass hashes (`$P$...`), which this
//!   crate does not produce or verify
//! - Nothing in the crate calls these functions implicitly; saving a user
//!   stores `user_pass` exactly as given

/// Lowercase hex MD5 digest of `password`.
///
/// # Example
///
/// ```
/// use wp_records::services::legacy_md5_digest;
///
/// assert_eq!(legacy_md5_digest("password"), "5f4dcc3b5aa765d61d8327deb882cf99");
/// ```
pub fn legacy_md5_digest(password: &str) -> String {
    format!("{:x}", md5::compute(password.as_bytes()))
}

/// Whether `stored` is a bare MD5 digest (32 hex digits) rather than a
/// salted hash.
pub fn is_legacy_md5_digest(stored: &str) -> bool {
    stored.len() == 32 && stored.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Check `password` against a stored legacy digest.
///
/// Returns `false` for anything that is not a legacy digest.
pub fn matches_legacy_md5_digest(password: &str, stored: &str) -> bool {
    is_legacy_md5_digest(stored) && legacy_md5_digest(password).eq_ignore_ascii_case(stored)
}
