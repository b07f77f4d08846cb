//! Version-identity digests for generated functions.
//!
//! Neither digest is a security boundary. [`checksum`] is a 32-bit rolling
//! hash and collisions are possible for large header sets.

use edgesite_core::FunctionPackage;
use sha2::{Digest, Sha256};

/// `hash = hash * 31 + unit` over the UTF-16 code units of `s`, wrapping as a
/// signed 32-bit integer, rendered in decimal. Empty input yields `""`.
pub fn checksum(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    s.encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
        .to_string()
}

/// SHA-256 over everything that makes up a deployed package, hex encoded.
///
/// Fields are length-prefixed so that moving bytes between fields changes
/// the digest.
pub fn content_digest(package: &FunctionPackage) -> String {
    let mut hasher = Sha256::new();
    for field in [
        package.runtime.as_str(),
        package.handler.as_str(),
        &package.memory_mb.to_string(),
        package.file_name.as_str(),
        package.source.as_str(),
    ] {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// SHA-256 of raw bytes, hex encoded.
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(source: &str) -> FunctionPackage {
        FunctionPackage {
            name: "headers".to_string(),
            runtime: "nodejs14.x".to_string(),
            handler: "index.handler".to_string(),
            memory_mb: 128,
            file_name: "index.js".to_string(),
            source: source.to_string(),
        }
    }

    #[test]
    fn checksum_empty_is_empty_string() {
        assert_eq!(checksum(""), "");
    }

    #[test]
    fn checksum_known_values() {
        assert_eq!(checksum("a"), "97");
        assert_eq!(checksum("ab"), "3105");
        assert_eq!(checksum("hello"), "99162322");
    }

    #[test]
    fn checksum_wraps_to_negative() {
        // 31-polynomial hash of this string lands exactly on i32::MIN.
        assert_eq!(checksum("polygenelubricants"), "-2147483648");
    }

    #[test]
    fn checksum_uses_utf16_code_units() {
        // U+1F600 is a surrogate pair: 0xD83D, 0xDE00.
        let expected = (0xD83Di32).wrapping_mul(31).wrapping_add(0xDE00);
        assert_eq!(checksum("\u{1F600}"), expected.to_string());
    }

    #[test]
    fn content_digest_tracks_every_field() {
        let base = package("x");
        let digest = content_digest(&base);
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, content_digest(&package("x")));

        let mut other = base.clone();
        other.memory_mb = 256;
        assert_ne!(digest, content_digest(&other));

        let mut other = base.clone();
        other.runtime = "nodejs18.x".to_string();
        assert_ne!(digest, content_digest(&other));

        assert_ne!(digest, content_digest(&package("y")));
    }

    #[test]
    fn content_digest_ignores_function_name() {
        let mut renamed = package("x");
        renamed.name = "other".to_string();
        assert_eq!(content_digest(&package("x")), content_digest(&renamed));
    }
}
