//! Bundle identity: checksums and staging keys.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

/// Hex-encoded MD5 of the bundle bytes, used in staging keys
pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Base64 SHA-256 of the bundle bytes, the format Lambda reports as `CodeSha256`
pub fn code_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    STANDARD.encode(hasher.finalize())
}

/// Unix time with microsecond precision, e.g. `1700000000.123456`
pub fn unix_timestamp(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros())
}

/// Object key for a staged bundle: `<prefix><md5>-<unix timestamp>.zip`
pub fn staging_key(prefix: &str, md5: &str, timestamp: &str) -> String {
    format!("{prefix}{md5}-{timestamp}.zip")
}
