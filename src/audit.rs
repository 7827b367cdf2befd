//! Request integrity hashing
//!
//! Conversations carry a SHA-256 hash of their originating request so that a
//! stored context can later be checked against what the user actually asked.

use crate::models::ConversationContext;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::io::Write;
use uuid::Uuid;

pub const REQUEST_HASH_KEY: &str = "request_hash";

/// Compute SHA256 hash of the originating request.
/// Uses zero-copy streaming serialization into the hasher.
pub fn compute_request_hash(
    user_id: Uuid,
    request_type: &str,
    parameters: &serde_json::Value,
) -> String {
    let payload = json!({
        "user_id": user_id,
        "request_type": request_type,
        "parameters": parameters,
    });

    let mut hasher = Sha256::new();
    if serde_json::to_writer(&mut HashWriter(&mut hasher), &payload).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Check a stored context against its recorded request hash.
pub fn verify_request_integrity(context: &ConversationContext) -> bool {
    let Some(stored) = context
        .metadata
        .get(REQUEST_HASH_KEY)
        .and_then(|v| v.as_str())
    else {
        return false;
    };

    stored == compute_request_hash(context.user_id, &context.request_type, &context.parameters)
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
