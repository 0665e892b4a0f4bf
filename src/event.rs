use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::IngestError;

/// One inbound webhook delivery, validated and ready to persist.
/// Immutable once built; lives only for the duration of the request.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Payload normalized to compact JSON. These exact bytes are stored.
    pub body: Bytes,
    pub received_at: DateTime<Utc>,
    /// Sender identity taken from request headers, when present.
    pub source: Option<String>,
    pub key: StorageKey,
}

impl WebhookEvent {
    /// Validate and normalize a raw request body into an event.
    pub fn ingest(
        namespace: &str,
        source: Option<String>,
        raw: &[u8],
        max_body_bytes: usize,
    ) -> Result<Self, IngestError> {
        let received_at = Utc::now();
        let body = normalize_payload(raw, max_body_bytes)?;
        let key = StorageKey::derive(namespace, received_at, &body);
        Ok(Self {
            body,
            received_at,
            source,
            key,
        })
    }
}

/// Key of one stored delivery: `{namespace}/{YYYYMMDD}/{sha256 hex}.json`.
///
/// Content-addressed on purpose: a provider retry carrying the same payload
/// on the same UTC day derives the same key and overwrites identical bytes,
/// so duplicates collapse to one visible object. Distinct payloads always
/// get distinct keys, so concurrent deliveries never clobber each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn derive(namespace: &str, received_at: DateTime<Utc>, body: &[u8]) -> Self {
        let digest = hex::encode(Sha256::digest(body));
        let day = received_at.format("%Y%m%d");
        Self(format!("{namespace}/{day}/{digest}.json"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The acceptance predicate for inbound bodies: non-empty, within the size
/// cap, and a JSON object or array (the webhook contract delivers a JSON
/// event envelope). Accepted payloads are re-serialized compactly so stored
/// bytes are independent of sender whitespace.
pub fn normalize_payload(raw: &[u8], max_body_bytes: usize) -> Result<Bytes, IngestError> {
    if raw.is_empty() {
        return Err(IngestError::EmptyBody);
    }
    if raw.len() > max_body_bytes {
        return Err(IngestError::PayloadTooLarge);
    }

    let value: serde_json::Value =
        serde_json::from_slice(raw).map_err(|_| IngestError::InvalidPayload)?;
    if !value.is_object() && !value.is_array() {
        return Err(IngestError::InvalidPayload);
    }

    let compact = serde_json::to_vec(&value).map_err(|_| IngestError::InvalidPayload)?;
    Ok(Bytes::from(compact))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MAX: usize = 1024;

    #[test]
    fn key_layout_is_namespace_day_digest() {
        let at = Utc.with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap();
        let key = StorageKey::derive("webhooks", at, b"{\"id\":42}");
        let parts: Vec<&str> = key.as_str().split('/').collect();
        assert_eq!(parts[0], "webhooks");
        assert_eq!(parts[1], "20260828");
        assert_eq!(parts[2].len(), 64 + ".json".len());
        assert!(parts[2].ends_with(".json"));
    }

    #[test]
    fn identical_bodies_derive_identical_keys() {
        let at = Utc.with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap();
        let a = StorageKey::derive("webhooks", at, b"{\"id\":42}");
        let b = StorageKey::derive("webhooks", at, b"{\"id\":42}");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_bodies_derive_distinct_keys() {
        let at = Utc.with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap();
        let a = StorageKey::derive("webhooks", at, b"{\"id\":42}");
        let b = StorageKey::derive("webhooks", at, b"{\"id\":43}");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_body_is_rejected() {
        assert!(matches!(
            normalize_payload(b"", MAX),
            Err(IngestError::EmptyBody)
        ));
    }

    #[test]
    fn non_json_body_is_rejected() {
        assert!(matches!(
            normalize_payload(b"not json", MAX),
            Err(IngestError::InvalidPayload)
        ));
    }

    #[test]
    fn scalar_json_is_rejected() {
        assert!(matches!(
            normalize_payload(b"42", MAX),
            Err(IngestError::InvalidPayload)
        ));
        assert!(matches!(
            normalize_payload(b"\"hello\"", MAX),
            Err(IngestError::InvalidPayload)
        ));
    }

    #[test]
    fn oversized_body_is_rejected() {
        let big = format!("{{\"pad\":\"{}\"}}", "x".repeat(MAX));
        assert!(matches!(
            normalize_payload(big.as_bytes(), MAX),
            Err(IngestError::PayloadTooLarge)
        ));
    }

    #[test]
    fn normalization_strips_sender_whitespace() {
        let spaced = normalize_payload(b"{ \"event\": \"issue.created\",  \"id\": 42 }", MAX)
            .expect("valid");
        let compact = normalize_payload(b"{\"event\":\"issue.created\",\"id\":42}", MAX)
            .expect("valid");
        assert_eq!(spaced, compact);
    }

    #[test]
    fn ingest_builds_a_key_under_the_namespace() {
        let event = WebhookEvent::ingest("backlog", None, b"{\"id\":1}", MAX).expect("valid");
        assert!(event.key.as_str().starts_with("backlog/"));
        assert_eq!(&event.body[..], b"{\"id\":1}");
    }
}
