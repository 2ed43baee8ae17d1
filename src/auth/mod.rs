//! Identity Auth Middleware: resolves the caller's DID and checks it
//! against the local [`EncoderRegistry`]. The only authorization check in
//! the Aid plane; no signature is verified.

use axum::http::HeaderMap;
use tracing::warn;

use crate::dispatch::DispatchError;
use crate::domain::Encoder;
use crate::store::EncoderRegistry;

pub const ENCODER_DID_HEADER: &str = "x-encoder-did";

/// Resolve the presented DID. The header is authoritative when present;
/// the `encoder_did` request-body field is accepted only as a legacy
/// fallback (see DESIGN.md for the header-vs-body precedence decision).
pub fn resolve_did(headers: &HeaderMap, legacy_body_did: Option<&str>) -> Option<String> {
    headers
        .get(ENCODER_DID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            legacy_body_did
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        })
}

/// Resolve and authorize in one step. Returns the active encoder record on
/// success; the specific rejection otherwise.
pub async fn authorize(
    registry: &EncoderRegistry,
    headers: &HeaderMap,
    legacy_body_did: Option<&str>,
) -> Result<Encoder, DispatchError> {
    let did = resolve_did(headers, legacy_body_did)
        .ok_or_else(|| DispatchError::InvalidRequest("missing encoder DID".into()))?;

    match registry.get(&did).await? {
        None => {
            warn!(did, "encoder not registered");
            Err(DispatchError::EncoderNotAuthorized(did))
        }
        Some(encoder) if !encoder.is_active => {
            warn!(did, "encoder registered but inactive");
            Err(DispatchError::EncoderInactive(did))
        }
        Some(encoder) => Ok(encoder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use tempfile::TempDir;

    fn registry() -> (EncoderRegistry, TempDir) {
        let dir = TempDir::new().unwrap();
        (EncoderRegistry::open(dir.path().join("encoders")).unwrap(), dir)
    }

    #[test]
    fn header_takes_priority_over_legacy_body_field() {
        let mut headers = HeaderMap::new();
        headers.insert(ENCODER_DID_HEADER, HeaderValue::from_static("did:example:header"));

        let resolved = resolve_did(&headers, Some("did:example:body"));
        assert_eq!(resolved.as_deref(), Some("did:example:header"));
    }

    #[test]
    fn falls_back_to_legacy_body_field() {
        let headers = HeaderMap::new();
        let resolved = resolve_did(&headers, Some("did:example:body"));
        assert_eq!(resolved.as_deref(), Some("did:example:body"));
    }

    #[tokio::test]
    async fn missing_did_is_invalid_request() {
        let (registry, _dir) = registry();
        let headers = HeaderMap::new();

        let result = authorize(&registry, &headers, None).await;
        assert!(matches!(result, Err(DispatchError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn unregistered_did_is_not_authorized() {
        let (registry, _dir) = registry();
        let mut headers = HeaderMap::new();
        headers.insert(ENCODER_DID_HEADER, HeaderValue::from_static("did:example:ghost"));

        let result = authorize(&registry, &headers, None).await;
        assert!(matches!(result, Err(DispatchError::EncoderNotAuthorized(_))));
    }

    #[tokio::test]
    async fn inactive_encoder_is_rejected() {
        let (registry, _dir) = registry();
        let mut encoder = Encoder::new("did:example:enc-a", "encoder-a", "alice");
        encoder.is_active = false;
        registry.upsert(encoder).await.unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(ENCODER_DID_HEADER, HeaderValue::from_static("did:example:enc-a"));

        let result = authorize(&registry, &headers, None).await;
        assert!(matches!(result, Err(DispatchError::EncoderInactive(_))));
    }
}
