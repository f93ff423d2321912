use axum::http::HeaderMap;
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

/// Maximum clock skew accepted between the sender and this server.
pub const TOLERANCE_SECS: i64 = 5 * 60;

const SECRET_PREFIX: &str = "whsec_";

#[derive(Debug, Clone, Copy)]
pub struct WebhookHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

impl<'a> WebhookHeaders<'a> {
    pub fn from_headers(headers: &'a HeaderMap) -> Result<Self> {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
        };

        match (get(HEADER_ID), get(HEADER_TIMESTAMP), get(HEADER_SIGNATURE)) {
            (Some(id), Some(timestamp), Some(signature)) => Ok(Self {
                id,
                timestamp,
                signature,
            }),
            _ => Err(AppError::Webhook(
                "Error occurred -- no svix headers".to_string(),
            )),
        }
    }
}

pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Result<Self> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let key = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid webhook secret: {}", e)))?;

        Ok(Self { key })
    }

    pub fn verify(&self, headers: &WebhookHeaders<'_>, body: &[u8]) -> Result<()> {
        self.verify_at(headers, body, Utc::now().timestamp())
    }

    pub fn verify_at(&self, headers: &WebhookHeaders<'_>, body: &[u8], now: i64) -> Result<()> {
        let rejected = || AppError::Webhook("Error occurred".to_string());

        let timestamp: i64 = headers.timestamp.trim().parse().map_err(|_| rejected())?;
        if now.abs_diff(timestamp) > TOLERANCE_SECS as u64 {
            tracing::warn!(webhook_id = headers.id, timestamp, "Webhook timestamp outside tolerance");
            return Err(rejected());
        }

        let mac = self.mac(headers.id, headers.timestamp, body)?;

        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == "v1")
            .filter_map(|(_, signature)| general_purpose::STANDARD.decode(signature).ok())
            .any(|signature| mac.clone().verify_slice(&signature).is_ok());

        if matched {
            Ok(())
        } else {
            tracing::warn!(webhook_id = headers.id, "Webhook signature mismatch");
            Err(rejected())
        }
    }

    pub fn sign(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<String> {
        let tag = self.mac(id, timestamp, body)?.finalize().into_bytes();
        Ok(format!("v1,{}", general_purpose::STANDARD.encode(tag)))
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid webhook key: {}", e)))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";
    const NOW: i64 = 1_700_000_000;

    fn headers<'a>(timestamp: &'a str, signature: &'a str) -> WebhookHeaders<'a> {
        WebhookHeaders {
            id: "msg_p5jXN8AQM9LWM0D4loKWxJek",
            timestamp,
            signature,
        }
    }

    #[test]
    fn test_signed_payload_verifies() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let body = br#"{"type":"user.created"}"#;
        let timestamp = NOW.to_string();
        let signature = verifier.sign("msg_p5jXN8AQM9LWM0D4loKWxJek", &timestamp, body).unwrap();

        assert!(verifier.verify_at(&headers(&timestamp, &signature), body, NOW).is_ok());
    }

    #[test]
    fn test_any_of_several_signatures_accepted() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let body = b"{}";
        let timestamp = NOW.to_string();
        let valid = verifier.sign("msg_p5jXN8AQM9LWM0D4loKWxJek", &timestamp, body).unwrap();
        let combined = format!("v1,c29tZXRoaW5nIGVsc2U= {}", valid);

        assert!(verifier.verify_at(&headers(&timestamp, &combined), body, NOW).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let timestamp = NOW.to_string();
        let signature = verifier.sign("msg_p5jXN8AQM9LWM0D4loKWxJek", &timestamp, b"original").unwrap();

        let result = verifier.verify_at(&headers(&timestamp, &signature), b"tampered", NOW);
        assert!(matches!(result, Err(AppError::Webhook(_))));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let stale = (NOW - TOLERANCE_SECS - 1).to_string();
        let signature = verifier.sign("msg_p5jXN8AQM9LWM0D4loKWxJek", &stale, b"{}").unwrap();

        assert!(verifier.verify_at(&headers(&stale, &signature), b"{}", NOW).is_err());
    }

    #[test]
    fn test_missing_headers_rejected() {
        let mut map = HeaderMap::new();
        map.insert(HEADER_ID, "msg_1".parse().unwrap());

        let err = WebhookHeaders::from_headers(&map).unwrap_err();
        assert!(matches!(err, AppError::Webhook(ref msg) if msg == "Error occurred -- no svix headers"));
    }
}
