//! RSA-PSS request signing for the exchange REST API (§6: "Authentication
//! is signed with a private key").
//!
//! Signature format: `RSA-PSS(SHA256, timestamp + method + path)` → base64.
//! The `path` must NOT include query parameters.

use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::pss::{BlindedSigningKey, Signature};
use rsa::sha2::Sha256;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::RsaPrivateKey;

use domain::Error;

/// Holds API credentials and the parsed RSA private key.
#[derive(Clone)]
pub struct ExchangeAuth {
    pub api_key_id: String,
    signing_key: BlindedSigningKey<Sha256>,
}

impl std::fmt::Debug for ExchangeAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeAuth")
            .field("api_key_id", &self.api_key_id)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

impl ExchangeAuth {
    /// Create from raw API key id and PEM-encoded private key string.
    ///
    /// The PEM string may contain literal `\n` (two chars) instead of real
    /// newlines — both forms are normalized.
    pub fn new(api_key_id: &str, pem_string: &str) -> Result<Self, Error> {
        let pem = pem_string.replace("\\n", "\n");
        let pem = pem.trim();

        let private_key = RsaPrivateKey::from_pkcs1_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
            .map_err(|e| Error::AuthError(format!("failed to parse RSA private key: {e}")))?;

        let signing_key = BlindedSigningKey::<Sha256>::new(private_key);

        Ok(Self {
            api_key_id: api_key_id.to_string(),
            signing_key,
        })
    }

    /// Sign a request, returning `(timestamp_ms_string, base64_signature)`.
    /// The message to sign is `{timestamp}{METHOD}{path_without_query}`.
    pub fn sign_request(&self, method: &str, path: &str) -> (String, String) {
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let path_clean = path.split('?').next().unwrap_or(path);

        let message = format!("{timestamp}{method}{path_clean}");
        let mut rng = rand::thread_rng();
        let signature: Signature = self.signing_key.sign_with_rng(&mut rng, message.as_bytes());

        let sig_b64 = base64::engine::general_purpose::STANDARD.encode(signature.to_bytes());

        (timestamp, sig_b64)
    }

    /// Build an authenticated `reqwest::header::HeaderMap`.
    pub fn headers(&self, method: &str, path: &str) -> reqwest::header::HeaderMap {
        let (timestamp, signature) = self.sign_request(method, path);

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "ACCESS-KEY",
            self.api_key_id.parse().expect("invalid api key header"),
        );
        headers.insert(
            "ACCESS-TIMESTAMP",
            timestamp.parse().expect("invalid timestamp header"),
        );
        headers.insert(
            "ACCESS-SIGNATURE",
            signature.parse().expect("invalid signature header"),
        );
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_request_produces_rsa2048_pss_signature() {
        let private_key =
            RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("keygen failed");
        let pem = rsa::pkcs1::EncodeRsaPrivateKey::to_pkcs1_pem(&private_key, rsa::pkcs1::LineEnding::LF)
            .expect("pem encode failed");

        let auth = ExchangeAuth::new("test-key-id", pem.as_ref()).expect("auth init failed");
        let (ts, sig) = auth.sign_request("GET", "/trade-api/v2/portfolio/balance?foo=bar");

        assert!(ts.parse::<i64>().is_ok());
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&sig)
            .expect("signature should be valid base64");
        assert_eq!(decoded.len(), 256);
    }

    #[test]
    fn sign_strips_query_params() {
        let private_key =
            RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("keygen failed");
        let pem = rsa::pkcs1::EncodeRsaPrivateKey::to_pkcs1_pem(&private_key, rsa::pkcs1::LineEnding::LF)
            .expect("pem encode failed");

        let auth = ExchangeAuth::new("test-key-id", pem.as_ref()).expect("auth init failed");
        let (_, sig1) = auth.sign_request("GET", "/trade-api/v2/portfolio/orders");
        let (_, sig2) = auth.sign_request("GET", "/trade-api/v2/portfolio/orders?limit=5");

        let d1 = base64::engine::general_purpose::STANDARD.decode(&sig1).unwrap();
        let d2 = base64::engine::general_purpose::STANDARD.decode(&sig2).unwrap();
        assert_eq!(d1.len(), 256);
        assert_eq!(d2.len(), 256);
    }
}
