use axum::http::HeaderMap;
use sha2::{Digest, Sha256, digest::Output};
use subtle::ConstantTimeEq;
use vigil_core::config::{API_KEY_HEADER, AuthConfig};

/// Shared-secret check guarding the query endpoints.
///
/// Both sides are trimmed, then compared as SHA-256 digests with a
/// constant-time equality. The comparison therefore always touches the same
/// 32 bytes regardless of key length or where the first mismatch is.
///
/// With no configured key the gate accepts [`vigil_core::config::DEFAULT_API_KEY`].
/// That fallback is only defense-in-depth for a single-tenant deployment on a
/// trusted network; anything exposed needs a generated secret.
#[derive(Clone)]
pub struct AccessGate {
    expected: Output<Sha256>,
}

impl AccessGate {
    pub fn new(expected_key: &str) -> Self {
        Self {
            expected: digest(expected_key),
        }
    }

    pub fn from_config(auth: &AuthConfig) -> Self {
        Self::new(auth.effective_key())
    }

    /// Case-sensitive, exact comparison after trimming.
    pub fn authorize(&self, presented_key: &str) -> bool {
        let presented = digest(presented_key);
        presented.as_slice().ct_eq(self.expected.as_slice()).into()
    }

    /// Check the `X-Traffic-Key` header. Missing and non-UTF-8 values are
    /// treated as the empty string.
    pub fn authorize_headers(&self, headers: &HeaderMap) -> bool {
        let presented = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        self.authorize(presented)
    }
}

fn digest(key: &str) -> Output<Sha256> {
    Sha256::digest(key.trim().as_bytes())
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate").finish_non_exhaustive()
    }
}
