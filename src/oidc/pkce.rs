//! PKCE S256 challenge generation (RFC 7636)
//!
//! A fresh [`Pkce`] is generated per authorization attempt:
//!
//! 1. The client generates a high-entropy random `code_verifier`.
//! 2. It computes a SHA-256 hash of the verifier and base64url-encodes it
//!    to produce the `code_challenge`.
//! 3. The authorization request carries `code_challenge` and
//!    `code_challenge_method=S256`, plus a random `state` nonce.
//! 4. The token exchange later presents the original `code_verifier`,
//!    proving possession.
//!
//! References: RFC 7636 <https://www.rfc-editor.org/rfc/rfc7636>.

use base64::Engine as _;
use sha2::{Digest, Sha256};

/// A PKCE S256 parameter set: state nonce, verifier, and derived challenge.
///
/// # Examples
///
/// ```
/// use authflow::oidc::Pkce;
///
/// let pkce = Pkce::generate();
/// assert_eq!(pkce.code_challenge_method, "S256");
/// assert_eq!(pkce.code_verifier.len(), 43);
/// ```
#[derive(Debug, Clone)]
pub struct Pkce {
    /// Random state nonce echoed back in the redirect; 16 random bytes,
    /// base64url without padding.
    pub state: String,

    /// The code verifier: 32 random bytes base64url-encoded without
    /// padding, exactly 43 characters.  Presented at token exchange.
    pub code_verifier: String,

    /// The code challenge: base64url-encoded (no padding) SHA-256 digest of
    /// the verifier's UTF-8 bytes (RFC 7636 section 4.2).
    pub code_challenge: String,

    /// Always `"S256"`.
    pub code_challenge_method: String,
}

impl Pkce {
    /// Generates a fresh parameter set.
    ///
    /// Infallible: the operating system's random number generator does not
    /// fail on supported platforms.
    pub fn generate() -> Self {
        use rand::RngCore as _;

        let mut state_bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut state_bytes);
        let state = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(state_bytes);

        let mut verifier_bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut verifier_bytes);
        let code_verifier =
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(verifier_bytes);

        let digest = Sha256::digest(code_verifier.as_bytes());
        let code_challenge =
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice());

        Self {
            state,
            code_verifier,
            code_challenge,
            code_challenge_method: "S256".to_string(),
        }
    }
}
