//! `v2.local` token maker using XChaCha20-Poly1305.
//!
//! # Wire Format
//!
//! ```text
//! v2.local.<base64url(nonce[24] || ciphertext || tag[16])>
//! ```
//!
//! The JSON-encoded [`TokenPayload`] is sealed with the symmetric key. The
//! header and nonce are bound as associated data using PASETO's
//! pre-authentication encoding, so any modified byte fails authentication.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use chrono::Duration;

use super::{TokenError, TokenMaker, TokenPayload};

/// Required key length in bytes.
pub const SYMMETRIC_KEY_SIZE: usize = 32;

const HEADER: &str = "v2.local.";
const NONCE_SIZE: usize = 24;
const TAG_SIZE: usize = 16;

/// Symmetric token maker.
///
/// Holds only the immutable cipher state; share it behind an `Arc`.
pub struct PasetoMaker {
    cipher: XChaCha20Poly1305,
}

impl PasetoMaker {
    /// Creates a maker from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKeySize`] unless the key is exactly
    /// [`SYMMETRIC_KEY_SIZE`] bytes.
    pub fn new(key: &[u8]) -> Result<Self, TokenError> {
        if key.len() != SYMMETRIC_KEY_SIZE {
            return Err(TokenError::InvalidKeySize {
                expected: SYMMETRIC_KEY_SIZE,
                actual: key.len(),
            });
        }

        let cipher = XChaCha20Poly1305::new_from_slice(key).map_err(|_| {
            TokenError::InvalidKeySize {
                expected: SYMMETRIC_KEY_SIZE,
                actual: key.len(),
            }
        })?;

        Ok(Self { cipher })
    }
}

impl TokenMaker for PasetoMaker {
    fn create_token(
        &self,
        username: &str,
        duration: Duration,
    ) -> Result<(String, TokenPayload), TokenError> {
        let payload = TokenPayload::new(username, duration)?;
        let message =
            serde_json::to_vec(&payload).map_err(|e| TokenError::Encoding(e.to_string()))?;

        let mut nonce = [0u8; NONCE_SIZE];
        getrandom::fill(&mut nonce).map_err(|e| TokenError::Encoding(e.to_string()))?;

        let aad = pre_auth_encode(&[HEADER.as_bytes(), &nonce, b""]);
        let sealed = self
            .cipher
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: &message,
                    aad: &aad,
                },
            )
            .map_err(|_| TokenError::Encoding("encryption failed".to_string()))?;

        let mut body = Vec::with_capacity(NONCE_SIZE + sealed.len());
        body.extend_from_slice(&nonce);
        body.extend_from_slice(&sealed);

        let token = format!("{HEADER}{}", URL_SAFE_NO_PAD.encode(body));

        Ok((token, payload))
    }

    fn verify_token(&self, token: &str) -> Result<TokenPayload, TokenError> {
        let encoded = token
            .strip_prefix(HEADER)
            .ok_or(TokenError::InvalidToken)?;

        // Footers are never issued.
        if encoded.contains('.') {
            return Err(TokenError::InvalidToken);
        }

        let body = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| TokenError::InvalidToken)?;

        if body.len() < NONCE_SIZE + TAG_SIZE {
            return Err(TokenError::InvalidToken);
        }

        let (nonce, sealed) = body.split_at(NONCE_SIZE);
        let aad = pre_auth_encode(&[HEADER.as_bytes(), nonce, b""]);

        let message = self
            .cipher
            .decrypt(
                XNonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: &aad,
                },
            )
            .map_err(|_| TokenError::InvalidToken)?;

        let payload: TokenPayload =
            serde_json::from_slice(&message).map_err(|_| TokenError::InvalidToken)?;

        payload.valid()?;

        Ok(payload)
    }
}

/// PASETO pre-authentication encoding: piece count, then each piece
/// prefixed by its length, all lengths as little-endian u64 with the top bit
/// cleared.
fn pre_auth_encode(pieces: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + pieces.iter().map(|p| 8 + p.len()).sum::<usize>());
    out.extend_from_slice(&le64(pieces.len()));
    for piece in pieces {
        out.extend_from_slice(&le64(piece.len()));
        out.extend_from_slice(piece);
    }
    out
}

fn le64(n: usize) -> [u8; 8] {
    ((n as u64) & (u64::MAX >> 1)).to_le_bytes()
}
