//! PKCE proof material and anti-forgery state tokens.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Smallest byte count whose base64url encoding reaches RFC 7636's 43-character minimum.
pub const MIN_VERIFIER_BYTES: usize = 32;
/// Largest byte count whose base64url encoding stays within RFC 7636's 128-character maximum.
pub const MAX_VERIFIER_BYTES: usize = 96;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Verifier and its derived challenge; the verifier never leaves this process except in the
/// token exchange.
#[derive(Clone)]
pub struct PkcePair {
	verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	/// Draws a fresh verifier from `verifier_bytes` random bytes (clamped to the RFC window).
	pub fn generate(verifier_bytes: usize) -> Result<Self> {
		let verifier =
			new_verifier(verifier_bytes.clamp(MIN_VERIFIER_BYTES, MAX_VERIFIER_BYTES))?;
		let challenge = challenge(&verifier);

		Ok(Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 })
	}

	/// Secret verifier sent with the code exchange.
	pub fn verifier(&self) -> &str {
		&self.verifier
	}

	/// Challenge sent in the authorization URL.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}

	/// Challenge method (always `S256`).
	pub fn method(&self) -> PkceCodeChallengeMethod {
		self.method
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair")
			.field("verifier", &"<redacted>")
			.field("challenge", &self.challenge)
			.field("method", &self.method)
			.finish()
	}
}

/// Returns a base64url (no padding) string built from `min_len` OS-random bytes.
///
/// The encoding is never truncated, so the result is always at least `min_len` characters.
pub fn new_verifier(min_len: usize) -> Result<String> {
	random_token(min_len)
}

/// Derives the S256 challenge: base64url (no padding) of the SHA-256 digest. Always 43
/// characters.
pub fn challenge(verifier: &str) -> String {
	let digest = Sha256::digest(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(digest)
}

/// Returns an anti-forgery state token drawn independently from any verifier.
pub fn new_state(bytes: usize) -> Result<String> {
	random_token(bytes.max(1))
}

fn random_token(bytes: usize) -> Result<String> {
	let mut buf = vec![0_u8; bytes];

	OsRng.try_fill_bytes(&mut buf).map_err(|e| Error::Entropy { source: Box::new(e) })?;

	Ok(URL_SAFE_NO_PAD.encode(buf))
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashSet;
	// self
	use super::*;

	#[test]
	fn verifier_length_follows_byte_count() {
		let verifier = new_verifier(64).expect("OS RNG should be available in tests.");

		assert_eq!(verifier.len(), 86);
		assert!(
			verifier.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
			"Verifier must only use the base64url alphabet."
		);
	}

	#[test]
	fn challenge_is_always_43_chars() {
		for len in [1, 43, 64, 86, 128, 500] {
			assert_eq!(challenge(&"v".repeat(len)).len(), 43, "Length {len} broke the invariant.");
		}
	}

	#[test]
	fn challenge_is_deterministic_and_matches_rfc_vector() {
		let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

		assert_eq!(challenge(verifier), challenge(verifier));
		assert_eq!(challenge(verifier), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
	}

	#[test]
	fn state_never_repeats_a_verifier() {
		let mut seen = HashSet::new();

		for _ in 0..256 {
			let verifier = new_verifier(64).expect("OS RNG should be available in tests.");
			let state = new_state(32).expect("OS RNG should be available in tests.");

			assert_ne!(state, verifier);
			assert!(seen.insert(state), "State tokens must not repeat.");
		}
	}

	#[test]
	fn pairs_clamp_into_rfc_window_and_redact() {
		let short = PkcePair::generate(1).expect("OS RNG should be available in tests.");
		let long = PkcePair::generate(1024).expect("OS RNG should be available in tests.");

		assert_eq!(short.verifier().len(), 43);
		assert_eq!(long.verifier().len(), 128);
		assert_eq!(short.challenge(), challenge(short.verifier()));
		assert_eq!(short.method().as_str(), "S256");
		assert!(!format!("{short:?}").contains(short.verifier()));
	}
}
