//! URL-safe base64 with stripped padding, matching the wire format used by
//! the JWT segments and the `Identity` header token.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::Error;

/// Encodes bytes using the URL-safe alphabet with no padding. Total function.
pub fn encode(data: &[u8]) -> String {
	URL_SAFE_NO_PAD.encode(data)
}

/// Decodes a base64url string, re-padding to a multiple of four first.
/// Fails on non-alphabet characters or a length that is `1 mod 4`.
pub fn decode(input: &str) -> Result<Vec<u8>, Error> {
	if input.len() % 4 == 1 {
		return Err(Error::Generic("invalid base64url length".to_string()));
	}
	let padded = repad(input);
	base64::engine::general_purpose::URL_SAFE
		.decode(padded)
		.map_err(|e| Error::Generic(format!("invalid base64url input: {e}")))
}

fn repad(input: &str) -> String {
	let rem = input.len() % 4;
	if rem == 0 {
		return input.to_string();
	}
	let mut out = String::with_capacity(input.len() + 4 - rem);
	out.push_str(input);
	for _ in 0..(4 - rem) {
		out.push('=');
	}
	out
}
