//! JWT header/payload shapes, the compact `h.p.s` codec, and ES256 sign/
//! verify over raw `R||S` signatures.
//!
//! Grounded on `examples/original_source/secsipid/secsipid.go`'s
//! `SJWTHeader`/`SJWTPayload`/`SJWTEncode`/`SJWTDecodeWithPubKey`/
//! `SJWTSignWithPrvKey`/`SJWTVerifyWithPubKey`, and on the teacher's
//! `http/jwt.rs` for the claims-shape/error-enum idiom — though the actual
//! codec here is hand-rolled over `p256`/`ecdsa` rather than `jsonwebtoken`
//! (see DESIGN.md, dependency substitution #1) because the `ppt` claim and
//! the raw-signature wire format aren't expressible through that crate's
//! fixed `Header`.

use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::NistP256;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::base64url;
use crate::error::Error;

const KEY_SIZE_BYTES: usize = 32;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
	pub alg: String,
	pub ppt: String,
	pub typ: String,
	pub x5u: String,
}

impl Header {
	pub fn shaken(x5u: impl Into<String>) -> Self {
		Self {
			alg: "ES256".to_string(),
			ppt: "shaken".to_string(),
			typ: "passport".to_string(),
			x5u: x5u.into(),
		}
	}
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dest {
	pub tn: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Orig {
	pub tn: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payload {
	pub attest: String,
	pub dest: Dest,
	pub iat: i64,
	pub orig: Orig,
	pub origid: String,
}

/// The decoded, base64url-encoded header/payload segments plus the decoded
/// payload value, returned once a token has cleared expiry and signature
/// checks.
#[derive(Clone, Debug)]
pub struct Decoded {
	pub payload: Payload,
	pub header_b64: String,
	pub payload_b64: String,
}

/// Encodes header and payload, signs with ES256, and returns the compact
/// `h.p.s` token.
pub fn encode(header: &Header, payload: &Payload, key: &SigningKey<NistP256>) -> Result<String, Error> {
	let header_json = serde_json::to_vec(header).map_err(|e| Error::Generic(e.to_string()))?;
	let payload_json = serde_json::to_vec(payload).map_err(|e| Error::Generic(e.to_string()))?;
	let header_b64 = base64url::encode(&header_json);
	let payload_b64 = base64url::encode(&payload_json);
	let signing_input = format!("{header_b64}.{payload_b64}");
	let signature_b64 = sign(&signing_input, key)?;
	Ok(format!("{signing_input}.{signature_b64}"))
}

/// Signs `signing_input` (the literal `h64.p64` bytes) with ES256, returning
/// the base64url-encoded raw `R||S` signature. `ecdsa::Signature`'s fixed-
/// width encoding is already the concatenated, zero-padded `r || s` form
/// spec.md §3/§6 require — no DER re-framing needed.
pub fn sign(signing_input: &str, key: &SigningKey<NistP256>) -> Result<String, Error> {
	let digest = Sha256::digest(signing_input.as_bytes());
	let signature: Signature = key
		.sign_prehash(&digest)
		.map_err(|_| Error::JSONSignatureFailure)?;
	debug_assert_eq!(signature.to_bytes().len(), 2 * KEY_SIZE_BYTES);
	Ok(base64url::encode(&signature.to_bytes()))
}

/// Verifies the base64url `signature` over `signing_input` against `key`,
/// requiring an exact 64-byte raw `R||S` signature.
pub fn verify_signature(
	signing_input: &str,
	signature_b64: &str,
	key: &VerifyingKey<NistP256>,
) -> Result<(), Error> {
	let sig_bytes = base64url::decode(signature_b64).map_err(|_| Error::JSONSignatureSize)?;
	if sig_bytes.len() != 2 * KEY_SIZE_BYTES {
		return Err(Error::JSONSignatureSize);
	}
	let signature = Signature::from_slice(&sig_bytes).map_err(|_| Error::JSONSignatureSize)?;
	let digest = Sha256::digest(signing_input.as_bytes());
	key.verify_prehash(&digest, &signature)
		.map_err(|_| Error::JSONSignatureInvalid)
}

/// Splits a token into its three segments, requiring exactly three.
pub fn split_segments(token: &str) -> Result<(&str, &str, &str), Error> {
	let mut parts = token.trim().splitn(3, '.');
	let (Some(h), Some(p), Some(s)) = (parts.next(), parts.next(), parts.next()) else {
		return Err(Error::SIPHdrParse);
	};
	if parts.next().is_some() {
		return Err(Error::SIPHdrParse);
	}
	// splitn already caps at 3, so a 4th segment would have landed inside `s`
	// via the final catch-all; reject it by checking for a stray `.` there.
	if s.contains('.') {
		return Err(Error::SIPHdrParse);
	}
	Ok((h, p, s))
}

/// Decodes and validates the payload segment: non-empty, valid base64url +
/// JSON, and `now <= iat + expire_secs` (spec.md §3, §8: strict `>` rejects,
/// matching the reference implementation).
pub fn decode_payload(payload_b64: &str, expire_secs: i64, now_unix: i64) -> Result<Payload, Error> {
	if payload_b64.is_empty() {
		return Err(Error::JSONPayloadParse("empty payload".to_string()));
	}
	let bytes = base64url::decode(payload_b64)
		.map_err(|e| Error::JSONPayloadParse(format!("invalid payload: {e}")))?;
	let payload: Payload =
		serde_json::from_slice(&bytes).map_err(|e| Error::JSONPayloadParse(e.to_string()))?;
	if payload.iat == 0 || now_unix > payload.iat + expire_secs {
		return Err(Error::JSONPayloadIATExpired);
	}
	Ok(payload)
}

/// Decodes the header segment for the post-signature attribute check
/// (spec.md §4.8): `alg`/`ppt`/`typ`/`x5u` when present must match the
/// fixed SHAKEN profile values, and `x5u` must equal the outer `info`
/// parameter.
pub fn decode_header(header_b64: &str) -> Result<Header, Error> {
	let bytes =
		base64url::decode(header_b64).map_err(|e| Error::JSONHdrParse(e.to_string()))?;
	serde_json::from_slice(&bytes).map_err(|e| Error::JSONHdrParse(e.to_string()))
}

/// Checks decoded header attributes against the identity header's `info`
/// parameter, matching `SJWTCheckAttributes`.
pub fn check_header_attributes(header: &Header, info: &str) -> Result<(), Error> {
	if !header.alg.is_empty() && header.alg != "ES256" {
		return Err(Error::JSONHdrAlg);
	}
	if !header.ppt.is_empty() && header.ppt != "shaken" {
		return Err(Error::JSONHdrPpt);
	}
	if !header.typ.is_empty() && header.typ != "passport" {
		return Err(Error::JSONHdrTyp);
	}
	if !header.x5u.is_empty() && header.x5u != info {
		return Err(Error::JSONHdrX5u);
	}
	Ok(())
}
