//! Signing pipeline, grounded on
//! `examples/original_source/secsipid/secsipid.go`'s
//! `SJWTGetIdentityPrvKey`/`SJWTGetIdentity`.

use crate::error::Error;
use crate::jwt::{self, Dest, Header, Orig, Payload};
use crate::keys;
use crate::options;

/// Builds and signs a SHAKEN identity token from an origin/destination TN
/// pair, attestation level, and EC private key, returning the full
/// `Identity` header value (`token;info=<x5u>;alg=ES256;ppt=shaken`).
///
/// `origid`, if `None`, is generated as a UUIDv4. `x5u`, if `None`, falls
/// back to the configured default (`options::snapshot().x5u`).
pub fn get_identity(
	orig_tn: &str,
	dest_tn: &str,
	attest: &str,
	origid: Option<&str>,
	x5u: Option<&str>,
	now_unix: i64,
	private_key_pem: &[u8],
) -> Result<String, Error> {
	let signing_key = keys::parse_ec_private_key(private_key_pem)?;

	let x5u = match x5u {
		Some(x5u) if !x5u.is_empty() => x5u.to_string(),
		_ => options::snapshot().x5u,
	};
	let origid = match origid {
		Some(id) if !id.is_empty() => id.to_string(),
		_ => uuid::Uuid::new_v4().to_string(),
	};

	let header = Header::shaken(x5u.clone());
	let payload = Payload {
		attest: attest.to_string(),
		dest: Dest {
			tn: vec![dest_tn.to_string()],
		},
		iat: now_unix,
		orig: Orig {
			tn: orig_tn.to_string(),
		},
		origid,
	};

	let token = jwt::encode(&header, &payload, &signing_key)?;
	if token.is_empty() {
		return Err(Error::SIPHdrEmpty);
	}
	Ok(format!("{token};info=<{x5u}>;alg=ES256;ppt=shaken"))
}

/// As [`get_identity`], reading the private key from a file path rather than
/// taking PEM bytes directly.
pub fn get_identity_from_key_file(
	orig_tn: &str,
	dest_tn: &str,
	attest: &str,
	origid: Option<&str>,
	x5u: Option<&str>,
	now_unix: i64,
	private_key_path: &str,
) -> Result<String, Error> {
	let pem = std::fs::read(private_key_path).map_err(|e| Error::FileRead(e.to_string()))?;
	get_identity(orig_tn, dest_tn, attest, origid, x5u, now_unix, &pem)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::jwt::split_segments;
	use p256::pkcs8::EncodePrivateKey;

	fn test_key_pem() -> Vec<u8> {
		let secret = p256::SecretKey::random(&mut rand_core::OsRng);
		secret
			.to_pkcs8_pem(p256::pkcs8::LineEnding::LF)
			.unwrap()
			.as_bytes()
			.to_vec()
	}

	#[test]
	fn builds_identity_header_with_explicit_origid_and_x5u() {
		let pem = test_key_pem();
		let identity = get_identity(
			"+12025551000",
			"+13035551000",
			"A",
			Some("00000000-0000-0000-0000-000000000001"),
			Some("https://example.com/c.pem"),
			1_700_000_000,
			&pem,
		)
		.unwrap();

		assert!(identity.ends_with(";info=<https://example.com/c.pem>;alg=ES256;ppt=shaken"));
		let token = identity.split(';').next().unwrap();
		let (h, p, _s) = split_segments(token).unwrap();
		let header = jwt::decode_header(h).unwrap();
		assert_eq!(header.x5u, "https://example.com/c.pem");
		let payload = jwt::decode_payload(p, 60, 1_700_000_030).unwrap();
		assert_eq!(payload.origid, "00000000-0000-0000-0000-000000000001");
		assert_eq!(payload.orig.tn, "+12025551000");
		assert_eq!(payload.dest.tn, vec!["+13035551000".to_string()]);
	}

	#[test]
	fn generates_origid_when_not_supplied() {
		let pem = test_key_pem();
		let identity = get_identity(
			"+12025551000",
			"+13035551000",
			"A",
			None,
			Some("https://example.com/c.pem"),
			1_700_000_000,
			&pem,
		)
		.unwrap();
		let token = identity.split(';').next().unwrap();
		let (_h, p, _s) = split_segments(token).unwrap();
		let payload = jwt::decode_payload(p, 60, 1_700_000_030).unwrap();
		assert!(uuid::Uuid::parse_str(&payload.origid).is_ok());
	}

	#[test]
	fn rejects_invalid_private_key() {
		let err = get_identity(
			"+1",
			"+2",
			"A",
			None,
			Some("https://example.com/c.pem"),
			1_700_000_000,
			b"not a key",
		)
		.unwrap_err();
		assert_eq!(err.code(), -152);
	}
}
