//! The end-to-end verification pipeline (spec.md §4.9): parse the identity
//! header, resolve the signer's key bytes, validate the certificate per
//! policy, extract the EC public key, check payload expiry, verify the
//! ECDSA signature, and check header attributes against `info`.
//!
//! Grounded on `examples/original_source/secsipid/secsipid.go`'s
//! `SJWTCheckFullIdentity`/`SJWTCheckFullIdentityURL`/
//! `SJWTCheckFullIdentityPubKey`/`SJWTCheckIdentityPKMode`, and
//! `pubkey_verify.go`'s `SJWTPubKeyVerify`/`verifyCertsWithOptions`.

use std::time::Duration;

use tracing::{debug, warn};

use crate::cache;
use crate::cert::{self, Certs};
use crate::clock::Clock;
use crate::error::Error;
use crate::fetch::HttpFetcher;
use crate::identity;
use crate::jwt::{self, Payload};
use crate::keys;
use crate::options::{self, Options, VerifyPolicy};

/// Where to obtain the signer's public key / certificate bytes from.
pub enum KeySource<'a> {
	/// PEM bytes passed directly by the caller.
	Inline(&'a [u8]),
	/// An `http://`/`https://` URL, fetched via the URL cache + fetcher.
	Url(String),
	/// A `file://` URL or bare filesystem path.
	File(String),
}

impl<'a> KeySource<'a> {
	/// Builds a key source from an already-stripped `info` URL, choosing
	/// `File` for `file://` URLs or bare paths and `Url` otherwise —
	/// matching `SJWTCheckIdentityPKMode`'s three-way dispatch.
	pub fn from_info(info: &str) -> KeySource<'static> {
		if info.starts_with("http://") || info.starts_with("https://") {
			KeySource::Url(info.to_string())
		} else {
			KeySource::File(info.to_string())
		}
	}
}

/// Resolves key bytes for a [`KeySource`], using the process-wide cache and
/// options snapshot for the `Url` variant.
fn resolve_key_bytes(
	source: &KeySource,
	timeout: Duration,
	fetcher: &dyn HttpFetcher,
	clock: &dyn Clock,
	opts: &Options,
) -> Result<Vec<u8>, Error> {
	match source {
		KeySource::Inline(bytes) => Ok(bytes.to_vec()),
		KeySource::Url(url) => {
			if !(url.starts_with("http://") || url.starts_with("https://")) {
				return Err(Error::HTTPInvalidURL);
			}
			if let Some(cached) = cache::get(&opts.cache_dir_path, url, opts.cache_expires, clock) {
				debug!(url, "x5u cache hit");
				return Ok(cached);
			}
			let body = fetcher.get(url, timeout)?;
			cache::set(&opts.cache_dir_path, url, &body);
			Ok(body)
		}
		KeySource::File(path) => {
			let path = path.strip_prefix("file://").unwrap_or(path);
			std::fs::read(path).map_err(|e| Error::FileRead(e.to_string()))
		}
	}
}

/// Certificate validation stage (spec.md §4.3/§4.4). A whole-zero policy
/// skips this stage entirely — see DESIGN.md for why that reading, not
/// "bit 0 clear", is correct. Once any bit is set, the validity-window and
/// CRL checks are independently gated by their own bits, but the chain walk
/// always runs; bits 1-3 only decide what populates the root/intermediate
/// pools it walks against.
pub fn verify_certificate_policy(
	pubkey_or_cert_pem: &[u8],
	policy: VerifyPolicy,
	opts: &Options,
	clock: &dyn Clock,
) -> Result<(), Error> {
	if !policy.should_verify_at_all() {
		return Ok(());
	}

	let certs = Certs::from_pem(pubkey_or_cert_pem)?;

	if policy.should_verify_time() {
		certs.verify_time(clock)?;
	}

	// Chain validation runs unconditionally once any bit is set — bits 1/2/3
	// only decide what feeds the root/intermediate pools, not whether the
	// walk happens (`buildCAsWithOptions`/`certs.VerifyWithCAs` in
	// `pubkey_verify.go` are called unconditionally). With no root source
	// configured the pool is empty and the walk fails with "signed by
	// unknown authority", which is the intended behavior.
	let roots = cert::build_roots(
		policy.should_verify_system_ca(),
		if policy.should_verify_custom_ca() {
			&opts.cert_ca_file
		} else {
			""
		},
	)?;
	let intermediates = cert::build_intermediates(
		policy.should_verify_intermediate_ca(),
		&opts.cert_ca_inter,
		&certs,
	)?;
	certs.verify_chain(&roots, &intermediates)?;

	if policy.should_verify_crl() {
		if opts.cert_crl_file.is_empty() {
			return Err(Error::CertNoCRLFile);
		}
		let crl_bytes =
			std::fs::read(&opts.cert_crl_file).map_err(|_| Error::CertReadCRLFile)?;
		certs.verify_crl(&crl_bytes)?;
	}

	Ok(())
}

/// Extracts the EC public key to verify with: from a certificate bundle's
/// leaf if one parses, else from a bare SPKI public key PEM.
fn extract_verifying_key(pem: &[u8]) -> Result<p256::ecdsa::VerifyingKey, Error> {
	keys::parse_ec_public_key(pem)
}

/// Full verification pipeline (spec.md §4.9), steps 1-8 in order. Returns
/// the validated payload on success.
#[allow(clippy::too_many_arguments)]
pub fn full_verify(
	identity_value: &str,
	expire_secs: i64,
	key_source: KeySource,
	timeout: Duration,
	now_unix: i64,
	clock: &dyn Clock,
	fetcher: &dyn HttpFetcher,
) -> Result<Payload, Error> {
	// 1 + 2: parse identity header, validate alg/ppt/info when present.
	let (header, info) = identity::parse_with_required_info(identity_value)?;
	let (h64, p64, s64) = jwt::split_segments(&header.token)?;

	// 3: resolve key bytes.
	let opts = options::snapshot();
	let key_bytes = resolve_key_bytes(&key_source, timeout, fetcher, clock, &opts)?;

	// 4: validate certificate per policy (skipped entirely if policy == 0).
	verify_certificate_policy(&key_bytes, opts.cert_verify, &opts, clock)?;

	// 5: extract EC public key.
	let verifying_key = extract_verifying_key(&key_bytes)?;

	// 6: decode payload, check expiry.
	let payload = jwt::decode_payload(p64, expire_secs, now_unix)?;

	// 7: verify ECDSA signature over h.p.
	let signing_input = format!("{h64}.{p64}");
	jwt::verify_signature(&signing_input, s64, &verifying_key)?;

	// 8: check token header attributes against info.
	let token_header = jwt::decode_header(h64)?;
	jwt::check_header_attributes(&token_header, &info)?;

	Ok(payload)
}

/// As [`full_verify`], but extracts the key source from the identity
/// header's own `info` URL rather than taking an explicit [`KeySource`],
/// matching `SJWTCheckFullIdentityURL`.
pub fn full_verify_url(
	identity_value: &str,
	expire_secs: i64,
	timeout: Duration,
	now_unix: i64,
	clock: &dyn Clock,
	fetcher: &dyn HttpFetcher,
) -> Result<Payload, Error> {
	let (_, info) = identity::parse_with_required_info(identity_value)?;
	let source = KeySource::from_info(&info);
	full_verify(identity_value, expire_secs, source, timeout, now_unix, clock, fetcher)
}

/// Verifies against an inline public key / certificate PEM, matching
/// `SJWTCheckFullIdentityPubKey`: attribute checks only run if the header
/// actually carries parameters beyond the bare token.
pub fn full_verify_pubkey(
	identity_value: &str,
	expire_secs: i64,
	pubkey_pem: &[u8],
	now_unix: i64,
) -> Result<Payload, Error> {
	let cleaned: String = identity_value.chars().filter(|c| !c.is_whitespace()).collect();
	let mut parts = cleaned.splitn(2, ';');
	let token = parts.next().unwrap_or_default();
	let rest = parts.next();

	let (h64, p64, s64) = jwt::split_segments(token)?;
	let payload = jwt::decode_payload(p64, expire_secs, now_unix)?;

	let opts = options::snapshot();
	if !opts.cert_verify.should_verify_at_all() {
		warn!("certificate verification disabled by policy");
	} else {
		verify_certificate_policy(pubkey_pem, opts.cert_verify, &opts, &crate::clock::SystemClock)?;
	}
	let verifying_key = extract_verifying_key(pubkey_pem)?;
	jwt::verify_signature(&format!("{h64}.{p64}"), s64, &verifying_key)?;

	if let Some(rest) = rest {
		let full = format!("{token};{rest}");
		let (_, info) = identity::parse_with_required_info(&full)?;
		let token_header = jwt::decode_header(h64)?;
		jwt::check_header_attributes(&token_header, &info)?;
	}

	Ok(payload)
}
