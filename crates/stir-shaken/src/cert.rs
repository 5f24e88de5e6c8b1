//! Certificate bundle model, validity/chain/CRL checks, and trust store
//! assembly — grounded on `examples/original_source/secsipid/certs.go`,
//! `ca.go`, and `pubkey_verify.go`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use x509_parser::certificate::X509Certificate;
use x509_parser::time::ASN1Time;

use crate::clock::Clock;
use crate::error::Error;
use crate::pem_util::{self, Block};

/// Caps PEM-bundle length to avoid unbounded recursion/allocation on
/// attacker-controlled `x5u` responses; the original Go parser recurses with
/// no such limit.
const MAX_BUNDLE_BLOCKS: usize = 256;

/// Caps chain-walk depth; SHAKEN chains are short in practice (leaf + one or
/// two intermediates + root).
const MAX_CHAIN_DEPTH: usize = 16;

/// A parsed certificate bundle: a leaf plus zero or more intermediates, all
/// held as DER bytes so the bundle owns its data independent of any PEM
/// buffer's lifetime.
#[derive(Clone, Debug)]
pub struct Certs {
	leaf_der: Vec<u8>,
	intermediate_der: Vec<Vec<u8>>,
}

impl Certs {
	/// Decodes an ordered PEM stream: the first `CERTIFICATE` block is the
	/// leaf, the rest are intermediates. Empty or leafless input is
	/// `CertInvalidFormat`.
	pub fn from_pem(data: &[u8]) -> Result<Self, Error> {
		let blocks = pem_util::iter_blocks(data);
		if blocks.len() > MAX_BUNDLE_BLOCKS {
			return Err(Error::CertInvalidFormat(
				"certificate bundle exceeds maximum block count".to_string(),
			));
		}
		let mut der_certs = blocks.into_iter().filter_map(|b| match b {
			Block::X509Certificate(der) => Some(der),
			_ => None,
		});
		let leaf_der = der_certs
			.next()
			.ok_or_else(|| Error::CertInvalidFormat("failed to parse certificate PEM".to_string()))?;
		let intermediate_der = der_certs.collect();
		Ok(Self {
			leaf_der,
			intermediate_der,
		})
	}

	pub fn leaf_der(&self) -> &[u8] {
		&self.leaf_der
	}

	pub fn leaf(&self) -> Result<X509Certificate<'_>, Error> {
		parse(&self.leaf_der)
	}

	pub fn intermediates_der(&self) -> &[Vec<u8>] {
		&self.intermediate_der
	}

	/// Checks the leaf's validity window against the injected clock.
	pub fn verify_time(&self, clock: &dyn Clock) -> Result<(), Error> {
		let leaf = self.leaf()?;
		let now = clock.now();
		if now >= asn1_to_system_time(leaf.validity().not_after) {
			return Err(Error::CertExpired);
		}
		if now <= asn1_to_system_time(leaf.validity().not_before) {
			return Err(Error::CertBeforeValidity);
		}
		Ok(())
	}

	/// Walks from the leaf toward a trusted root by issuer/subject match,
	/// one candidate at a time, verifying each signature along the way.
	/// `ExtKeyUsageAny` in the original means no EKU restriction is applied
	/// here either. The bundle's own carried intermediates are *not* added
	/// here — `build_intermediates` is the only place that decides whether
	/// they enter the pool, gated on the IntermediateCA bit (spec.md §4.4);
	/// this method trusts the `intermediates` slice the caller assembled.
	pub fn verify_chain(&self, roots: &[Vec<u8>], intermediates: &[Vec<u8>]) -> Result<(), Error> {
		let pool: Vec<&[u8]> = intermediates
			.iter()
			.map(Vec::as_slice)
			.chain(roots.iter().map(Vec::as_slice))
			.collect();

		let mut current_der = self.leaf_der.clone();
		for _ in 0..MAX_CHAIN_DEPTH {
			let current = parse(&current_der)?;

			let issuer_der = pool
				.iter()
				.find(|cand| {
					parse(cand)
						.map(|c| c.tbs_certificate.subject == current.tbs_certificate.issuer)
						.unwrap_or(false)
				})
				.ok_or_else(|| {
					Error::CertInvalid("x509: certificate signed by unknown authority".to_string())
				})?
				.to_vec();

			let issuer = parse(&issuer_der)?;
			current
				.verify_signature(Some(issuer.public_key()))
				.map_err(|e| Error::CertInvalid(e.to_string()))?;

			if roots.iter().any(|r| r.as_slice() == issuer_der.as_slice()) {
				return Ok(());
			}
			current_der = issuer_der;
		}
		Err(Error::CertInvalid(
			"x509: certificate chain too long".to_string(),
		))
	}

	/// Checks the leaf's serial number against a CRL's revoked-certificate
	/// list. `crl_bytes` may be PEM (`X509 CRL`) or raw DER.
	pub fn verify_crl(&self, crl_bytes: &[u8]) -> Result<(), Error> {
		let der = crl_der(crl_bytes)?;
		let (_, crl) = x509_parser::revocation_list::CertificateRevocationList::from_der(&der)
			.map_err(|e| Error::Generic(format!("failed to parse CRL file: {e}")))?;
		let leaf = self.leaf()?;
		for revoked in crl.iter_revoked_certificates() {
			if revoked.user_certificate == leaf.tbs_certificate.serial {
				return Err(Error::CertRevoked);
			}
		}
		Ok(())
	}
}

fn crl_der(input: &[u8]) -> Result<Vec<u8>, Error> {
	match pem_util::first_block(input) {
		Some(Block::Crl(der)) => Ok(der),
		_ => Ok(input.to_vec()),
	}
}

fn parse(der: &[u8]) -> Result<X509Certificate<'_>, Error> {
	x509_parser::parse_x509_certificate(der)
		.map(|(_, cert)| cert)
		.map_err(|e| Error::CertInvalidFormat(e.to_string()))
}

fn asn1_to_system_time(t: ASN1Time) -> SystemTime {
	let ts = t.timestamp();
	if ts >= 0 {
		UNIX_EPOCH + Duration::from_secs(ts as u64)
	} else {
		UNIX_EPOCH - Duration::from_secs((-ts) as u64)
	}
}

/// Builds the root CA pool for a verification: starts empty, optionally
/// seeded from the host trust store, optionally extended with a custom CA
/// file. Mirrors `getBaseRootCAs`/`addCustomCAsIfNeeded`.
pub fn build_roots(use_system: bool, custom_ca_file: &str) -> Result<Vec<Vec<u8>>, Error> {
	let mut roots = Vec::new();
	if use_system {
		roots.extend(load_system_roots()?);
	}
	if !custom_ca_file.is_empty() {
		roots.extend(load_ca_bundle_file(custom_ca_file, true)?);
	}
	Ok(roots)
}

/// Builds the intermediate CA pool: empty unless the intermediate-CA bit is
/// set, in which case a configured file is required and the bundle's own
/// intermediates are appended too.
pub fn build_intermediates(
	use_intermediate: bool,
	inter_ca_file: &str,
	bundle: &Certs,
) -> Result<Vec<Vec<u8>>, Error> {
	if !use_intermediate {
		return Ok(Vec::new());
	}
	if inter_ca_file.is_empty() {
		return Err(Error::CertNoCAInter);
	}
	let mut inter = load_ca_bundle_file(inter_ca_file, false)?;
	inter.extend(bundle.intermediates_der().iter().cloned());
	Ok(inter)
}

/// Distinguishes read vs. parse failure so callers see `CertNoCAFile`'s
/// sibling codes correctly: this helper is only reached once the "file path
/// configured" check has already passed, so it only needs to report read vs.
/// parse failures.
fn load_ca_bundle_file(path: &str, is_root: bool) -> Result<Vec<Vec<u8>>, Error> {
	let read_err = |_| {
		if is_root {
			Error::CertReadCAFile
		} else {
			Error::CertReadCAInter
		}
	};
	let bytes = std::fs::read(path).map_err(|e| {
		tracing::warn!(path, error = %e, "failed to read CA bundle file");
		read_err(e)
	})?;
	let blocks = pem_util::iter_blocks(&bytes);
	let certs: Vec<Vec<u8>> = blocks
		.into_iter()
		.filter_map(|b| match b {
			Block::X509Certificate(der) => Some(der),
			_ => None,
		})
		.collect();
	if certs.is_empty() {
		return Err(Error::CertProcessing(format!(
			"failed to append {} file",
			if is_root { "CA" } else { "intermediate CA" }
		)));
	}
	Ok(certs)
}

fn load_system_roots() -> Result<Vec<Vec<u8>>, Error> {
	// Honors `SSL_CERT_DIR`/`SSL_CERT_FILE` on platforms where the OpenSSL
	// compatibility search applies, same as the Go standard library's
	// `x509.SystemCertPool`.
	let result = rustls_native_certs::load_native_certs();
	if !result.errors.is_empty() && result.certs.is_empty() {
		let msg = result
			.errors
			.iter()
			.map(ToString::to_string)
			.collect::<Vec<_>>()
			.join("; ");
		return Err(Error::CertProcessing(msg));
	}
	Ok(result.certs.into_iter().map(|c| c.to_vec()).collect())
}
