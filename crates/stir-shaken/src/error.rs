//! Numeric `(code, message)` errors matching the original SHAKEN/STIR library.
//!
//! Downstream SIP proxies key off the exact integer codes, so the numbering
//! below is not incidental — it is copied from the reference implementation's
//! error table, collisions included.

/// A typed error carrying the numeric code callers parse.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
	/// Generic failure with no more specific code.
	#[error("{0}")]
	Generic(String),

	// --- certificate / private key errors: -100..-199 ---
	#[error("{0}")]
	CertInvalid(String),
	#[error("failed to parse certificate PEM: {0}")]
	CertInvalidFormat(String),
	#[error("certificate expired")]
	CertExpired,
	#[error("certificate not valid yet")]
	CertBeforeValidity,
	#[error("{0}")]
	CertProcessing(String),
	#[error("no CA file")]
	CertNoCAFile,
	#[error("failed to read CA file")]
	CertReadCAFile,
	#[error("no intermediate CA file")]
	CertNoCAInter,
	#[error("failed to read intermediate CA file")]
	CertReadCAInter,
	#[error("no CRL file")]
	CertNoCRLFile,
	#[error("failed to read CRL file")]
	CertReadCRLFile,
	#[error("serial number match - certificate is revoked")]
	CertRevoked,
	#[error("not an EC certificate")]
	CertInvalidEC,
	#[error("{0}")]
	PrvKeyInvalid(String),
	/// Shares its numeric code (-152) with [`Error::PrvKeyInvalidEC`] in the
	/// reference implementation; both names are preserved.
	#[error("key must be PEM encoded")]
	PrvKeyInvalidFormat,
	/// Shares its numeric code (-152) with [`Error::PrvKeyInvalidFormat`].
	#[error("not EC private key")]
	PrvKeyInvalidEC,

	// --- JWT header / payload / signature errors: -200..-299 ---
	#[error("failed to parse JWT header: {0}")]
	JSONHdrParse(String),
	#[error("unexpected alg in JWT header")]
	JSONHdrAlg,
	#[error("unexpected ppt in JWT header")]
	JSONHdrPpt,
	#[error("unexpected typ in JWT header")]
	JSONHdrTyp,
	#[error("x5u in JWT header does not match info parameter")]
	JSONHdrX5u,
	#[error("failed to parse JWT payload: {0}")]
	JSONPayloadParse(String),
	#[error("iat is expired")]
	JSONPayloadIATExpired,
	#[error("signature verification failed")]
	JSONSignatureInvalid,
	#[error("failed to hash signing input")]
	JSONSignatureHashing,
	#[error("unexpected signature size")]
	JSONSignatureSize,
	#[error("failed to produce signature")]
	JSONSignatureFailure,

	// --- SIP identity header errors: -300..-399 ---
	#[error("failed to parse identity header")]
	SIPHdrParse,
	#[error("unexpected alg parameter")]
	SIPHdrAlg,
	/// Shares its numeric code (-303) with [`Error::SIPHdrInfo`] in the
	/// reference implementation.
	#[error("unexpected ppt parameter")]
	SIPHdrPpt,
	/// Shares its numeric code (-303) with [`Error::SIPHdrPpt`].
	#[error("missing or empty info parameter")]
	SIPHdrInfo,
	#[error("empty identity header")]
	SIPHdrEmpty,

	// --- http and file I/O errors: -400..-499 ---
	#[error("invalid URL scheme")]
	HTTPInvalidURL,
	#[error("{0}")]
	HTTPGet(String),
	#[error("unexpected HTTP status code: {0}")]
	HTTPStatusCode(u16),
	#[error("failed to read response body: {0}")]
	HTTPReadBody(String),
	#[error("{0}")]
	FileRead(String),
}

impl Error {
	/// The numeric code a caller matches on, mirroring the Go library's
	/// `SJWTRetErr*` constants exactly, collisions included.
	pub fn code(&self) -> i32 {
		use Error::*;
		match self {
			Generic(_) => -1,
			CertInvalid(_) => -101,
			CertInvalidFormat(_) => -102,
			CertExpired => -103,
			CertBeforeValidity => -104,
			CertProcessing(_) => -105,
			CertNoCAFile => -106,
			CertReadCAFile => -107,
			CertNoCAInter => -108,
			CertReadCAInter => -109,
			CertNoCRLFile => -110,
			CertReadCRLFile => -111,
			CertRevoked => -112,
			CertInvalidEC => -114,
			PrvKeyInvalid(_) => -151,
			PrvKeyInvalidFormat => -152,
			PrvKeyInvalidEC => -152,
			JSONHdrParse(_) => -201,
			JSONHdrAlg => -202,
			JSONHdrPpt => -203,
			JSONHdrTyp => -204,
			JSONHdrX5u => -205,
			JSONPayloadParse(_) => -231,
			JSONPayloadIATExpired => -232,
			JSONSignatureInvalid => -251,
			JSONSignatureHashing => -252,
			JSONSignatureSize => -253,
			JSONSignatureFailure => -254,
			SIPHdrParse => -301,
			SIPHdrAlg => -302,
			SIPHdrPpt => -303,
			SIPHdrInfo => -303,
			SIPHdrEmpty => -304,
			HTTPInvalidURL => -401,
			HTTPGet(_) => -402,
			HTTPStatusCode(_) => -403,
			HTTPReadBody(_) => -404,
			FileRead(_) => -451,
		}
	}

	/// The human-readable message half of the `(code, message)` pair.
	/// Not parsed by callers; informative only.
	pub fn message(&self) -> String {
		self.to_string()
	}

	/// Splits the error into the `(code, message)` pair the public API
	/// returns, the same shape as the Go library's `Error.Simplify`.
	pub fn simplify(&self) -> (i32, String) {
		(self.code(), self.message())
	}
}

pub type Result<T> = std::result::Result<T, Error>;
