//! SIP `Identity` header parsing, grounded on
//! `examples/original_source/secsipid/secsipid.go`'s
//! `SJWTRemoveWhiteSpaces`/`SJWTGetValidInfoAttr`.

use crate::error::Error;

/// The token and its parsed `;`-separated parameters. `info` is the raw
/// parameter value, angle brackets (if any) not yet stripped — see
/// [`parse_with_required_info`] for the stripped, validated form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityHeader {
	pub token: String,
	pub info: Option<String>,
}

/// Strips all whitespace, splits on `;`; the first segment is the token,
/// the rest are `name=value` parameters. `alg`, if present, must be
/// `ES256`; `ppt`, if present, must be `shaken` (bare or quoted); `info` is
/// read but only required to be present and non-empty by
/// [`parse_with_required_info`] — plain [`parse`] tolerates its absence for
/// callers (like inline-pubkey verification) that don't need it.
pub fn parse(value: &str) -> Result<IdentityHeader, Error> {
	let cleaned = remove_whitespace(value);
	if cleaned.is_empty() {
		return Err(Error::SIPHdrEmpty);
	}
	let mut parts = cleaned.split(';');
	let token = parts.next().unwrap_or_default().to_string();

	let mut info = None;
	for param in parts {
		let Some((name, raw_value)) = param.split_once('=') else {
			continue;
		};
		match name {
			"alg" if raw_value != "ES256" => return Err(Error::SIPHdrAlg),
			"ppt" if raw_value != "shaken" && raw_value != "\"shaken\"" => {
				return Err(Error::SIPHdrPpt);
			}
			"info" => info = Some(raw_value.to_string()),
			_ => {}
		}
	}
	Ok(IdentityHeader { token, info })
}

/// As [`parse`], but requires the `info` parameter's raw value (before
/// angle-bracket stripping) to be longer than two characters, matching
/// `SJWTGetValidInfoAttr`'s `len(paramInfo) <= 2` rejection — this is
/// checked on the *raw* value, so a bracket-only `<>` (length 2) is
/// rejected but any two-character bare value is rejected too, exactly as
/// the reference implementation does.
pub fn parse_with_required_info(value: &str) -> Result<(IdentityHeader, String), Error> {
	let header = parse(value)?;
	match &header.info {
		Some(raw) if raw.len() > 2 => Ok((header, strip_angle_brackets(raw).to_string())),
		_ => Err(Error::SIPHdrInfo),
	}
}

fn remove_whitespace(s: &str) -> String {
	s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn strip_angle_brackets(s: &str) -> &str {
	if let Some(stripped) = s.strip_prefix('<') {
		if let Some(stripped) = stripped.strip_suffix('>') {
			return stripped;
		}
	}
	s
}
