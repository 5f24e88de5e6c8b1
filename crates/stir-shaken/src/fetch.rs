//! Injected HTTP fetcher (SPEC_FULL.md §4.11). The library is synchronous
//! end to end, so the teacher's async `reqwest` usage is narrowed to its
//! `blocking` client here.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::Error;

pub trait HttpFetcher: Send + Sync {
	fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, Error>;
}

/// Default fetcher, backed by a blocking `reqwest` client built per call —
/// each verification is request-scoped and self-contained (spec.md §5), so
/// there is no shared client to keep warm across calls.
#[cfg(feature = "http")]
#[derive(Clone, Copy, Debug, Default)]
pub struct ReqwestFetcher;

#[cfg(feature = "http")]
impl HttpFetcher for ReqwestFetcher {
	fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, Error> {
		let client = reqwest::blocking::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| Error::HTTPGet(e.to_string()))?;
		let response = client.get(url).send().map_err(|e| {
			tracing::warn!(url, error = %e, "x5u fetch failed");
			Error::HTTPGet(e.to_string())
		})?;
		if !response.status().is_success() {
			tracing::warn!(url, status = %response.status(), "x5u fetch returned non-2xx");
			return Err(Error::HTTPStatusCode(response.status().as_u16()));
		}
		response
			.bytes()
			.map(|b| b.to_vec())
			.map_err(|e| Error::HTTPReadBody(e.to_string()))
	}
}

/// In-memory test double: a fixed URL → body/status map, no network access.
#[derive(Default)]
pub struct FakeFetcher {
	responses: Mutex<HashMap<String, (u16, Vec<u8>)>>,
}

impl FakeFetcher {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&self, url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) {
		self.responses
			.lock()
			.unwrap()
			.insert(url.into(), (status, body.into()));
	}
}

impl HttpFetcher for FakeFetcher {
	fn get(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, Error> {
		let responses = self.responses.lock().unwrap();
		let (status, body) = responses
			.get(url)
			.ok_or_else(|| Error::HTTPGet(format!("no fake response configured for {url}")))?;
		if !(200..300).contains(status) {
			return Err(Error::HTTPStatusCode(*status));
		}
		Ok(body.clone())
	}
}
