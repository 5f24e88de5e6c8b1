//! Injected time source, so validity-window and `iat`-expiry tests don't
//! depend on real wall-clock time (SPEC_FULL.md §4.11, spec.md §9 Design
//! Notes).

use std::time::SystemTime;

pub trait Clock: Send + Sync {
	fn now(&self) -> SystemTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> SystemTime {
		SystemTime::now()
	}
}

/// Test double returning a fixed instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub SystemTime);

impl Clock for FixedClock {
	fn now(&self) -> SystemTime {
		self.0
	}
}
