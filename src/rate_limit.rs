//! Fixed-window rate admission keyed by credential.
//!
//! Each key owns a window `{count, window_start}`. A window is open while
//! `now - window_start < window_size`; the first check after it elapses hard-resets the count.
//! Because resets are not rolling, a caller straddling a boundary can be admitted up to twice the
//! limit within one window length of wall-clock time.
//!
//! The registry lock is only held long enough to fetch or create a key's cell; the
//! compare-and-increment runs under that cell's own lock so unrelated keys never contend and
//! concurrent checks for the same key cannot both take the last slot.
//!
//! Window state lives in process memory and is lost on restart.

// self
use crate::{_prelude::*, auth::CredentialId, error::Denial, obs};

/// Identity whose admissions are counted together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RateKey {
	/// Requests presenting this credential.
	Credential(CredentialId),
	/// Requests presenting no credential, when anonymous limiting is enabled.
	Anonymous,
}
impl From<CredentialId> for RateKey {
	fn from(value: CredentialId) -> Self {
		Self::Credential(value)
	}
}

/// Counter for one key's current window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowState {
	/// Admissions granted inside the window.
	pub count: u32,
	/// Instant the window opened.
	pub window_start: OffsetDateTime,
}

/// Result of an admission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
	/// The request consumed one slot.
	Admitted {
		/// Slots left in the current window.
		remaining: u32,
	},
	/// The window is exhausted; nothing was consumed.
	Rejected {
		/// Instant the current window closes.
		retry_at: OffsetDateTime,
	},
}
impl Admission {
	/// Returns `true` for [`Admission::Admitted`].
	pub fn is_admitted(&self) -> bool {
		matches!(self, Self::Admitted { .. })
	}

	/// Converts a rejection into [`Denial::RateLimitExceeded`].
	pub fn into_result(self) -> Result<u32, Denial> {
		match self {
			Self::Admitted { remaining } => Ok(remaining),
			Self::Rejected { retry_at } => Err(Denial::RateLimitExceeded { retry_at }),
		}
	}
}

type WindowCell = Arc<Mutex<WindowState>>;

/// Concurrency-safe fixed-window limiter.
#[derive(Debug)]
pub struct RateLimiter {
	window_size: Duration,
	windows: Mutex<HashMap<RateKey, WindowCell>>,
}
impl RateLimiter {
	/// Creates a limiter with the provided window length.
	pub fn new(window_size: Duration) -> Self {
		Self { window_size, windows: Default::default() }
	}

	/// Window length applied to every key.
	pub fn window_size(&self) -> Duration {
		self.window_size
	}

	/// Checks and consumes one slot for `key` using the current clock.
	pub fn admit(&self, key: impl Into<RateKey>, limit: u32) -> Admission {
		self.admit_at(key, limit, OffsetDateTime::now_utc())
	}

	/// Checks and consumes one slot for `key` as if the current instant were `now`.
	pub fn admit_at(&self, key: impl Into<RateKey>, limit: u32, now: OffsetDateTime) -> Admission {
		let cell = self.cell(key.into(), now);
		let mut state = cell.lock();

		if now - state.window_start >= self.window_size {
			*state = WindowState { count: 0, window_start: now };
		}
		if state.count >= limit {
			return Admission::Rejected { retry_at: state.window_start + self.window_size };
		}

		state.count += 1;

		Admission::Admitted { remaining: limit - state.count }
	}

	/// Returns a snapshot of the key's window, if one exists.
	pub fn window(&self, key: impl Into<RateKey>) -> Option<WindowState> {
		let key = key.into();
		let cell = self.windows.lock().get(&key).cloned()?;
		let state = *cell.lock();

		Some(state)
	}

	/// Drops the key's window; returns whether it was removed.
	///
	/// A window with an admission in flight is kept.
	pub fn forget(&self, key: impl Into<RateKey>) -> bool {
		let key = key.into();
		let mut windows = self.windows.lock();

		match windows.get(&key) {
			Some(cell) if is_idle(cell) => windows.remove(&key).is_some(),
			_ => false,
		}
	}

	/// Evicts idle windows that have fully elapsed at `now`; returns how many were removed.
	pub fn prune(&self, now: OffsetDateTime) -> usize {
		let mut windows = self.windows.lock();
		let before = windows.len();

		windows.retain(|_, cell| {
			!is_idle(cell) || now - cell.lock().window_start < self.window_size
		});

		let pruned = before - windows.len();

		obs::record_windows_pruned(pruned);

		pruned
	}

	/// Number of tracked windows.
	pub fn len(&self) -> usize {
		self.windows.lock().len()
	}

	/// Returns `true` when no windows are tracked.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn cell(&self, key: RateKey, now: OffsetDateTime) -> WindowCell {
		let mut windows = self.windows.lock();

		windows
			.entry(key)
			.or_insert_with(|| Arc::new(Mutex::new(WindowState { count: 0, window_start: now })))
			.clone()
	}
}

// Cells are only cloned under the registry lock, so a count of one cannot grow while it is held.
fn is_idle(cell: &WindowCell) -> bool {
	Arc::strong_count(cell) == 1
}
