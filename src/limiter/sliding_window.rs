//! Per-client sliding window limiter

use super::clock::{Clock, SystemClock};
use crate::config::{MAX_TRACKED_TIMESTAMPS, RATE_LIMIT, RATE_WINDOW_MS};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Admission history for one client identity
///
/// Timestamps are kept in admission order, so the back is always the
/// most recent one.
#[derive(Debug, Clone)]
pub struct RateRecord {
    pub timestamps: VecDeque<Instant>,
    /// Cost of each admission. Always 1: admissions are counted per
    /// request regardless of which sources it fans out to.
    pub weight: u32,
}

impl RateRecord {
    fn new() -> Self {
        Self {
            timestamps: VecDeque::with_capacity(8),
            weight: 1,
        }
    }

    fn evict_before(&mut self, now: Instant, window: Duration) {
        while let Some(oldest) = self.timestamps.front() {
            if within_window(now, *oldest, window) {
                break;
            }
            self.timestamps.pop_front();
        }
    }

    fn used(&self) -> u64 {
        self.timestamps.len() as u64 * u64::from(self.weight)
    }

    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        match self.timestamps.back() {
            Some(latest) => !within_window(now, *latest, window),
            None => true,
        }
    }
}

fn within_window(now: Instant, ts: Instant, window: Duration) -> bool {
    now.saturating_duration_since(ts) <= window
}

/// Process-wide admission control keyed by client identity
///
/// All mutation happens under a single mutex; share it behind an `Arc`.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    max_tracked: usize,
    records: Mutex<HashMap<String, RateRecord>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::with_clock(limit, window, Arc::new(SystemClock))
    }

    pub fn with_clock(limit: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit,
            window,
            // never below the limit, or the count could not reach it
            max_tracked: MAX_TRACKED_TIMESTAMPS.max(limit as usize),
            records: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Returns true and records the attempt if the client is under its limit
    ///
    /// Denied attempts are not recorded. Every call also drops records
    /// whose newest admission has left the window.
    pub fn admit(&self, client_id: &str) -> bool {
        let now = self.clock.now();
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);

        let record = records
            .entry(client_id.to_string())
            .or_insert_with(RateRecord::new);
        record.evict_before(now, self.window);

        let admitted = if record.used() >= u64::from(self.limit) {
            false
        } else {
            record.timestamps.push_back(now);
            while record.timestamps.len() > self.max_tracked {
                record.timestamps.pop_front();
            }
            true
        };

        let before = records.len();
        records.retain(|_, rec| !rec.is_stale(now, self.window));
        let reclaimed = before - records.len();
        if reclaimed > 0 {
            log::debug!("🧹 Reclaimed {} idle rate records", reclaimed);
        }

        admitted
    }

    /// Number of client records currently held
    pub fn tracked_clients(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT, Duration::from_millis(RATE_WINDOW_MS))
    }
}
