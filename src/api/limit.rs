//! Fixed-window rate limiting keyed by client IP.
//!
//! Each IP gets a counter that resets `window` after its first hit. Counters
//! for expired windows are swept on every check, so the map stays bounded by
//! the number of distinct IPs seen within one window. State is per process;
//! limits are not shared across instances.

use std::{
    collections::HashMap,
    net::IpAddr,
    sync::Mutex,
    time::{Duration, Instant},
};

use crate::errors::{Error, Result};

/// A fixed-window counter per client IP.
#[derive(Debug)]
pub struct RateLimiter {
    max: u32,
    window: Duration,
    hits: Mutex<HashMap<IpAddr, (u32, Instant)>>,
}

impl RateLimiter {
    /// Allows `max` requests per `window` per IP.
    #[must_use]
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Records a hit from `ip` and rejects it once the window's budget is
    /// spent.
    pub fn check(&self, ip: IpAddr) -> Result<()> {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> Result<()> {
        let mut hits = match self.hits.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        hits.retain(|_, (_, started)| now.duration_since(*started) < self.window);

        let (count, _) = hits.entry(ip).or_insert((0, now));
        if *count >= self.max {
            return Err(Error::RateLimited);
        }
        *count += 1;
        Ok(())
    }
}
