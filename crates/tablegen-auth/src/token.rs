//! Access token cache with an injectable clock.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::DEFAULT_RENEWAL_MARGIN;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Start at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let delta = chrono::Duration::from_std(by).unwrap_or(chrono::TimeDelta::MAX);
        let mut now = self.now.write();
        *now = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Snapshot of the cache state, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    /// Whether a token is cached.
    pub has_token: bool,
    /// Expiry of the cached token.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whole seconds until expiry, floored at zero.
    pub expires_in_secs: Option<u64>,
}

/// Single-slot token cache.
///
/// A cached token is handed out while `now < expires_at - renewal_margin`;
/// past that point callers must fetch a new one.
#[derive(Debug)]
pub struct TokenCache<C = SystemClock> {
    clock: C,
    renewal_margin: Duration,
    slot: RwLock<Option<CachedToken>>,
}

impl Default for TokenCache<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> TokenCache<C> {
    /// Empty cache reading time from `clock`.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            renewal_margin: DEFAULT_RENEWAL_MARGIN,
            slot: RwLock::new(None),
        }
    }

    /// Override the renewal margin.
    #[must_use]
    pub fn with_renewal_margin(mut self, margin: Duration) -> Self {
        self.renewal_margin = margin;
        self
    }

    /// The clock in use.
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Cached token, if it is still outside the renewal margin.
    pub fn get(&self) -> Option<String> {
        let now = self.clock.now();
        self.slot
            .read()
            .as_ref()
            .filter(|cached| now < self.renew_at(cached))
            .map(|cached| cached.token.clone())
    }

    /// Cache `token` valid for `expires_in` from now.
    pub fn store(&self, token: impl Into<String>, expires_in: Duration) {
        let delta = chrono::Duration::from_std(expires_in).unwrap_or(chrono::TimeDelta::MAX);
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        *self.slot.write() = Some(CachedToken {
            token: token.into(),
            expires_at,
        });
    }

    /// Drop the cached token.
    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    /// `true` when no token is cached or it is inside the renewal margin.
    pub fn is_expiring_soon(&self) -> bool {
        let now = self.clock.now();
        self.slot
            .read()
            .as_ref()
            .is_none_or(|cached| now >= self.renew_at(cached))
    }

    /// Current cache state.
    pub fn info(&self) -> TokenInfo {
        let now = self.clock.now();
        self.slot.read().as_ref().map_or(
            TokenInfo {
                has_token: false,
                expires_at: None,
                expires_in_secs: None,
            },
            |cached| TokenInfo {
                has_token: true,
                expires_at: Some(cached.expires_at),
                expires_in_secs: Some(
                    u64::try_from((cached.expires_at - now).num_seconds()).unwrap_or(0),
                ),
            },
        )
    }

    fn renew_at(&self, cached: &CachedToken) -> DateTime<Utc> {
        let margin = chrono::Duration::from_std(self.renewal_margin).unwrap_or(chrono::TimeDelta::MAX);
        cached
            .expires_at
            .checked_sub_signed(margin)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn cache() -> TokenCache<ManualClock> {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        TokenCache::new(ManualClock::new(start))
    }

    #[test]
    fn empty_cache() {
        let cache = cache();
        assert_eq!(cache.get(), None);
        assert!(cache.is_expiring_soon());
        assert!(!cache.info().has_token);
    }

    #[test]
    fn token_reused_until_renewal_margin() {
        let cache = cache();
        cache.store("abc", Duration::from_secs(3600));

        assert_eq!(cache.get().as_deref(), Some("abc"));
        assert!(!cache.is_expiring_soon());

        // 54 minutes in: still six minutes before expiry.
        cache.clock().advance(Duration::from_secs(54 * 60));
        assert_eq!(cache.get().as_deref(), Some("abc"));

        // 55 minutes in: inside the five minute margin.
        cache.clock().advance(Duration::from_secs(60));
        assert_eq!(cache.get(), None);
        assert!(cache.is_expiring_soon());
        assert!(cache.info().has_token);
    }

    #[test]
    fn short_lived_token_is_never_reused() {
        let cache = cache();
        cache.store("abc", Duration::from_secs(120));
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn info_reports_remaining_seconds() {
        let cache = cache();
        cache.store("abc", Duration::from_secs(600));
        cache.clock().advance(Duration::from_secs(100));

        let info = cache.info();
        assert!(info.has_token);
        assert_eq!(info.expires_in_secs, Some(500));

        cache.clock().advance(Duration::from_secs(1000));
        assert_eq!(cache.info().expires_in_secs, Some(0));
    }

    #[test]
    fn clear_empties_the_slot() {
        let cache = cache();
        cache.store("abc", Duration::from_secs(3600));
        cache.clear();
        assert_eq!(cache.get(), None);
        assert!(!cache.info().has_token);
    }

    #[test]
    fn custom_margin() {
        let cache = cache().with_renewal_margin(Duration::ZERO);
        cache.store("abc", Duration::from_secs(120));
        assert_eq!(cache.get().as_deref(), Some("abc"));
    }
}
