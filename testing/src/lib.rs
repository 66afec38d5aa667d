//! # Guestlist Testing
//!
//! Test doubles for the lifecycle managers:
//! - [`FixedClock`]: deterministic, manually advanced time
//! - [`InMemoryStore`]: both store traits over mutex-guarded maps, with the same
//!   uniqueness and conditional-update semantics as the `PostgreSQL` store
//! - [`RecordingNotifier`]: captures notifications instead of delivering them
//! - [`fixtures`]: ready-made profiles
//!
//! ## Example
//!
//! ```ignore
//! use guestlist_testing::{test_clock, InMemoryStore, RecordingNotifier};
//!
//! let store = Arc::new(InMemoryStore::new());
//! let notifier = Arc::new(RecordingNotifier::new());
//! let env = LifecycleEnvironment::new(
//!     Arc::new(test_clock()),
//!     store.clone(),
//!     store.clone(),
//!     notifier.clone(),
//!     InviteLinkBuilder::new("http://localhost:3000/confirmar"),
//! );
//! ```

use chrono::{DateTime, Utc};
use guestlist_core::environment::Clock;

pub mod fixtures;
pub mod memory;
pub mod notifier;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same time until moved with [`FixedClock::advance`] or
    /// [`FixedClock::set`]. Clones share the same time.
    ///
    /// # Example
    ///
    /// ```
    /// use guestlist_testing::mocks::FixedClock;
    /// use guestlist_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// assert_eq!(time1, clock.now());
    /// clock.advance(Duration::minutes(5));
    /// assert_eq!(clock.now() - time1, Duration::minutes(5));
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Moves the clock forward
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Jumps to `time`
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = time;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-03-10 12:00:00 UTC, in `Março 2025`)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-03-10T12:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

pub use memory::InMemoryStore;
pub use mocks::{test_clock, FixedClock};
pub use notifier::RecordingNotifier;
