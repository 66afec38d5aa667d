//! Application state for Axum handlers.

use guestlist_runtime::{EditionLifecycle, GuestLifecycle, LifecycleEnvironment};

/// Application state shared across all HTTP handlers.
///
/// Both managers are cheap to clone; they share the stores and notifier of one
/// `LifecycleEnvironment`.
#[derive(Clone)]
pub struct AppState {
    /// Edition lifecycle manager
    pub editions: EditionLifecycle,
    /// Guest and preselection lifecycle manager
    pub guests: GuestLifecycle,
}

impl AppState {
    /// Builds both managers over the same environment.
    #[must_use]
    pub fn new(env: LifecycleEnvironment) -> Self {
        Self {
            editions: EditionLifecycle::new(env.clone()),
            guests: GuestLifecycle::new(env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_clone() {
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState>();
    }
}
