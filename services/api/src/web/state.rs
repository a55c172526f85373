//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the authenticated caller identity.

use crate::config::Config;
use recipe_book_core::ports::{PortError, PortResult};
use recipe_book_core::DatabaseService;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
}

//=========================================================================================
// Caller Identity
//=========================================================================================

/// The person id resolved from the bearer token by `require_auth`.
/// Handlers receive it as a request extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentPerson(pub i32);

impl CurrentPerson {
    /// Fails with `Forbidden` unless `person_id` is the caller.
    pub fn ensure_is(self, person_id: i32) -> PortResult<()> {
        if self.0 == person_id {
            Ok(())
        } else {
            Err(PortError::Forbidden(format!(
                "person {} cannot act on behalf of person {}",
                self.0, person_id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_the_caller_passes() {
        assert!(CurrentPerson(3).ensure_is(3).is_ok());
        assert!(matches!(
            CurrentPerson(3).ensure_is(4),
            Err(PortError::Forbidden(_))
        ));
    }
}
