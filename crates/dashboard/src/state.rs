//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::DashboardDefaults;
use crate::map::DashboardContext;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Everything inside is read-only once the
/// server starts.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    context: DashboardContext,
    defaults: DashboardDefaults,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(context: DashboardContext, defaults: DashboardDefaults) -> Self {
        Self {
            inner: Arc::new(AppStateInner { context, defaults }),
        }
    }

    /// Get a reference to the joined Salesforce snapshot.
    #[must_use]
    pub fn context(&self) -> &DashboardContext {
        &self.inner.context
    }

    /// Get a reference to the initial widget values.
    #[must_use]
    pub fn defaults(&self) -> &DashboardDefaults {
        &self.inner.defaults
    }
}
