use std::sync::Arc;

use jobcast_pipeline::Coordinator;

/// Shared handler state. The coordinator owns everything mutable; handlers
/// only ever call into it.
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
}
