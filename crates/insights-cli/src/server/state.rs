//! Application state for the web server.

use insights::{Orchestrator, UploadGateway};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Accepts new uploads and creates pending jobs.
    pub gateway: UploadGateway,
    /// Runs and reports on jobs.
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(gateway: UploadGateway, orchestrator: Orchestrator) -> Self {
        Self {
            gateway,
            orchestrator,
        }
    }

    /// Largest request body the upload route accepts.
    pub fn max_body_size(&self) -> usize {
        // Room for multipart framing around the file itself
        self.orchestrator.config().upload.max_file_size + 64 * 1024
    }
}
