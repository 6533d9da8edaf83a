use crate::service::ServiceHandle;
use std::path::PathBuf;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub service: ServiceHandle,
}

impl AppState {
    pub fn new(root: PathBuf, service: ServiceHandle) -> Self {
        Self { root, service }
    }
}
