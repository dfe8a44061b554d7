use std::{fmt, sync::Arc};

use probex_core::JobService;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub service: JobService,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(service: JobService, config: Arc<Config>) -> Self {
        Self { service, config }
    }
}
