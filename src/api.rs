//! HTTP transport for the skill webhook

mod handlers;
mod types;

pub use handlers::create_router;

use crate::runtime::SkillRuntime;
use std::path::PathBuf;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<SkillRuntime>,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(runtime: SkillRuntime, static_dir: PathBuf) -> Self {
        Self {
            runtime: Arc::new(runtime),
            static_dir,
        }
    }
}
