pub mod plateau;
pub mod service;

use crate::recorder::Recorder;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub recorder: Recorder,
}

pub use plateau::post as plateau_post;
pub use plateau::post_legacy as plateau_post_legacy;
pub use service::health;
pub use service::root;
