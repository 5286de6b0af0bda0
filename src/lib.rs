pub mod api;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod generation;
pub mod init;
pub mod model;
pub mod prompt;
pub mod repository;
pub mod session;

pub use error::{Result, ScriptError};
pub use model::{Scene, ScriptFragment, Style, TargetDuration, VideoScript};
pub use session::{Phase, ScriptSession, SessionState};

pub(crate) fn logv(tag: &str, message: &str) {
    match tag {
        "WARN" => tracing::warn!(tag, "{}", message),
        _ => tracing::info!(tag, "{}", message),
    }
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}
