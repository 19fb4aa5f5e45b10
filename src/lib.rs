//! signsync - turn tracked sign gestures into sentences
//!
//! Landmark frames are windowed, classified, smoothed and debounced into a
//! stable label stream; label edges append tokens or flush finished sentences
//! to an output sink.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod app;
pub mod classifier;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod landmarks;
#[cfg(feature = "cli")]
pub mod logging;
pub mod output;
pub mod pipeline;

// Core traits (source → classify → sink)
pub use classifier::Classifier;
pub use landmarks::LandmarkSource;
pub use pipeline::sink::{
    CollectorSink, CommandExecutor, SentenceSink, StdoutSink, SystemCommandExecutor,
};

// Pipeline
pub use pipeline::gesture::GesturePipeline;
pub use pipeline::orchestrator::{Pipeline, PipelineConfig, PipelineHandle};

// Error handling
pub use error::{Result, SignSyncError};

// Config
pub use config::Config;

// Station framework
pub use pipeline::error::{ErrorReporter, StationError};
pub use pipeline::station::Station;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_hash_suffix() {
        let ver = version_string();
        match option_env!("GIT_HASH") {
            Some(hash) if !hash.is_empty() => assert_eq!(ver.split('+').nth(1), Some(hash)),
            _ => assert_eq!(ver, env!("CARGO_PKG_VERSION")),
        }
    }
}
