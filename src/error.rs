//! Errors surfaced to the host frame loop
//!
//! Simulation math never fails. The only runtime failure is a host callback
//! erroring mid-frame, after which the loop refuses to advance.

use thiserror::Error;

/// Error type host callbacks may return
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Return type of host callbacks
pub type HookResult = Result<(), HookError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// A host callback failed; the game is halted from here on
    #[error("{hook} callback failed: {source}")]
    Hook {
        hook: &'static str,
        #[source]
        source: HookError,
    },

    /// Tick requested after a fail-stop
    #[error("simulation halted after an earlier callback failure")]
    Halted,

    /// Stage JSON was not a JSON object at all
    #[error("stage descriptor could not be parsed: {0}")]
    Stage(#[from] serde_json::Error),

    /// Settings JSON could not be parsed
    #[error("settings could not be parsed: {0}")]
    Settings(#[source] serde_json::Error),
}
