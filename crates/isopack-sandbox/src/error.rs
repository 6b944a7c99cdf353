use std::path::PathBuf;

use thiserror::Error;

use crate::events::Hook;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to load declarations from {path}")]
    Config {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid requirement '{requirement}' for '{name}'")]
    InvalidRequirement {
        name: String,
        requirement: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("conflicting requirements for '{name}': {existing} with {requested}")]
    Conflict {
        name: String,
        existing: String,
        requested: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to install {name} ({requirement})")]
    Install {
        name: String,
        requirement: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to activate {name} ({requirement})")]
    Activation {
        name: String,
        requirement: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to read the installed package index")]
    Index {
        #[source]
        source: anyhow::Error,
    },

    #[error("observer failed during {hook}")]
    Hook {
        hook: Hook,
        #[source]
        source: anyhow::Error,
    },
}
