//! Error taxonomy for the simulation engine
//!
//! Only setup problems are fatal. A car that cannot find a route idles,
//! and a fully blocked spawn perimeter flips the world's `running` flag;
//! neither condition surfaces as an error.

use thiserror::Error;

/// Fatal initialization failures: the map or direction table is unusable
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("map source is empty")]
    EmptyMap,

    #[error("map row {row} is {len} cells wide, expected {expected}")]
    RaggedMap {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("direction table is not valid JSON: {0}")]
    TableSyntax(#[from] serde_json::Error),

    #[error("direction table key {key:?} must be a single character")]
    TableKey { key: String },

    #[error("unknown direction token {token:?} for map character {symbol:?}")]
    DirectionToken { symbol: char, token: String },

    #[error("traffic light period for map character {symbol:?} must be a positive integer")]
    LightPeriod { symbol: char },

    #[error("unsupported direction table entry for map character {symbol:?}")]
    TableEntry { symbol: char },

    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced across the session facade
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("simulation not initialized")]
    NotInitialized,
}
