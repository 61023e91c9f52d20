//! Error types for Modeller operations.
//!
//! Four families, matching how each failure is handled:
//!
//! - [`StoreError`]: a graph directory on disk is malformed. Loading refuses
//!   to build a partially valid store.
//! - [`GraphError`]: a mutation named something that does not exist, or left
//!   the graph violating an invariant (the mutation is rolled back).
//! - [`PersistError`]: saving or loading a save root failed. A
//!   [`PersistError::SwapFailed`] is the one critical case: the only good copy
//!   of the data is in the temp directory it names.
//! - [`ModelError::InvalidConfig`]: a physics setting is out of range.
//!
//! Rejected user edits (self-connections, duplicate titles, ...) are not
//! errors; see `Outcome` in `modeller-runtime`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Modeller operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur during Modeller operations.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("invalid setting `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

/// A graph directory could not be loaded.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("CONNECTIONS.txt not found in {}", .0.display())]
    MissingConnections(PathBuf),

    #[error("non-file entry in graph directory: {}", .0.display())]
    UnexpectedEntry(PathBuf),

    #[error("non-.txt file in graph directory: {}", .0.display())]
    NotTextFile(PathBuf),

    #[error("invalid node title: {0:?}")]
    InvalidTitle(String),

    #[error("duplicate node title: {0:?}")]
    DuplicateTitle(String),

    #[error("malformed connection on line {line}: {reason}")]
    MalformedConnection { line: usize, reason: &'static str },

    #[error("connection on line {line} references unknown node {title:?}")]
    UnknownEndpoint { line: usize, title: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A mutation could not be applied.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node not found: {0:?}")]
    NodeNotFound(String),

    #[error("connection not found: {0:?} <-> {1:?}")]
    ConnectionNotFound(String, String),

    #[error("invariant violated: {0}")]
    Invariant(#[from] Violation),
}

/// A structural invariant that did not hold.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("node title is not a usable file name: {0:?}")]
    InvalidTitle(String),

    #[error("self-connection {0:?} <-> {1:?}")]
    SelfConnection(String, String),

    #[error("duplicate connection {0:?} <-> {1:?}")]
    DuplicateConnection(String, String),

    #[error("connection {0:?} <-> {1:?} references a missing node")]
    DanglingConnection(String, String),

    #[error(
        "record counts disagree: {store_nodes} nodes vs {physical_nodes} physical nodes, \
         {store_connections} connections vs {physical_lines} lines"
    )]
    CountMismatch {
        store_nodes: usize,
        physical_nodes: usize,
        store_connections: usize,
        physical_lines: usize,
    },

    #[error("render index: {0}")]
    RenderIndex(String),
}

/// Saving or loading a save root failed.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot save: node title is not a usable file name: {0:?}")]
    InvalidTitle(String),

    #[error("state invalid; cannot save: {0}")]
    InconsistentState(Violation),

    #[error("save root does not exist: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("cannot derive temp/backup paths for {}", .0.display())]
    InvalidTarget(PathBuf),

    #[error("position file is corrupt: {0}")]
    CorruptPositions(String),

    #[error(
        "save root is missing but a backup exists at {}; restore it before loading",
        .0.display()
    )]
    OrphanedBackup(PathBuf),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "critical: directory swap failed; your data is in the temp directory {}",
        .temp.display()
    )]
    SwapFailed {
        temp: PathBuf,
        original_intact: bool,
        #[source]
        source: std::io::Error,
    },
}

impl PersistError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure left the only good copy outside the save root.
    pub fn is_critical(&self) -> bool {
        matches!(self, PersistError::SwapFailed { .. })
    }
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

// Convenience constructors
impl ModelError {
    pub fn node_not_found(title: impl Into<String>) -> Self {
        ModelError::Graph(GraphError::NodeNotFound(title.into()))
    }

    pub fn connection_not_found(a: impl Into<String>, b: impl Into<String>) -> Self {
        ModelError::Graph(GraphError::ConnectionNotFound(a.into(), b.into()))
    }

    pub fn invariant(violation: Violation) -> Self {
        ModelError::Graph(GraphError::Invariant(violation))
    }

    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        ModelError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// The violated invariant, if this error is one.
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            ModelError::Graph(GraphError::Invariant(v)) => Some(v),
            _ => None,
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, ModelError::Persist(e) if e.is_critical())
    }
}
