//! The graph store: titled text nodes and the connections between them.
//!
//! On disk a store is a directory holding one `<title>.txt` per node (the raw
//! body) and a `CONNECTIONS.txt` with one `a<TAB>b` line per connection.
//! Loading is strict: any deviation from that layout is refused rather than
//! producing a partially valid store.

use crate::swap::{self, SwapPaths};
use modeller_core::error::{PersistError, Result, StoreError, Violation};
use modeller_core::filename::is_valid_filename;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Name of the connections file inside a graph directory.
pub const CONNECTIONS_FILE: &str = "CONNECTIONS.txt";

/// A node with this title would be written over the connections file.
pub const RESERVED_TITLE: &str = "CONNECTIONS";

const NODE_EXTENSION: &str = ".txt";

/// Nodes keyed by title, plus the ordered connection sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStore {
    /// Title → body text.
    pub nodes: BTreeMap<String, String>,
    /// Connections in insertion order. Each pair is unordered.
    pub connections: Vec<(String, String)>,
}

/// Whether `title` can name a node: a valid file name that does not collide
/// with the connections file, even on a case-insensitive file system.
pub fn is_usable_title(title: &str) -> bool {
    is_valid_filename(title) && !is_reserved_title(title)
}

pub fn is_reserved_title(title: &str) -> bool {
    title.eq_ignore_ascii_case(RESERVED_TITLE)
}

/// Case-insensitive title comparison used for the self-connection rule.
pub fn same_title(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn same_pair(first: &(String, String), a: &str, b: &str) -> bool {
    (first.0 == a && first.1 == b) || (first.0 == b && first.1 == a)
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a graph directory.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            return Err(StoreError::MissingDirectory(dir.to_path_buf()).into());
        }
        if !dir.is_dir() {
            return Err(StoreError::NotADirectory(dir.to_path_buf()).into());
        }

        let conn_path = dir.join(CONNECTIONS_FILE);
        if !conn_path.is_file() {
            return Err(StoreError::MissingConnections(dir.to_path_buf()).into());
        }

        let mut store = GraphStore::new();

        let entries = fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(dir, e))?;
            let path = entry.path();

            if !path.is_file() {
                return Err(StoreError::UnexpectedEntry(path).into());
            }

            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                return Err(StoreError::InvalidTitle(file_name.to_string_lossy().into_owned()).into());
            };
            if file_name == CONNECTIONS_FILE {
                continue;
            }
            let Some(title) = file_name
                .strip_suffix(NODE_EXTENSION)
                .filter(|title| !title.is_empty())
            else {
                return Err(StoreError::NotTextFile(path).into());
            };

            if !is_usable_title(title) {
                return Err(StoreError::InvalidTitle(title.to_string()).into());
            }
            if store.nodes.contains_key(title) {
                return Err(StoreError::DuplicateTitle(title.to_string()).into());
            }

            let bytes = fs::read(&path).map_err(|e| StoreError::io(&path, e))?;
            let body = match String::from_utf8(bytes) {
                Ok(body) => body,
                Err(e) => {
                    warn!(title, "body is not valid UTF-8; invalid bytes replaced");
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };
            store.nodes.insert(title.to_string(), body);
        }

        let text = fs::read_to_string(&conn_path).map_err(|e| StoreError::io(&conn_path, e))?;
        for (number, line) in text.lines().enumerate() {
            let line_no = number + 1;
            if line.is_empty() {
                continue;
            }
            let (a, b) = parse_connection(line, line_no)?;

            for title in [a, b] {
                if !store.nodes.contains_key(title) {
                    return Err(StoreError::UnknownEndpoint {
                        line: line_no,
                        title: title.to_string(),
                    }
                    .into());
                }
            }
            if same_title(a, b) {
                return Err(malformed(line_no, "self-connection"));
            }
            if store.are_connected(a, b) {
                return Err(malformed(line_no, "duplicate connection"));
            }

            store.connections.push((a.to_string(), b.to_string()));
        }

        info!(
            dir = %dir.display(),
            nodes = store.nodes.len(),
            connections = store.connections.len(),
            "loaded graph store"
        );
        Ok(store)
    }

    /// Save into `dir`, replacing its contents atomically.
    ///
    /// Uses `<dir>_tmp` for writing and `<dir>_bak` while swapping.
    pub fn save(&self, dir: &Path) -> Result<()> {
        self.ensure_saveable()?;
        let paths = SwapPaths::for_graph_dir(dir)?;
        swap::replace_dir(&paths, |tmp| self.write_into(tmp))
    }

    /// Write node files and the connections file into an existing, empty
    /// directory. No atomicity; callers wrap this in a swap.
    pub fn write_into(&self, dir: &Path) -> Result<()> {
        self.ensure_saveable()?;

        for (title, body) in &self.nodes {
            let path = dir.join(format!("{title}{NODE_EXTENSION}"));
            fs::write(&path, body).map_err(|e| PersistError::io(&path, e))?;
        }

        let mut text = String::new();
        for (a, b) in &self.connections {
            text.push_str(a);
            text.push('\t');
            text.push_str(b);
            text.push('\n');
        }
        let conn_path = dir.join(CONNECTIONS_FILE);
        fs::write(&conn_path, text).map_err(|e| PersistError::io(&conn_path, e))?;

        debug!(
            dir = %dir.display(),
            nodes = self.nodes.len(),
            connections = self.connections.len(),
            "wrote graph store"
        );
        Ok(())
    }

    fn ensure_saveable(&self) -> Result<()> {
        match self.nodes.keys().find(|title| !is_usable_title(title)) {
            Some(title) => Err(PersistError::InvalidTitle(title.clone()).into()),
            None => Ok(()),
        }
    }

    pub fn contains(&self, title: &str) -> bool {
        self.nodes.contains_key(title)
    }

    pub fn body(&self, title: &str) -> Option<&str> {
        self.nodes.get(title).map(String::as_str)
    }

    /// Index of the connection between `a` and `b`, in either order.
    pub fn connection_position(&self, a: &str, b: &str) -> Option<usize> {
        self.connections.iter().position(|c| same_pair(c, a, b))
    }

    pub fn are_connected(&self, a: &str, b: &str) -> bool {
        self.connection_position(a, b).is_some()
    }

    /// Every connection with `title` as an endpoint, in sequence order.
    pub fn incident_connections(&self, title: &str) -> Vec<(String, String)> {
        self.connections
            .iter()
            .filter(|(a, b)| a == title || b == title)
            .cloned()
            .collect()
    }

    /// Rekey a node and rewrite every connection endpoint that named it.
    /// Returns `false` when `old` does not exist.
    pub fn rename_node(&mut self, old: &str, new: &str) -> bool {
        let Some(body) = self.nodes.remove(old) else {
            return false;
        };
        self.nodes.insert(new.to_string(), body);
        for (a, b) in &mut self.connections {
            if a == old {
                *a = new.to_string();
            }
            if b == old {
                *b = new.to_string();
            }
        }
        true
    }

    pub fn are_all_titles_valid(&self) -> bool {
        self.nodes.keys().all(|title| is_usable_title(title))
    }

    pub fn any_self_connections(&self) -> bool {
        self.connections.iter().any(|(a, b)| same_title(a, b))
    }

    pub fn any_duplicate_connections(&self) -> bool {
        self.connections.iter().enumerate().any(|(i, (a, b))| {
            self.connections[i + 1..]
                .iter()
                .any(|other| same_pair(other, a, b))
        })
    }

    pub fn are_all_connection_references_valid(&self) -> bool {
        self.connections
            .iter()
            .all(|(a, b)| self.nodes.contains_key(a) && self.nodes.contains_key(b))
    }

    /// Check every store invariant, reporting the first one that fails.
    pub fn validate(&self) -> std::result::Result<(), Violation> {
        if let Some(title) = self.nodes.keys().find(|title| !is_usable_title(title)) {
            return Err(Violation::InvalidTitle(title.clone()));
        }

        for (i, (a, b)) in self.connections.iter().enumerate() {
            if same_title(a, b) {
                return Err(Violation::SelfConnection(a.clone(), b.clone()));
            }
            if !self.nodes.contains_key(a) || !self.nodes.contains_key(b) {
                return Err(Violation::DanglingConnection(a.clone(), b.clone()));
            }
            if self.connections[i + 1..].iter().any(|other| same_pair(other, a, b)) {
                return Err(Violation::DuplicateConnection(a.clone(), b.clone()));
            }
        }

        Ok(())
    }
}

fn parse_connection(line: &str, line_no: usize) -> Result<(&str, &str)> {
    let Some((a, b)) = line.split_once('\t') else {
        return Err(malformed(line_no, "no tab delimiter found"));
    };
    if a.is_empty() {
        return Err(malformed(line_no, "first title is empty"));
    }
    if b.is_empty() {
        return Err(malformed(line_no, "second title is empty"));
    }
    if b.contains('\t') {
        return Err(malformed(line_no, "more than one tab delimiter"));
    }
    Ok((a, b))
}

fn malformed(line: usize, reason: &'static str) -> modeller_core::error::ModelError {
    StoreError::MalformedConnection { line, reason }.into()
}
