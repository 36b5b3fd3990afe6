//! Late-bound identifier to name resolution for workspace blocks
//!
//! Function definitions arrive as a text blob, one `<id> <name> [goal...]` per
//! line. Each blob is parsed into a fresh table that replaces the published one
//! wholesale; readers load whichever table is current and never see a partial
//! update.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

/// Immutable id to name mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    names: HashMap<i32, String>,
}

impl NameTable {
    /// Parse a definitions blob, skipping malformed lines
    ///
    /// The first whitespace-delimited token is the id, the second the name. Lines
    /// with a non-numeric id or no name are ignored; a later line for the same id
    /// overrides an earlier one.
    pub fn parse(blob: &str) -> Self {
        let mut names = HashMap::new();

        for line in blob.lines() {
            let mut tokens = line.split_whitespace();
            let Some(id_token) = tokens.next() else {
                continue;
            };
            let Ok(id) = id_token.parse::<i32>() else {
                debug!(line, "definition with non-numeric id skipped");
                continue;
            };
            let Some(name) = tokens.next() else {
                debug!(id, "definition without name skipped");
                continue;
            };
            names.insert(id, name.to_string());
        }

        Self { names }
    }

    pub fn get(&self, id: i32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Display name for `id`: the published name, or the decimal id
    pub fn resolve(&self, id: i32) -> String {
        match self.get(id) {
            Some(name) => name.to_string(),
            None => id.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Holder of the currently published [`NameTable`]
#[derive(Debug)]
pub struct NameResolver {
    current: ArcSwap<NameTable>,
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NameResolver {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(NameTable::default()),
        }
    }

    /// Parse `blob` and publish it in place of the current table
    pub fn register(&self, blob: &str) {
        let table = NameTable::parse(blob);
        info!(names = table.len(), "function definitions published");
        self.current.store(Arc::new(table));
    }

    /// The table readers should resolve against right now
    pub fn current(&self) -> Arc<NameTable> {
        self.current.load_full()
    }
}
