use std::sync::{Arc, PoisonError, RwLock};

use crate::data::{LoadError, SourceFile, Table};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// State shared by every request handler: the currently served table
/// snapshot and where to reload it from.
///
/// Readers clone the `Arc` and run against that snapshot for the rest of
/// the request. A reload parses the file without holding the lock and only
/// takes it to swap the pointer, so readers never see a partial table.
pub struct AppState {
    source: SourceFile,
    default_page_size: usize,
    table: RwLock<Arc<Table>>,
}

impl AppState {
    /// Load the initial table from `source`.
    pub fn load(source: SourceFile, default_page_size: usize) -> Result<Self, LoadError> {
        let table = source.load()?;
        Ok(Self::with_table(source, default_page_size, table))
    }

    pub fn with_table(source: SourceFile, default_page_size: usize, table: Table) -> Self {
        Self {
            source,
            default_page_size,
            table: RwLock::new(Arc::new(table)),
        }
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    /// The table currently being served.
    pub fn snapshot(&self) -> Arc<Table> {
        // The lock only ever guards a complete `Arc`, so a poisoned lock is
        // still safe to read.
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-read the source file and, on success, publish the new table.
    /// On failure the previous table stays in place.
    ///
    /// Blocking: call from a blocking context.
    pub fn reload(&self) -> Result<Arc<Table>, LoadError> {
        let table = Arc::new(self.source.load()?);
        self.install(Arc::clone(&table));
        Ok(table)
    }

    fn install(&self, table: Arc<Table>) {
        let mut current = self.table.write().unwrap_or_else(PoisonError::into_inner);
        *current = table;
    }
}
