pub mod base;
pub mod classifier;
pub mod document;
pub mod resolver;
pub mod zone;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::balancer::{
    base::{Range, ResolveError, SelectMode},
    document::Document,
    resolver::Resolver,
};

/// Balancing session over a set of open documents.
///
/// Documents are classified eagerly on sync and queried read-only afterward,
/// so resolution calls always see a consistent snapshot.
pub struct Balancer {
    documents: HashMap<PathBuf, Document>,
}

impl Balancer {
    /// Creates a new session with no documents.
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
        }
    }

    /// Classifies a document and stores it, replacing any previous snapshot.
    pub fn sync_document(&mut self, path: &Path, content: &str) {
        self.documents
            .insert(path.to_path_buf(), Document::new(content));
    }

    /// Drops a document from the session.
    pub fn remove_document(&mut self, path: &Path) {
        self.documents.remove(path);
    }

    /// Returns the stored snapshot for a document.
    pub fn document(&self, path: &Path) -> Option<&Document> {
        self.documents.get(path)
    }

    /// Resolves the balancing delimiter for a selection in a stored document.
    pub fn balance(
        &self,
        path: &Path,
        selection: Range,
        mode: SelectMode,
    ) -> Result<Vec<Range>, ResolveError> {
        let document = self
            .documents
            .get(path)
            .ok_or(ResolveError::NotApplicable)?;

        Resolver::new(document).resolve(selection, mode)
    }

    /// Returns true if the selection in a stored document qualifies for balancing.
    pub fn can_balance(&self, path: &Path, selection: Range) -> bool {
        self.documents
            .get(path)
            .map(|document| Resolver::new(document).can_resolve(selection))
            .unwrap_or(false)
    }
}
