//! Schema Loading
//!
//! Reads schema files from disk into a [`SchemaStore`], records the directly
//! loaded documents as roots, and resolves references (loading referenced
//! local files on demand).

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;
use walkdir::WalkDir;

use super::{NodeId, SchemaStore};
use crate::error::{Result, TransformError};

/// Schemas loaded for one transform run
#[derive(Debug)]
pub struct LoadedSchemas {
    pub store: SchemaStore,
    /// Documents loaded directly from the inputs, in input order
    pub roots: Vec<NodeId>,
}

/// Loads JSON Schema files
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    /// Base URI that root `$id`s are resolved against
    base_uri: Option<Url>,
    /// Fail on unreadable or unparsable input files instead of skipping them
    strict: bool,
}

impl SchemaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve root `$id`s against `base_uri` (a trailing `/` is implied)
    pub fn with_base_uri(mut self, base_uri: &str) -> Result<Self> {
        let mut base = Url::parse(base_uri).map_err(|source| TransformError::InvalidUri {
            uri: base_uri.to_string(),
            source,
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        self.base_uri = Some(base);
        Ok(self)
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Load every `.json` file named by `inputs`; directories are walked recursively
    pub fn load_paths<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<LoadedSchemas> {
        let mut store = SchemaStore::new();
        let mut roots = Vec::new();

        for input in inputs {
            for path in expand_input(input.as_ref()) {
                if path.extension().map(|ext| ext != "json").unwrap_or(true) {
                    debug!(path = %path.display(), "skipping non-json file");
                    continue;
                }

                info!(path = %path.display(), "parsing file");
                let Some(root) = self.load_file(&mut store, &path)? else {
                    continue;
                };
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
        }

        store.resolve_references(fetch_file);

        Ok(LoadedSchemas { store, roots })
    }

    /// Read and intern one file, honouring strict mode.
    ///
    /// Returns `None` when the file was skipped.
    pub fn load_file(&self, store: &mut SchemaStore, path: &Path) -> Result<Option<NodeId>> {
        let added = read_json(path).and_then(|json| {
            let uri = file_uri(path)?;
            store.add_document_with_base(uri, self.base_uri.as_ref(), &json)
        });

        match added {
            Ok(root) => Ok(Some(root)),
            Err(e) if self.strict => Err(e),
            Err(e) => {
                warn!("could not load {}", path.display());
                debug!("{e}");
                Ok(None)
            }
        }
    }
}

/// Files named by one input: the file itself, or every file below a directory
fn expand_input(input: &Path) -> Vec<PathBuf> {
    if !input.is_dir() {
        return vec![input.to_path_buf()];
    }

    WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|source| TransformError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| TransformError::ParseSchema {
        path: path.to_path_buf(),
        source,
    })
}

fn file_uri(path: &Path) -> Result<Url> {
    let absolute = fs::canonicalize(path).map_err(|source| TransformError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    Url::from_file_path(&absolute).map_err(|()| TransformError::InvalidUri {
        uri: absolute.display().to_string(),
        source: url::ParseError::RelativeUrlWithoutBase,
    })
}

/// Load a referenced document; only local files are ever read
fn fetch_file(uri: &Url) -> Option<Value> {
    if uri.scheme() != "file" {
        debug!(uri = %uri, "not fetching remote document");
        return None;
    }

    let path = uri.to_file_path().ok()?;
    match read_json(&path) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("could not load referenced document {uri}: {e}");
            None
        }
    }
}
