//! Resource suppliers.
//!
//! Archive formats and virtual file systems live outside this crate; all the
//! loaders need is something that can open a stream for a path. A source
//! answers `Ok(None)` for paths it does not have, which is different from a
//! path it has with no content.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Cursor},
    path::PathBuf,
    sync::Arc,
};

use anyhow::Context as _;

use crate::{error::NifError, format::cursor::ReadSeek};

pub type ResourceStream = Box<dyn ReadSeek + Send>;

pub trait ResourceSource: Send + Sync {
    fn open(&self, path: &str) -> anyhow::Result<Option<ResourceStream>>;
}

/// Canonical lookup key: trimmed, forward slashes, lower case, relative.
pub fn normalize_path(path: &str) -> String {
    path.trim()
        .replace('\\', "/")
        .trim_start_matches('/')
        .to_lowercase()
}

/// Files below a root directory. Paths keep their case so that lookups also
/// work on case sensitive file systems.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceSource for DirectorySource {
    fn open(&self, path: &str) -> anyhow::Result<Option<ResourceStream>> {
        let relative = path.trim().replace('\\', "/");
        let full = self.root.join(relative.trim_start_matches('/'));
        if !full.is_file() {
            return Ok(None);
        }
        let file = File::open(&full).with_context(|| format!("opening {}", full.display()))?;
        Ok(Some(Box::new(BufReader::new(file))))
    }
}

/// In-memory files, keyed by normalized path.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    files: HashMap<String, Arc<[u8]>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, bytes: impl Into<Arc<[u8]>>) {
        self.files.insert(normalize_path(path), bytes.into());
    }

    pub fn with_file(mut self, path: &str, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ResourceSource for MemorySource {
    fn open(&self, path: &str) -> anyhow::Result<Option<ResourceStream>> {
        Ok(self
            .files
            .get(&normalize_path(path))
            .map(|bytes| Box::new(Cursor::new(bytes.clone())) as ResourceStream))
    }
}

/// Sources queried in priority order, higher first. Equal priorities keep
/// insertion order.
#[derive(Default)]
pub struct SourceSet {
    sources: Vec<(i32, Box<dyn ResourceSource>)>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, priority: i32, source: impl ResourceSource + 'static) {
        let at = self
            .sources
            .iter()
            .position(|(existing, _)| *existing < priority)
            .unwrap_or(self.sources.len());
        self.sources.insert(at, (priority, Box::new(source)));
    }

    pub fn with_source(mut self, priority: i32, source: impl ResourceSource + 'static) -> Self {
        self.add(priority, source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// First source that has `path`.
    pub fn open(&self, path: &str) -> anyhow::Result<Option<ResourceStream>> {
        for (_, source) in &self.sources {
            if let Some(stream) = source.open(path)? {
                return Ok(Some(stream));
            }
        }
        Ok(None)
    }

    pub fn open_required(&self, path: &str) -> anyhow::Result<ResourceStream> {
        self.open(path)?.ok_or_else(|| {
            NifError::ResourceNotFound {
                path: path.to_string(),
            }
            .into()
        })
    }
}

impl std::fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceSet")
            .field("priorities", &self.sources.iter().map(|(p, _)| *p).collect::<Vec<_>>())
            .finish()
    }
}
