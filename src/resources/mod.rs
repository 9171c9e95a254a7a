//! Loading `.nif` files from resource suppliers.
//!
//! Decoding a file is independent of every other file, so batches are decoded
//! in parallel on Tokio's blocking pool. Building scenes from the decoded
//! files stays on the caller's thread, see [`crate::flow`].

use std::sync::Arc;

use anyhow::Context as _;
use log::{debug, warn};

use crate::{
    context::Context,
    format::{cursor::BinaryReader, file::NifFile},
};

pub mod source;

pub use source::{DirectorySource, MemorySource, ResourceSource, ResourceStream, SourceSet, normalize_path};

/// Opens `path` from the highest priority source that has it and decodes it.
pub fn load_nif(sources: &SourceSet, path: &str, context: &Context) -> anyhow::Result<NifFile> {
    let stream = sources.open_required(path)?;
    let reader = BinaryReader::new(stream, path)?;
    let file = NifFile::read(reader, &context.registry).with_context(|| format!("decoding {path}"))?;
    debug!(
        "{}: decoded {} blocks ({} unsupported)",
        path,
        file.len(),
        file.unsupported_count()
    );
    Ok(file)
}

/// Decodes several files in parallel. Results are in the order of `paths`;
/// one failing file does not affect the others.
pub async fn load_nifs(
    sources: Arc<SourceSet>,
    paths: &[String],
    context: &Context,
) -> Vec<anyhow::Result<NifFile>> {
    let tasks = paths.iter().cloned().map(|path| {
        let sources = sources.clone();
        let context = context.clone();
        tokio::task::spawn_blocking(move || load_nif(&sources, &path, &context))
    });
    futures::future::join_all(tasks)
        .await
        .into_iter()
        .zip(paths)
        .map(|(joined, path)| {
            let result = joined
                .with_context(|| format!("loading {path}"))
                .and_then(|result| result);
            if let Err(e) = &result {
                warn!("{:#}", e);
            }
            result
        })
        .collect()
}
