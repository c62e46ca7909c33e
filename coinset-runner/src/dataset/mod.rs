//! Dataset builder — per-asset files, the index table, and the manifest.
//!
//! Each accepted asset is written to its own CSV, then recorded as a directory
//! entry and a manifest resource. `finish()` writes the index table and the
//! manifest. If the builder is dropped without `finish()` (early return,
//! panic unwinding), `Drop` writes them from whatever was accumulated, so
//! every exit path leaves a consistent index/manifest behind.

pub mod filename;
pub mod manifest;
pub mod tables;

use anyhow::{Context, Result};
use coinset_core::schema::{dictionary_fields, directory_fields};
use coinset_core::{canonical_fields, derive_schema, AssetCandidate, EnrichedTable, FieldDescriptor};
use std::path::{Path, PathBuf};

use crate::backfill::AssetSink;

pub use filename::{base_filename, sanitize, FilenameRegistry};
pub use manifest::{DatasetManifest, ManifestInfo, ManifestResource};
pub use tables::DirectoryEntry;

pub const INDEX_FILE: &str = "index.csv";
pub const MANIFEST_FILE: &str = "dataset-metadata.json";
pub const DICTIONARY_FILE: &str = "data_dictionary.csv";

/// Paths written by `finish()`.
#[derive(Debug, Clone)]
pub struct DatasetPaths {
    pub output_dir: PathBuf,
    pub index: PathBuf,
    pub manifest: PathBuf,
    pub dictionary: Option<PathBuf>,
}

/// Accumulates directory entries and manifest resources for one run.
pub struct DatasetBuilder {
    output_dir: PathBuf,
    info: ManifestInfo,
    canonical: Vec<FieldDescriptor>,
    entries: Vec<DirectoryEntry>,
    resources: Vec<ManifestResource>,
    filenames: FilenameRegistry,
    fingerprint: blake3::Hasher,
    finished: bool,
}

impl DatasetBuilder {
    /// Create the builder, creating `output_dir` if needed.
    pub fn new(output_dir: impl AsRef<Path>, info: ManifestInfo) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir).with_context(|| {
            format!("Failed to create output directory {}", output_dir.display())
        })?;

        let mut filenames = FilenameRegistry::new();
        filenames.reserve(INDEX_FILE);
        filenames.reserve(MANIFEST_FILE);
        filenames.reserve(DICTIONARY_FILE);

        let canonical = canonical_fields(&info.quote_currency);
        Ok(Self {
            output_dir,
            info,
            canonical,
            entries: Vec::new(),
            resources: Vec::new(),
            filenames,
            fingerprint: blake3::Hasher::new(),
            finished: false,
        })
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn resources(&self) -> &[ManifestResource] {
        &self.resources
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// BLAKE3 over every asset file written so far, in write order.
    pub fn fingerprint(&self) -> String {
        self.fingerprint.finalize().to_hex().to_string()
    }

    /// Write one asset table and record it. Returns the filename used.
    pub fn add_asset(&mut self, candidate: &AssetCandidate, table: &EnrichedTable) -> Result<String> {
        let filename = self.filenames.propose(&candidate.identifier, &candidate.symbol);
        let base = base_filename(&candidate.identifier, &candidate.symbol);
        if filename != base {
            tracing::warn!(
                id = %candidate.identifier,
                wanted = %base,
                using = %filename,
                "filename collision; using suffixed name"
            );
        }

        let bytes = tables::asset_csv(table)?;
        write_replacing(&self.output_dir.join(&filename), &bytes)?;

        self.filenames.claim(&filename);
        self.fingerprint.update(filename.as_bytes());
        self.fingerprint.update(&bytes);

        let name = candidate.label().to_string();
        let schema = derive_schema(&self.canonical, &table.column_names());
        self.resources.push(ManifestResource::new(
            filename.clone(),
            manifest::asset_description(&name, &candidate.symbol, table.len(), &self.info.quote_currency.to_uppercase()),
            schema,
        ));
        self.entries.push(DirectoryEntry {
            index: self.entries.len() + 1,
            name,
            filename: filename.clone(),
        });
        Ok(filename)
    }

    /// Manifest for the current state: asset resources, then the index
    /// resource, then the dictionary resource when enabled.
    pub fn manifest(&self) -> DatasetManifest {
        let mut resources = self.resources.clone();
        resources.push(ManifestResource::new(
            INDEX_FILE,
            manifest::index_description(),
            directory_fields(),
        ));
        if let Some(dict) = &self.info.dictionary_file {
            resources.push(ManifestResource::new(
                dict.clone(),
                manifest::dictionary_description(),
                dictionary_fields(),
            ));
        }
        manifest::build_manifest(&self.info, resources, self.entries.len())
    }

    fn flush(&self) -> Result<DatasetPaths> {
        let index = self.output_dir.join(INDEX_FILE);
        let bytes = tables::index_csv(&self.entries)?;
        std::fs::write(&index, bytes)
            .with_context(|| format!("Failed to write {}", index.display()))?;

        let dictionary = match &self.info.dictionary_file {
            Some(name) => {
                let path = self.output_dir.join(name);
                std::fs::write(&path, tables::dictionary_csv(&self.canonical)?)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                Some(path)
            }
            None => None,
        };

        let manifest_path = self.output_dir.join(MANIFEST_FILE);
        manifest::write_manifest(&manifest_path, &self.manifest())?;

        Ok(DatasetPaths {
            output_dir: self.output_dir.clone(),
            index,
            manifest: manifest_path,
            dictionary,
        })
    }

    /// Write the index table and manifest. Idempotent.
    pub fn finish(&mut self) -> Result<DatasetPaths> {
        let paths = self.flush()?;
        self.finished = true;
        tracing::info!(
            assets = self.entries.len(),
            manifest = %paths.manifest.display(),
            "dataset index and manifest written"
        );
        Ok(paths)
    }
}

/// Write through a sibling `.partial` file and rename into place. A failed
/// write leaves neither file behind.
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<()> {
    let partial = path.with_extension("csv.partial");
    if let Err(e) = std::fs::write(&partial, bytes).and_then(|()| std::fs::rename(&partial, path)) {
        if partial.exists() {
            if let Err(cleanup) = std::fs::remove_file(&partial) {
                tracing::warn!(file = %partial.display(), "failed to remove partial file: {cleanup}");
            }
        }
        return Err(e).with_context(|| format!("Failed to write {}", path.display()));
    }
    Ok(())
}

impl AssetSink for DatasetBuilder {
    fn accept(&mut self, candidate: &AssetCandidate, table: EnrichedTable) -> Result<()> {
        self.add_asset(candidate, &table).map(|_| ())
    }
}

impl Drop for DatasetBuilder {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match self.flush() {
            Ok(paths) => tracing::warn!(
                assets = self.entries.len(),
                manifest = %paths.manifest.display(),
                "dataset flushed at teardown"
            ),
            Err(e) => tracing::error!("failed to flush dataset at teardown: {e:#}"),
        }
    }
}
