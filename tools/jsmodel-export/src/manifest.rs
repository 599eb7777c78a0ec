//! Manifest parsing and build orchestration
//!
//! Parses models.toml and exports every model it lists. Relative paths are
//! taken relative to the manifest's directory.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::export::{ExportOptions, export_scene};
use crate::formats::write_model;

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub models: BTreeMap<String, ModelEntry>,
    /// Directory the manifest was loaded from
    #[serde(skip)]
    pub root: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub compact: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            compact: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("models/")
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ModelEntry {
    Simple(PathBuf),
    Detailed {
        scene: PathBuf,
        #[serde(default)]
        select: Vec<String>,
    },
}

impl ModelEntry {
    pub fn scene(&self) -> &Path {
        match self {
            ModelEntry::Simple(p) => p,
            ModelEntry::Detailed { scene, .. } => scene,
        }
    }

    /// Mesh names to export; empty means every mesh
    pub fn select(&self) -> &[String] {
        match self {
            ModelEntry::Simple(_) => &[],
            ModelEntry::Detailed { select, .. } => select,
        }
    }
}

impl Manifest {
    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let mut manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
    manifest.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(manifest)
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    if manifest.models.is_empty() {
        bail!("Manifest lists no models");
    }
    for (name, entry) in &manifest.models {
        let scene = manifest.resolve(entry.scene());
        if !scene.exists() {
            bail!("Model '{}' scene not found: {:?}", name, scene);
        }
    }
    Ok(())
}

/// Export every model in a manifest
///
/// Returns the written model files in name order.
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<Vec<PathBuf>> {
    validate(manifest)?;

    let output_dir = match output_override {
        Some(dir) => dir.to_path_buf(),
        None => manifest.resolve(&manifest.output.dir),
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut written = Vec::with_capacity(manifest.models.len());
    for (name, entry) in &manifest.models {
        let scene = manifest.resolve(entry.scene());
        tracing::info!("Exporting model: {} <- {:?}", name, scene);

        let options = ExportOptions {
            name: name.clone(),
            compact: manifest.output.compact,
            ..Default::default()
        };
        let result = export_scene(&scene, entry.select(), options)
            .with_context(|| format!("Failed to export model '{}'", name))?;
        let path = write_model(&result, &output_dir)
            .with_context(|| format!("Failed to write model '{}'", name))?;
        written.push(path);
    }

    Ok(written)
}
