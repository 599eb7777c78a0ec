//! Document text encoding and model file writing

pub mod ordered;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use jsmodel_shared::MODEL_EXT;
use tracing::{debug, info};

pub use ordered::{Style, to_ordered_string};

use crate::document::Document;
use crate::error::Result;
use crate::export::ExportResult;

/// Encode a document as order-stable JSON text
pub fn encode_document(document: &Document, style: Style) -> Result<String> {
    let value = serde_json::to_value(document)?;
    Ok(to_ordered_string(&value, style))
}

/// Path of the model file for `name` inside `dir`
pub fn model_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, MODEL_EXT))
}

/// Write `<dir>/<name>.js` and copy textures into `<dir>/<name>/`
///
/// Returns the path of the written model file.
pub fn write_model(result: &ExportResult, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    for texture in &result.textures {
        let destination = dir.join(&texture.destination);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&texture.source, &destination)?;
        debug!("Copied texture {:?} -> {:?}", texture.source, destination);
    }

    let text = encode_document(&result.document, result.style)?;
    let path = model_path(dir, &result.name);

    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;

    info!(
        "Wrote {:?} ({} bytes, {} textures)",
        path,
        text.len(),
        result.textures.len()
    );
    Ok(path)
}
