//! jsmodel-export - JSON model exporter
//!
//! Converts scene descriptions (meshes, skins, keyed joints) to JSON model
//! format 3.1 documents (.js) with their textures.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use jsmodel_export::formats::model_path;
use jsmodel_export::scene::SceneSource;
use jsmodel_export::{ExportOptions, SceneDescription, export_scene, manifest, write_model};

#[derive(Parser)]
#[command(name = "jsmodel-export")]
#[command(about = "JSON model format 3.1 exporter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build models from a manifest file
    Build {
        /// Path to models.toml manifest
        #[arg(default_value = "models.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest without building
    Check {
        /// Path to models.toml manifest
        #[arg(default_value = "models.toml")]
        manifest: PathBuf,
    },

    /// Export a single model from a scene description
    Model {
        /// Input scene description (.json)
        input: PathBuf,

        /// Output .js file (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Model name (default: output file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Mesh to export, repeatable (default: every mesh)
        #[arg(short, long = "select")]
        select: Vec<String>,

        /// Write without whitespace
        #[arg(long)]
        compact: bool,
    },

    /// List meshes, skins and keyed joints in a scene description
    List {
        /// Input scene description (.json)
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building models from {:?}", manifest);
            }
            let config = manifest::load_manifest(&manifest)?;
            let written = manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete! {} models written", written.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Model {
            input,
            output,
            name,
            select,
            compact,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension(jsmodel_export::MODEL_EXT));
            let name = match name {
                Some(name) => name,
                None => output
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .context("Output path has no file name")?
                    .to_string(),
            };
            let dir = output
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            if model_path(&dir, &name) != output {
                anyhow::bail!(
                    "Output {:?} must be named '{}.{}' (use --name to change the model name)",
                    output,
                    name,
                    jsmodel_export::MODEL_EXT
                );
            }

            tracing::info!("Exporting {:?} -> {:?}", input, output);
            let options = ExportOptions {
                name,
                compact,
                ..Default::default()
            };
            let result = export_scene(&input, &select, options)
                .with_context(|| format!("Failed to export {:?}", input))?;
            write_model(&result, &dir)?;
            tracing::info!("Done!");
        }

        Commands::List { input } => list_scene(&input)?,
    }

    Ok(())
}

/// Log the contents of a scene description
fn list_scene(input: &std::path::Path) -> Result<()> {
    let scene = SceneDescription::load(input)?;
    let rate = scene.frame_rate()?;

    tracing::info!("Scene {:?} ({}):", input, rate);
    for mesh in &scene.meshes {
        let skin = match &mesh.skin {
            Some(skin) => format!(", skinned to {} joints", skin.influences.len()),
            None => String::new(),
        };
        tracing::info!(
            "  mesh '{}': {} vertices, {} faces{}",
            mesh.name,
            mesh.positions.len(),
            mesh.faces.len(),
            skin
        );
    }

    let keyed: Vec<&str> = scene
        .joints
        .iter()
        .filter(|j| !j.keys.is_empty())
        .map(|j| j.name.as_str())
        .collect();
    tracing::info!(
        "  {} transform nodes, {} keyed: {:?}",
        scene.joints.len(),
        keyed.len(),
        keyed
    );

    Ok(())
}
