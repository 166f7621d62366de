//! Configuration and path resolution for the CLI.
//!
//! Resolves where the index lives and which embedding provider to load:
//! - Data directory: `--data-dir`, then `$ARCHIVUM_DATA_DIR`, then the
//!   platform data directory
//! - Model directory (JinaBERT builds only): `$ARCHIVUM_MODEL_DIR`, then
//!   `assets/models` next to the executable

use anyhow::{anyhow, Context, Result};
use archivum_core::config::{IndexConfig, ProviderConfig, INDEX_FILENAME};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable for a custom data directory
const DATA_DIR_ENV: &str = "ARCHIVUM_DATA_DIR";

/// Environment variable for a custom model directory
const MODEL_DIR_ENV: &str = "ARCHIVUM_MODEL_DIR";

/// Model file names
const MODEL_FILENAME: &str = "jina-bert.safetensors";
const TOKENIZER_FILENAME: &str = "jina-bert-tokenizer.json";

/// Returns the data directory holding the index file.
///
/// Platform defaults:
/// - macOS: `~/Library/Application Support/dev.archivum.Archivum/`
/// - Linux: `~/.local/share/archivum/`
/// - Windows: `%APPDATA%\archivum\Archivum\data\`
pub fn get_data_dir(custom_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = custom_dir {
        return Ok(dir.to_path_buf());
    }

    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    ProjectDirs::from("dev", "archivum", "Archivum")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}

/// Returns the path to the index file.
pub fn index_path(custom_dir: Option<&Path>) -> Result<PathBuf> {
    Ok(get_data_dir(custom_dir)?.join(INDEX_FILENAME))
}

/// Finds a directory containing the JinaBERT weights and tokenizer.
pub fn find_model_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(MODEL_DIR_ENV) {
        let path = PathBuf::from(dir);
        if has_model_files(&path) {
            return Some(path);
        }
    }

    let exe = std::env::current_exe().ok()?;
    let exe_dir = exe.parent()?;
    [exe_dir.join("assets/models"), exe_dir.join("../assets/models")]
        .into_iter()
        .find(|p| has_model_files(p))
}

fn has_model_files(dir: &Path) -> bool {
    dir.join(MODEL_FILENAME).exists() && dir.join(TOKENIZER_FILENAME).exists()
}

/// Picks the embedding provider for this build.
///
/// JinaBERT when compiled in and its files are found, the hashing provider
/// otherwise.
pub fn provider_config() -> ProviderConfig {
    if cfg!(feature = "jina") {
        if let Some(dir) = find_model_dir() {
            return ProviderConfig::JinaBert {
                model_path: dir.join(MODEL_FILENAME),
                tokenizer_path: dir.join(TOKENIZER_FILENAME),
            };
        }
        tracing::warn!(
            "JinaBERT model files not found (set ${}), using hashing provider",
            MODEL_DIR_ENV
        );
    }
    ProviderConfig::default()
}

/// Builds the index configuration for a CLI invocation.
///
/// Creates the data directory when a durable index is requested.
pub fn index_config(custom_dir: Option<&Path>, ephemeral: bool) -> Result<IndexConfig> {
    let provider = provider_config();
    if ephemeral {
        return Ok(IndexConfig::ephemeral().with_provider(provider));
    }

    let data_dir = get_data_dir(custom_dir)?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(IndexConfig::at_path(data_dir.join(INDEX_FILENAME)).with_provider(provider))
}
