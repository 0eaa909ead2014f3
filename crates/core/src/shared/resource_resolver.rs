use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::constants::{APP_DIR_NAME, AUDIO_EXTENSIONS, RESOURCES_DIR_NAME};

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("resource not found: {0} (not a file, not under the resources directory, not a URL)")]
    NotFound(String),
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("download failed for {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("failed to write resource to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to list {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine {0} directory")]
    NoPlatformDir(&'static str),
}

/// Resolves noise and impulse-response references to local files.
///
/// Resolution order:
/// 1. An existing local path, used as-is
/// 2. A path relative to the resources directory
/// 3. An `http(s)://` URL, downloaded once into the cache directory
#[derive(Clone, Debug)]
pub struct ResourceResolver {
    resources_dir: PathBuf,
    cache_dir: PathBuf,
}

impl ResourceResolver {
    pub fn new(resources_dir: PathBuf, cache_dir: PathBuf) -> Self {
        Self {
            resources_dir,
            cache_dir,
        }
    }

    pub fn resources_dir(&self) -> &Path {
        &self.resources_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn resolve(&self, reference: &str) -> Result<PathBuf, ResourceError> {
        let local = Path::new(reference);
        if local.is_file() {
            return Ok(local.to_path_buf());
        }

        let relative = self.resources_dir.join(reference);
        if relative.is_file() {
            return Ok(relative);
        }

        if is_url(reference) {
            let cached = self.cache_dir.join(cache_file_name(reference));
            if cached.is_file() {
                log::debug!("Using cached {}", cached.display());
                return Ok(cached);
            }
            fs::create_dir_all(&self.cache_dir).map_err(ResourceError::CacheDir)?;
            log::info!("Downloading {reference}");
            download(reference, &cached)?;
            return Ok(cached);
        }

        Err(ResourceError::NotFound(reference.to_string()))
    }

    /// Audio files under the resources directory, as sorted relative paths
    /// usable in `mix` and `convolution`. A missing directory lists nothing.
    pub fn list(&self) -> Result<Vec<PathBuf>, ResourceError> {
        let mut found = Vec::new();
        if self.resources_dir.is_dir() {
            collect_audio_files(&self.resources_dir, &self.resources_dir, &mut found)?;
        }
        found.sort();
        Ok(found)
    }
}

/// `<data dir>/audio-degrader/resources`.
pub fn default_resources_dir() -> Result<PathBuf, ResourceError> {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME).join(RESOURCES_DIR_NAME))
        .ok_or(ResourceError::NoPlatformDir("data"))
}

/// `<cache dir>/audio-degrader/resources`.
pub fn default_cache_dir() -> Result<PathBuf, ResourceError> {
    dirs::cache_dir()
        .map(|d| d.join(APP_DIR_NAME).join(RESOURCES_DIR_NAME))
        .ok_or(ResourceError::NoPlatformDir("cache"))
}

fn is_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Flattens a URL into a single file name, keeping its extension.
fn cache_file_name(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn collect_audio_files(
    root: &Path,
    dir: &Path,
    out: &mut Vec<PathBuf>,
) -> Result<(), ResourceError> {
    let list_err = |source| ResourceError::List {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        if path.is_dir() {
            collect_audio_files(root, &path, out)?;
        } else if has_audio_extension(&path) {
            if let Ok(relative) = path.strip_prefix(root) {
                out.push(relative.to_path_buf());
            }
        }
    }
    Ok(())
}

fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn download(url: &str, dest: &Path) -> Result<(), ResourceError> {
    let download_err = |source| ResourceError::Download {
        url: url.to_string(),
        source,
    };
    let response = reqwest::blocking::get(url).map_err(download_err)?;
    if !response.status().is_success() {
        return Err(ResourceError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }
    let bytes = response.bytes().map_err(download_err)?;

    // Write to a temp file first, then rename for atomicity
    let temp_path = dest.with_extension("part");
    let write_err = |source| ResourceError::Write {
        path: temp_path.clone(),
        source,
    };
    let written = fs::File::create(&temp_path)
        .and_then(|mut file| file.write_all(&bytes).and_then(|_| file.flush()));
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(write_err(e));
    }

    fs::rename(&temp_path, dest).map_err(|source| ResourceError::Write {
        path: dest.to_path_buf(),
        source,
    })?;
    log::debug!("Saved {} bytes to {}", bytes.len(), dest.display());
    Ok(())
}
