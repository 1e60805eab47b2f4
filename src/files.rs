//! Resource file area
//!
//! Downloadable binaries live under a single root directory and are
//! addressed by the resource's relative `file_path`.

use std::path::{Component, Path, PathBuf};

use crate::types::{ApiError, Result};

/// A resource file ready to be sent to the client
#[derive(Debug, Clone)]
pub struct ResourceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct ResourceFiles {
    root: PathBuf,
}

impl ResourceFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a relative path onto the root.
    ///
    /// Absolute paths and `..` segments resolve to nothing, so a crafted
    /// `file_path` cannot escape the root.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let mut resolved = self.root.clone();
        let mut has_segment = false;

        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    resolved.push(segment);
                    has_segment = true;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        has_segment.then_some(resolved)
    }

    /// Locate an existing regular file, or fail with "File not found"
    pub async fn locate(&self, relative: &str) -> Result<ResourceFile> {
        let path = self.resolve(relative).ok_or_else(ApiError::file_not_found)?;

        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(ApiError::file_not_found()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ApiError::file_not_found())
            }
            Err(e) => return Err(e.into()),
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());

        Ok(ResourceFile {
            path,
            file_name,
            size: meta.len(),
        })
    }

    /// Write a file under the root, creating parent directories
    pub async fn write(&self, relative: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self
            .resolve(relative)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid resource path: {}", relative)))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }
}

impl ResourceFile {
    pub async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ApiError::file_not_found()
            } else {
                e.into()
            }
        })
    }
}
