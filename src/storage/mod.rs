//! Local Artifact Store
//!
//! Flat category directories under a single storage root. Every file is named
//! `{YYYYMMDD_HHMMSS}_{8 hex}.{ext}` and addressed by the public path
//! `/storage/{category}/{filename}`, which doubles as a lookup key back into
//! the filesystem. There is no index: listings are read from disk each time.

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const PUBLIC_PREFIX: &str = "/storage/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Characters,
    Audio,
    Avatars,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Characters, Category::Audio, Category::Avatars];

    pub fn dir_name(self) -> &'static str {
        match self {
            Category::Characters => "characters",
            Category::Audio => "audio",
            Category::Avatars => "avatars",
        }
    }

    /// Extension a listing is restricted to, if any.
    fn listed_extension(self) -> Option<&'static str> {
        match self {
            Category::Avatars => Some("mp4"),
            _ => None,
        }
    }
}

/// Listing entry returned by the `/api/*/list` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactDescriptor {
    pub id: String,
    pub url: String,
    pub name: String,
    pub created: String,
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifact {
    pub id: String,
    pub public_path: String,
}

#[derive(Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    http_client: reqwest::Client,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, http_client: reqwest::Client) -> Self {
        Self {
            root: root.into(),
            http_client,
        }
    }

    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Creates the three category directories.
    pub async fn ensure_layout(&self) -> AppResult<()> {
        for category in Category::ALL {
            let dir = self.category_dir(category);
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| AppError::io(&dir, e))?;
        }
        info!(root = %self.root.display(), "Storage directories ready");
        Ok(())
    }

    pub async fn save(
        &self,
        content: &[u8],
        category: Category,
        extension: &str,
    ) -> AppResult<StoredArtifact> {
        let id = new_artifact_id();
        let filename = format!("{id}.{extension}");
        let path = self.category_dir(category).join(&filename);

        fs::write(&path, content)
            .await
            .map_err(|e| AppError::io(&path, e))?;

        let public_path = format!("{PUBLIC_PREFIX}{}/{filename}", category.dir_name());
        info!(
            path = %path.display(),
            bytes = content.len(),
            public_path = %public_path,
            "Saved artifact"
        );

        Ok(StoredArtifact { id, public_path })
    }

    /// Fetches `url` and stores the body. No timeout or retry is applied.
    pub async fn download_and_save(
        &self,
        url: &str,
        category: Category,
        extension: &str,
    ) -> AppResult<StoredArtifact> {
        debug!(url = %url, category = category.dir_name(), "Downloading artifact");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::http(url, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::http(url, e))?;

        self.save(&bytes, category, extension).await
    }

    /// Lists a category directory, newest first. A missing directory lists
    /// as empty and subdirectories are skipped.
    pub async fn list(&self, category: Category) -> AppResult<Vec<ArtifactDescriptor>> {
        let dir = self.category_dir(category);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::io(&dir, e)),
        };

        let mut files: Vec<(SystemTime, String, String)> = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::io(&dir, e))?
        {
            let path = entry.path();
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| AppError::io(&path, e))?;
            if !metadata.is_file() {
                continue;
            }

            let extension = path.extension().and_then(|e| e.to_str());
            if let Some(required) = category.listed_extension() {
                if extension != Some(required) {
                    continue;
                }
            }

            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&name)
                .to_string();
            let modified = metadata
                .modified()
                .map_err(|e| AppError::io(&path, e))?;

            files.push((modified, name, stem));
        }

        // Newest first; the timestamped name breaks mtime ties.
        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        Ok(files
            .into_iter()
            .map(|(modified, name, stem)| ArtifactDescriptor {
                url: format!("{PUBLIC_PREFIX}{}/{name}", category.dir_name()),
                id: stem,
                name,
                created: iso_timestamp(modified),
            })
            .collect())
    }

    /// Maps a public path back to its file under the storage root.
    ///
    /// Returns `Ok(None)` for anything that is not a public path, and an
    /// error for public paths that would leave the storage root.
    pub fn local_path(&self, reference: &str) -> AppResult<Option<PathBuf>> {
        let Some(relative) = reference.strip_prefix(PUBLIC_PREFIX) else {
            return Ok(None);
        };

        let relative = Path::new(relative);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(AppError::InvalidReference {
                reference: reference.to_string(),
                reason: "path must stay inside the storage directory".to_string(),
            });
        }

        Ok(Some(self.root.join(relative)))
    }
}

/// `{YYYYMMDD_HHMMSS}_{first 8 hex chars of a v4 UUID}`
pub fn new_artifact_id() -> String {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let random = Uuid::new_v4().simple().to_string();
    format!("{stamp}_{}", &random[..8])
}

/// Extension for a client-supplied upload name: text after the last `.`
/// when it is plain ASCII alphanumeric, otherwise `png`.
pub fn upload_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_string)
        .unwrap_or_else(|| "png".to_string())
}

fn iso_timestamp(time: SystemTime) -> String {
    format_created(DateTime::<Local>::from(time).naive_local())
}

/// Fractional seconds are printed only when the microsecond part is nonzero.
fn format_created(local: NaiveDateTime) -> String {
    if local.nanosecond() / 1_000 == 0 {
        local.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        local.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// File stem of a public path; matches the id of the artifact it names.
pub fn public_path_stem(public_path: &str) -> String {
    Path::new(public_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}
