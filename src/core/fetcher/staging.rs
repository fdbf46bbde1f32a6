use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::core::error::{SkinError, SkinResult};

/// Temporary siblings for a face/helm pair. Nothing is visible at the
/// destinations until [`StagedPair::commit`] succeeds.
#[derive(Debug)]
pub struct StagedPair {
    pub face: PathBuf,
    pub helm: PathBuf,
    face_dest: PathBuf,
    helm_dest: PathBuf,
}

impl StagedPair {
    /// Create the destination directories and pick unique temporary names
    /// next to each destination, so the final rename stays on one filesystem.
    pub async fn prepare(face_dest: &Path, helm_dest: &Path) -> SkinResult<Self> {
        for dest in [face_dest, helm_dest] {
            if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| SkinError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        let tag = Uuid::new_v4().simple().to_string();
        Ok(Self {
            face: temp_sibling(face_dest, "face", &tag),
            helm: temp_sibling(helm_dest, "helm", &tag),
            face_dest: face_dest.to_path_buf(),
            helm_dest: helm_dest.to_path_buf(),
        })
    }

    /// Move both images into place. The helm goes first: the face path is
    /// the cache signal, so it must only appear once its helm exists.
    /// On error the caller still owns the temporaries and should discard them.
    pub async fn commit(&self) -> SkinResult<()> {
        rename(&self.helm, &self.helm_dest).await?;
        if let Err(err) = rename(&self.face, &self.face_dest).await {
            let _ = tokio::fs::remove_file(&self.helm_dest).await;
            return Err(err);
        }
        debug!("Committed {:?} and {:?}", self.face_dest, self.helm_dest);
        Ok(())
    }

    /// Remove whatever temporaries were written.
    pub async fn discard(self) {
        for path in [&self.face, &self.helm] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!("Removed staged {:?}", path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => debug!("Could not remove staged {:?}: {}", path, e),
            }
        }
    }
}

fn temp_sibling(dest: &Path, role: &str, tag: &str) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dest.with_file_name(format!(".{name}.{role}-{tag}.part"))
}

async fn rename(from: &Path, to: &Path) -> SkinResult<()> {
    tokio::fs::rename(from, to)
        .await
        .map_err(|source| SkinError::Io {
            path: to.to_path_buf(),
            source,
        })
}
