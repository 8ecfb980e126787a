//! Artifact files
//!
//! Each artifact is one pretty-printed JSON file under the artifact
//! directory. Writes go to a uniquely named temporary file first and are
//! renamed over the target, so readers see either the old or the new
//! content in full. There is no locking: concurrent writers of the same
//! file race and the last rename wins.

use crate::error::{CloudError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;

const TMP_SUFFIX: &str = ".tmp";

/// Reads and writes artifacts in one directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    async fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).await?;
            tracing::debug!("Created artifact directory: {}", self.dir.display());
        }
        Ok(())
    }

    /// Serialize `value` and replace `file_name` with it
    pub async fn write<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> Result<PathBuf> {
        let content = serde_json::to_string_pretty(value)?;
        self.write_raw(file_name, content).await
    }

    async fn write_raw(&self, file_name: &str, mut content: String) -> Result<PathBuf> {
        self.ensure_dir().await?;
        content.push('\n');

        let dir = self.dir.clone();
        let path = self.path(file_name);
        let target = path.clone();
        let prefix = format!("{}.", file_name);

        // The temp file is removed on drop if anything before persist fails
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(TMP_SUFFIX)
                .tempfile_in(&dir)?;
            tmp.write_all(content.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| CloudError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| CloudError::Artifact(format!("writing {} did not finish: {}", file_name, e)))??;

        tracing::debug!("Wrote artifact {}", path.display());
        Ok(path)
    }

    /// Read and parse `file_name`
    pub async fn read<T: DeserializeOwned>(&self, file_name: &str) -> Result<T> {
        let content = self.read_raw(file_name).await?;
        Ok(serde_json::from_str(&content)?)
    }

    pub(crate) async fn read_raw(&self, file_name: &str) -> Result<String> {
        let path = self.path(file_name);
        if !path.exists() {
            return Err(CloudError::Artifact(format!(
                "{} does not exist",
                path.display()
            )));
        }
        Ok(fs::read_to_string(&path).await?)
    }
}

/// Restrict an identifier to characters safe in a file name
pub fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File names of every artifact opsdeck writes
pub mod names {
    use super::sanitize_id;
    use crate::catalog::CatalogKind;

    pub fn catalog(kind: CatalogKind) -> String {
        kind.file_name()
    }

    pub fn instance_detail(instance_id: &str) -> String {
        format!("instance_{}.json", sanitize_id(instance_id))
    }

    pub fn instance_usage(instance_id: &str) -> String {
        format!("usage_{}.json", sanitize_id(instance_id))
    }

    pub fn quota(project_id: &str) -> String {
        format!("quota_{}.json", sanitize_id(project_id))
    }

    pub const VOLUME_COST: &str = "volume_cost.json";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogKind;
    use serde::Deserialize;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        size: u64,
    }

    #[tokio::test]
    async fn test_write_replaces_previous_content() {
        let temp_dir = tempdir().unwrap();
        let store = ArtifactStore::new(temp_dir.path().join("artifacts"));

        let first = vec![
            Row { id: "a".to_string(), size: 1 },
            Row { id: "b".to_string(), size: 2 },
        ];
        store.write("rows.json", &first).await.unwrap();

        let second = vec![Row { id: "c".to_string(), size: 3 }];
        let path = store.write("rows.json", &second).await.unwrap();

        let loaded: Vec<Row> = store.read("rows.json").await.unwrap();
        assert_eq!(loaded, second);

        let raw = std::fs::read_to_string(path).unwrap();
        assert!(raw.starts_with("[\n  {"), "expected pretty JSON, got {}", raw);
    }

    #[tokio::test]
    async fn test_write_leaves_no_temp_files() {
        let temp_dir = tempdir().unwrap();
        let store = ArtifactStore::new(temp_dir.path());

        store.write("rows.json", &Vec::<Row>::new()).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["rows.json".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_writes_of_one_file() {
        let temp_dir = tempdir().unwrap();
        let store = Arc::new(ArtifactStore::new(temp_dir.path()));

        let mut handles = Vec::new();
        for writer in 0..4u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for size in 0..50u64 {
                    let rows = vec![Row { id: format!("w{}", writer), size }];
                    store.write("rows.json", &rows).await?;
                }
                Ok::<_, CloudError>(())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let loaded: Vec<Row> = store.read("rows.json").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].size, 49);

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["rows.json".to_string()]);
    }

    #[tokio::test]
    async fn test_read_missing_artifact() {
        let temp_dir = tempdir().unwrap();
        let store = ArtifactStore::new(temp_dir.path());

        let result = store.read::<Vec<Row>>("nothing.json").await;
        assert!(matches!(result, Err(CloudError::Artifact(_))));
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(names::catalog(CatalogKind::Volumes), "volumes.json");
        assert_eq!(names::instance_detail("i-1"), "instance_i-1.json");
        assert_eq!(names::instance_usage("../etc/passwd"), "usage_.._etc_passwd.json");
        assert_eq!(names::quota("9f1c 2a"), "quota_9f1c_2a.json");
    }
}
