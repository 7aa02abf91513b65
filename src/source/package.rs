use super::{rows_from_value, Annotation, NewAnnotation, QuerySource};
use crate::data::{display_value, EntityId, Row};
use crate::error::{Result, StrataError};
use crate::manifest::ManifestResponse;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;
use url::Url;

/// An unpacked data package on disk.
///
/// ```text
/// <root>/manifest.json              {"manifest": {...}, "package": {...}}
/// <root>/queries/<name>.json        {"rows": [...]} or [...]
/// <root>/records/<entity>/<id>.json detail records
/// ```
///
/// Annotations live in memory for the lifetime of the source.
#[derive(Debug)]
pub struct PackageDir {
    root: PathBuf,
    annotations: Mutex<AnnotationStore>,
}

#[derive(Debug, Default)]
struct AnnotationStore {
    next_id: i64,
    items: Vec<Annotation>,
}

impl PackageDir {
    /// Open a package directory.
    pub fn open(root: &Path) -> Result<Self> {
        let meta = std::fs::metadata(root).map_err(|e| StrataError::file_open(root.to_path_buf(), e))?;
        if !meta.is_dir() {
            return Err(StrataError::file_open(
                root.to_path_buf(),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }
        Ok(Self {
            root: root.to_path_buf(),
            annotations: Mutex::new(AnnotationStore {
                next_id: 1,
                items: Vec::new(),
            }),
        })
    }

    /// Package root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read_json(&self, path: &Path) -> Result<Value> {
        debug!("reading {}", path.display());
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StrataError::file_open(path.to_path_buf(), e))?;
        serde_json::from_slice(&bytes).map_err(|e| StrataError::json(path.display().to_string(), e))
    }

    /// Map an API path to the record file that serves it.
    fn record_file(&self, path: &str) -> Result<PathBuf> {
        let url = Url::parse("http://package.local/")?.join(path)?;
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let id = url
            .query_pairs()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.into_owned());

        let (entity, id) = match (segments.as_slice(), id) {
            (["api", "auto", "detail", table], Some(id)) => (table.to_string(), id),
            (["api", "composite", view], Some(id)) => (view.to_string(), id),
            (["api", entity, id], _) => (entity.to_string(), id.to_string()),
            _ => return Err(StrataError::record_not_found(path)),
        };
        if entity.contains("..") || id.contains("..") || id.contains('/') {
            return Err(StrataError::record_not_found(path));
        }
        Ok(self.root.join("records").join(entity).join(format!("{id}.json")))
    }

    fn store(&self) -> std::sync::MutexGuard<'_, AnnotationStore> {
        self.annotations.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl QuerySource for PackageDir {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn manifest(&self) -> Result<ManifestResponse> {
        let value = self.read_json(&self.root.join("manifest.json")).await?;
        ManifestResponse::from_value(value)
    }

    async fn execute(&self, query: &str, params: &[(String, String)]) -> Result<Vec<Row>> {
        if query.is_empty() || query.contains(['/', '\\']) || query.contains("..") {
            return Err(StrataError::query_not_found(query));
        }
        let path = self.root.join("queries").join(format!("{query}.json"));
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StrataError::query_not_found(query));
        }
        let value = self.read_json(&path).await?;
        let rows = rows_from_value(value, &path.display().to_string())?;
        Ok(rows
            .into_iter()
            .filter(|row| {
                params.iter().all(|(key, expected)| {
                    row.get(key).map(display_value).as_deref() == Some(expected.as_str())
                })
            })
            .collect())
    }

    async fn fetch_json(&self, path: &str) -> Result<Value> {
        let file = self.record_file(path)?;
        if !tokio::fs::try_exists(&file).await.unwrap_or(false) {
            return Err(StrataError::record_not_found(path));
        }
        self.read_json(&file).await
    }

    async fn annotations(&self, entity_type: &str, entity_id: &EntityId) -> Result<Vec<Annotation>> {
        let store = self.store();
        let mut found: Vec<Annotation> = store
            .items
            .iter()
            .filter(|a| {
                a.entity_type == entity_type
                    && EntityId::from_value(&a.entity_id).as_ref() == Some(entity_id)
            })
            .cloned()
            .collect();
        found.reverse();
        Ok(found)
    }

    async fn create_annotation(&self, annotation: &NewAnnotation) -> Result<Annotation> {
        let mut store = self.store();
        let created = Annotation {
            id: store.next_id,
            entity_type: annotation.entity_type.clone(),
            entity_id: annotation.entity_id.clone(),
            annotation_type: annotation.annotation_type.to_string(),
            content: annotation.content.clone(),
            author: annotation.author.clone(),
            created_at: Some(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
        };
        store.next_id += 1;
        store.items.push(created.clone());
        debug!("created annotation {} on {}", created.id, created.entity_type);
        Ok(created)
    }

    async fn delete_annotation(&self, id: i64) -> Result<()> {
        let mut store = self.store();
        let before = store.items.len();
        store.items.retain(|a| a.id != id);
        if store.items.len() == before {
            return Err(StrataError::record_not_found(format!("/api/annotations/{id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::AnnotationType;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn package() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("manifest.json"),
            json!({
                "manifest": {"views": {"genera": {"type": "table", "source_query": "genera"}}},
                "package": {"name": "trilobase", "version": "1.2"}
            })
            .to_string(),
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("queries")).unwrap();
        fs::write(
            dir.path().join("queries/genera.json"),
            json!({"rows": [
                {"id": 1, "name": "Agnostus", "family_id": 10},
                {"id": 2, "name": "Olenus", "family_id": 11}
            ]})
            .to_string(),
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("records/genus")).unwrap();
        fs::write(
            dir.path().join("records/genus/1.json"),
            json!({"id": 1, "name": "Agnostus"}).to_string(),
        )
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn reads_manifest_and_queries() {
        let dir = package();
        let source = PackageDir::open(dir.path()).unwrap();

        let response = source.manifest().await.unwrap();
        assert_eq!(response.package.unwrap().label(), "trilobase v1.2");
        assert_eq!(response.manifest.views.len(), 1);

        assert_eq!(source.execute("genera", &[]).await.unwrap().len(), 2);
        let filtered = source
            .execute("genera", &[("family_id".to_string(), "11".to_string())])
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["name"], "Olenus");

        assert!(matches!(
            source.execute("missing", &[]).await,
            Err(StrataError::QueryNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn detail_paths_map_to_record_files() {
        let dir = package();
        let source = PackageDir::open(dir.path()).unwrap();

        for path in ["/api/genus/1", "/api/composite/genus?id=1", "/api/auto/detail/genus?id=1"] {
            let record = source.fetch_json(path).await.unwrap();
            assert_eq!(record["name"], "Agnostus", "{path}");
        }
        assert!(matches!(
            source.fetch_json("/api/genus/99").await,
            Err(StrataError::RecordNotFound { .. })
        ));
        assert!(source.fetch_json("/api/genus/..%2F..%2Fmanifest").await.is_err());
    }

    #[tokio::test]
    async fn annotations_are_kept_in_memory() {
        let dir = package();
        let source = PackageDir::open(dir.path()).unwrap();
        let id = EntityId::from(1);

        let first = NewAnnotation::new("genus", &id, AnnotationType::Note, "first", None).unwrap();
        let second =
            NewAnnotation::new("genus", &id, AnnotationType::Link, "second", Some("ana")).unwrap();
        let a = source.create_annotation(&first).await.unwrap();
        let b = source.create_annotation(&second).await.unwrap();
        assert_ne!(a.id, b.id);

        let listed = source.annotations("genus", &id).await.unwrap();
        assert_eq!(listed.iter().map(|a| a.content.as_str()).collect::<Vec<_>>(), ["second", "first"]);
        assert!(source.annotations("family", &id).await.unwrap().is_empty());

        source.delete_annotation(a.id).await.unwrap();
        assert_eq!(source.annotations("genus", &id).await.unwrap().len(), 1);
        assert!(source.delete_annotation(a.id).await.is_err());
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(matches!(
            PackageDir::open(Path::new("/definitely/not/here")),
            Err(StrataError::FileOpen { .. })
        ));
    }
}
