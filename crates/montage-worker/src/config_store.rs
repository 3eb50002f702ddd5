//! Product configuration lookup.
//!
//! Thresholds tuned by the product team live outside the stage parameters, in
//! a namespace holding JSON sections (`mask_subtitle_cfg`, `text_match_cfg`).

use std::collections::HashMap;
use std::path::Path;

use montage_media::MaskSubtitleConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};

/// Namespace holding the montage generation sections.
pub const GENERATION_NAMESPACE: &str = "montage.generation";

const MASK_SUBTITLE_SECTION: &str = "mask_subtitle_cfg";
const TEXT_MATCH_SECTION: &str = "text_match_cfg";

/// Read-only source of product configuration documents.
pub trait ConfigStore: Send + Sync {
    /// The JSON document stored under `namespace`, if any.
    fn get(&self, namespace: &str) -> Option<Value>;
}

/// In-memory store, filled at construction.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigStore {
    documents: HashMap<String, Value>,
}

impl StaticConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, namespace: impl Into<String>, document: Value) -> Self {
        self.documents.insert(namespace.into(), document);
        self
    }
}

impl ConfigStore for StaticConfigStore {
    fn get(&self, namespace: &str) -> Option<Value> {
        self.documents.get(namespace).cloned()
    }
}

/// Store backed by a JSON file mapping namespaces to documents.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    inner: StaticConfigStore,
}

impl FileConfigStore {
    pub fn from_path(path: impl AsRef<Path>) -> WorkerResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let documents: HashMap<String, Value> = serde_json::from_str(&raw).map_err(|e| {
            WorkerError::config_invalid(path.display().to_string(), e.to_string())
        })?;
        debug!(path = %path.display(), namespaces = documents.len(), "Loaded product config");
        Ok(Self {
            inner: StaticConfigStore { documents },
        })
    }
}

impl ConfigStore for FileConfigStore {
    fn get(&self, namespace: &str) -> Option<Value> {
        self.inner.get(namespace)
    }
}

/// Text-video matching switches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextMatchConfig {
    /// Active speaker detection per request tag.
    #[serde(default)]
    pub need_asd: HashMap<String, bool>,
}

impl TextMatchConfig {
    pub fn need_asd_for(&self, request_tag: &str) -> bool {
        self.need_asd.get(request_tag).copied().unwrap_or(false)
    }
}

fn section<T: DeserializeOwned>(store: &dyn ConfigStore, name: &str) -> WorkerResult<T> {
    let key = format!("{}.{}", GENERATION_NAMESPACE, name);
    let value = store
        .get(GENERATION_NAMESPACE)
        .and_then(|doc| doc.get(name).cloned())
        .ok_or_else(|| WorkerError::config_missing(&key))?;
    serde_json::from_value(value).map_err(|e| WorkerError::config_invalid(key, e.to_string()))
}

/// Mask-subtitle thresholds for the validity classifier.
pub fn mask_subtitle_config(store: &dyn ConfigStore) -> WorkerResult<MaskSubtitleConfig> {
    section(store, MASK_SUBTITLE_SECTION)
}

/// Text-match switches for the temporal matcher.
pub fn text_match_config(store: &dyn ConfigStore) -> WorkerResult<TextMatchConfig> {
    section(store, TEXT_MATCH_SECTION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn generation_doc() -> Value {
        json!({
            "mask_subtitle_cfg": {
                "caption_upper_bound_range": [],
                "subtitle_time_range_th": 0.3,
                "subtitle_pixel_th": [500.0, 80.0],
                "subtitle_center_range": [[0.2, 0.8], [0.4, 0.6]],
                "subtitle_center_type": ["title"],
                "filter_ocr_area_th_rel": 0.4,
                "filter_subtitle_area_th_rel": 0.25
            },
            "text_match_cfg": {"need_asd": {"live": true}}
        })
    }

    #[test]
    fn test_sections_from_static_store() {
        let store = StaticConfigStore::new().with(GENERATION_NAMESPACE, generation_doc());

        let mask = mask_subtitle_config(&store).unwrap();
        assert_eq!(mask.ocr_area_threshold, 0.4);
        assert!(mask.caption_band_lower().is_none());

        let text = text_match_config(&store).unwrap();
        assert!(text.need_asd_for("live"));
        assert!(!text.need_asd_for("default"));
    }

    #[test]
    fn test_missing_section() {
        let store = StaticConfigStore::new().with(GENERATION_NAMESPACE, json!({}));
        let err = mask_subtitle_config(&store).unwrap_err();
        assert!(matches!(err, WorkerError::ConfigMissing(ref key) if key.ends_with("mask_subtitle_cfg")));

        let err = text_match_config(&StaticConfigStore::new()).unwrap_err();
        assert!(matches!(err, WorkerError::ConfigMissing(_)));
    }

    #[test]
    fn test_file_store() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let doc = json!({ "montage.generation": generation_doc() });
        write!(file, "{}", doc).unwrap();

        let store = FileConfigStore::from_path(file.path()).unwrap();
        assert!(text_match_config(&store).is_ok());
        assert!(store.get("other").is_none());
    }

    #[test]
    fn test_file_store_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = FileConfigStore::from_path(file.path()).unwrap_err();
        assert!(matches!(err, WorkerError::ConfigInvalid { .. }));
    }
}
