//! Manifest loading.
//!
//! The manifest arrives as loose JSON. [`Manifest::from_value`] validates it
//! once into typed [`ViewDef`]s; a view that cannot be understood is logged
//! and left out rather than failing the whole load.

mod raw;
mod section;
mod view;

pub use section::{
    AnnotationTarget, ComputeFn, FieldDef, FieldFormat, LinkDef, LinkedTableDef, SectionDef,
    SectionKind, TaggedListDef,
};
pub use view::{
    ClickTarget, ColumnDef, ColumnType, DetailDef, HierarchyOptions, NestedTableDisplay,
    RankColumn, SortBy, SortDirection, SortSpec, TitleTemplate, TreeDisplay, ValidFilter,
    ValueColumn, ViewDef, ViewKind,
};

use crate::error::{Result, StrataError};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Name and version of the loaded data package.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackageInfo {
    /// Package name.
    pub name: String,
    /// Package version.
    pub version: String,
}

impl PackageInfo {
    /// `"name vX"` as shown in the title bar.
    pub fn label(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{} v{}", self.name, self.version)
        }
    }
}

/// The validated manifest. Immutable after load.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Preferred initial view.
    pub default_view: Option<String>,
    /// Views in manifest order.
    pub views: Vec<ViewDef>,
}

impl Manifest {
    /// Validate a manifest object (`{default_view?, views: {key: def}}`).
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(StrataError::InvalidManifest(
                "manifest must be a JSON object".to_string(),
            ));
        };

        let default_view = match root.remove("default_view") {
            Some(Value::String(key)) if !key.is_empty() => Some(key),
            _ => None,
        };

        let views = match root.remove("views") {
            Some(Value::Object(views)) => views,
            None | Some(Value::Null) => Default::default(),
            Some(_) => {
                return Err(StrataError::InvalidManifest(
                    "manifest 'views' must be an object".to_string(),
                ))
            },
        };

        let views = views
            .into_iter()
            .filter_map(|(key, def)| match raw::parse_view(&key, def) {
                Ok(view) => Some(view),
                Err(e) => {
                    warn!("skipping manifest view '{}': {}", key, e);
                    None
                },
            })
            .collect();

        Ok(Self {
            default_view,
            views,
        })
    }

    /// Look up a view by key.
    pub fn view(&self, key: &str) -> Option<&ViewDef> {
        self.views.iter().find(|v| v.key == key)
    }

    /// Views shown as tabs: everything except detail views.
    pub fn tab_views(&self) -> impl Iterator<Item = &ViewDef> {
        self.views.iter().filter(|v| !v.is_detail())
    }

    /// `default_view` when it names a known view, else the first tab view.
    pub fn initial_view(&self) -> Option<&str> {
        self.default_view
            .as_deref()
            .and_then(|key| self.view(key))
            .map(|v| v.key.as_str())
            .or_else(|| self.tab_views().next().map(|v| v.key.as_str()))
    }
}

/// Payload of the manifest endpoint.
#[derive(Debug, Clone)]
pub struct ManifestResponse {
    /// The validated manifest.
    pub manifest: Manifest,
    /// Package metadata, when the server sends it.
    pub package: Option<PackageInfo>,
}

impl ManifestResponse {
    /// Validate a `{manifest, package?}` payload.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(StrataError::InvalidManifest(
                "manifest response must be a JSON object".to_string(),
            ));
        };
        let manifest = root.remove("manifest").ok_or_else(|| {
            StrataError::InvalidManifest("response has no 'manifest' entry".to_string())
        })?;
        let package = match root.remove("package") {
            Some(Value::Null) | None => None,
            Some(value) => Some(
                serde_json::from_value(value)
                    .map_err(|e| StrataError::json("package info", e))?,
            ),
        };
        Ok(Self {
            manifest: Manifest::from_value(manifest)?,
            package,
        })
    }
}
