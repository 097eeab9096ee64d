use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use walkdir::WalkDir;

/// Which collection a catalog file feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Destination,
    Package,
    Post,
}

impl Kind {
    /// API path the entries are posted to.
    pub fn endpoint(self) -> &'static str {
        match self {
            Kind::Destination => "/api/destinations",
            Kind::Package => "/api/packages",
            Kind::Post => "/api/blog",
        }
    }

    /// Fields the server rejects an entry without.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Kind::Destination => &["name", "country", "region", "description", "startingPrice"],
            Kind::Package => &[
                "title",
                "destination",
                "duration",
                "price",
                "description",
                "difficulty",
                "category",
            ],
            Kind::Post => &["title", "slug", "excerpt", "content", "author", "category"],
        }
    }

    /// First required field that is absent, null or an empty string.
    pub fn missing_field(self, entry: &serde_json::Value) -> Option<&'static str> {
        self.required_fields().iter().copied().find(|field| {
            match entry.get(*field) {
                None | Some(serde_json::Value::Null) => true,
                Some(serde_json::Value::String(s)) => s.is_empty(),
                Some(_) => false,
            }
        })
    }
}

/// One JSON or YAML file of catalog entries.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFile {
    pub kind: Kind,
    #[serde(default)]
    pub entries: Vec<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub catalog: CatalogFile,
}

fn is_catalog_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("json" | "yaml" | "yml")
    )
}

/// Parse a single catalog file, choosing the format by extension.
pub fn load_file(path: &Path) -> Result<CatalogFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let catalog = if path.extension().and_then(|s| s.to_str()) == Some("json") {
        serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))?
    } else {
        serde_yaml::from_str(&raw).with_context(|| format!("Invalid YAML in {}", path.display()))?
    };
    Ok(catalog)
}

/// Walk `root` for catalog files, sorted by path so imports are repeatable.
pub fn scan(root: &Path) -> Result<Vec<LoadedFile>> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_catalog_file(p))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let catalog = load_file(&path)?;
            Ok(LoadedFile { path, catalog })
        })
        .collect()
}
