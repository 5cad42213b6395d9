use crate::{CatalogError, ProductDocument};
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Top-level files with a `.json` extension, sorted so later names win on
/// duplicate designations.
pub fn discover_json_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_json = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn load_product_document(path: &Path) -> Result<ProductDocument, CatalogError> {
    let raw = fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&raw)?;
    let display = path.display().to_string();

    let root = document
        .as_object()
        .ok_or_else(|| CatalogError::NotAnObject(display.clone()))?;

    let declared = match root.get("designation") {
        None | Some(Value::Null) => None,
        Some(Value::String(value)) => Some(value.trim().to_string()),
        Some(_) => return Err(CatalogError::DesignationType(display)),
    };

    let designation = match declared.filter(|value| !value.is_empty()) {
        Some(value) => value,
        None => path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| CatalogError::MissingFileName(display.clone()))?
            .trim()
            .to_string(),
    };

    if designation.is_empty() {
        return Err(CatalogError::BlankDesignation(display));
    }

    Ok(ProductDocument {
        designation,
        source_path: path.to_path_buf(),
        document,
        raw,
    })
}

fn normalize_designation(designation: &str) -> String {
    designation.trim().to_lowercase()
}

/// An immutable view of the catalog as of one reload.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    products: HashMap<String, Arc<ProductDocument>>,
    loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    fn empty() -> Self {
        Self {
            products: HashMap::new(),
            loaded_at: Utc::now(),
        }
    }

    pub fn lookup(&self, designation: &str) -> Option<Arc<ProductDocument>> {
        self.products
            .get(&normalize_designation(designation))
            .cloned()
    }

    /// Designations in no particular order.
    pub fn designations(&self) -> Vec<String> {
        self.products
            .values()
            .map(|product| product.designation.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReloadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Designation-keyed index over a directory of product JSON files.
///
/// Readers take the current [`CatalogSnapshot`] without locking; `reload`
/// builds a fresh snapshot off to the side and swaps it in whole, so a reader
/// racing a reload sees either the old catalog or the new one.
pub struct CatalogIndex {
    folder: PathBuf,
    current: ArcSwap<CatalogSnapshot>,
}

impl CatalogIndex {
    /// Creates an empty index; call [`CatalogIndex::reload`] to populate it.
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            current: ArcSwap::from_pointee(CatalogSnapshot::empty()),
        }
    }

    /// Creates an index and loads it once.
    pub fn open(folder: impl Into<PathBuf>) -> (Self, ReloadReport) {
        let index = Self::new(folder);
        let report = index.reload();
        (index, report)
    }

    pub fn reload(&self) -> ReloadReport {
        let mut snapshot = CatalogSnapshot::empty();
        let mut report = ReloadReport::default();

        if !self.folder.is_dir() {
            debug!(folder = %self.folder.display(), "catalog folder missing, index left empty");
            self.current.store(Arc::new(snapshot));
            return report;
        }

        for path in discover_json_files(&self.folder) {
            match load_product_document(&path) {
                Ok(product) => {
                    snapshot.products.insert(
                        normalize_designation(&product.designation),
                        Arc::new(product),
                    );
                    report.loaded += 1;
                }
                Err(error) => {
                    warn!(path = %path.display(), reason = %error, "skipped catalog file");
                    report.skipped.push(SkippedFile {
                        path,
                        reason: error.to_string(),
                    });
                }
            }
        }

        info!(
            folder = %self.folder.display(),
            products = snapshot.len(),
            skipped = report.skipped.len(),
            "catalog reloaded"
        );
        self.current.store(Arc::new(snapshot));
        report
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.load_full()
    }

    pub fn lookup(&self, designation: &str) -> Option<Arc<ProductDocument>> {
        self.current.load().lookup(designation)
    }

    pub fn designations(&self) -> Vec<String> {
        self.current.load().designations()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{discover_json_files, load_product_document, CatalogIndex};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn discovery_is_not_recursive() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let nested = dir.path().join("nested");
        fs::create_dir(&nested)?;
        fs::write(dir.path().join("6205.json"), br#"{"bore": 25}"#)?;
        fs::write(dir.path().join("notes.txt"), b"ignore me")?;
        fs::write(nested.join("6206.json"), br#"{"bore": 30}"#)?;

        let files = discover_json_files(dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("6205.json"));
        Ok(())
    }

    #[test]
    fn designation_prefers_field_over_file_name() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let declared = dir.path().join("first.json");
        let blank = dir.path().join("6206.json");
        let absent = dir.path().join("6207.json");
        fs::write(&declared, br#"{"designation": " 6205 ", "bore": 25}"#)?;
        fs::write(&blank, br#"{"designation": "   ", "bore": 30}"#)?;
        fs::write(&absent, br#"{"bore": 35}"#)?;

        assert_eq!(load_product_document(&declared)?.designation, "6205");
        assert_eq!(load_product_document(&blank)?.designation, "6206");
        assert_eq!(load_product_document(&absent)?.designation, "6207");
        Ok(())
    }

    #[test]
    fn corrupt_files_are_skipped_without_aborting() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("6205.json"), br#"{"designation": "6205"}"#)?;
        fs::write(dir.path().join("broken.json"), b"{ not json")?;
        fs::write(dir.path().join("list.json"), b"[1, 2, 3]")?;
        fs::write(dir.path().join("typed.json"), br#"{"designation": 6305}"#)?;

        let (index, report) = CatalogIndex::open(dir.path());

        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(index.designations(), vec!["6205".to_string()]);
        Ok(())
    }

    #[test]
    fn missing_folder_yields_empty_index() {
        let index = CatalogIndex::new("/definitely/not/a/catalog/folder");
        let report = index.reload();

        assert_eq!(report.loaded, 0);
        assert!(index.is_empty());
    }

    #[test]
    fn lookup_is_case_insensitive_and_exact() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.json"), br#"{"designation": "6205-2RSH"}"#)?;

        let (index, _) = CatalogIndex::open(dir.path());

        assert!(index.lookup("6205-2rsh").is_some());
        assert!(index.lookup("  6205-2RSH \n").is_some());
        assert!(index.lookup("6205").is_none());
        assert!(index.lookup("6205-2RSH/C3").is_none());
        Ok(())
    }

    #[test]
    fn later_file_wins_on_duplicate_designation() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.json"), br#"{"designation": "6205", "rev": 1}"#)?;
        fs::write(dir.path().join("b.json"), br#"{"designation": "6205", "rev": 2}"#)?;

        let (index, report) = CatalogIndex::open(dir.path());

        assert_eq!(report.loaded, 2);
        assert_eq!(index.len(), 1);
        let product = index.lookup("6205").ok_or("6205 should be indexed")?;
        assert_eq!(product.document["rev"], 2);
        Ok(())
    }

    #[test]
    fn reload_without_changes_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("6205.json"), br#"{"tolerance_class": "P0"}"#)?;
        fs::write(dir.path().join("6206.json"), br#"{"tolerance_class": "P6"}"#)?;

        let (index, _) = CatalogIndex::open(dir.path());
        let before = index.snapshot();
        index.reload();
        let after = index.snapshot();

        let mut before_keys = before.designations();
        let mut after_keys = after.designations();
        before_keys.sort();
        after_keys.sort();
        assert_eq!(before_keys, after_keys);
        for designation in before_keys {
            assert_eq!(before.lookup(&designation), after.lookup(&designation));
        }
        Ok(())
    }

    #[test]
    fn reload_replaces_the_whole_mapping() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let removed = dir.path().join("6205.json");
        fs::write(&removed, br#"{"bore": 25}"#)?;

        let (index, _) = CatalogIndex::open(dir.path());
        let held = index.snapshot();

        fs::remove_file(&removed)?;
        fs::write(dir.path().join("6206.json"), br#"{"bore": 30}"#)?;
        index.reload();

        assert!(index.lookup("6205").is_none());
        assert!(index.lookup("6206").is_some());
        assert!(held.lookup("6205").is_some());
        assert!(held.lookup("6206").is_none());
        Ok(())
    }
}
