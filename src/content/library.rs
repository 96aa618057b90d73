//! Manifest-driven lesson document library
//!
//! The second content representation: a YAML manifest lists modules, named
//! sections, and the lesson files belonging to them. Each lesson file starts
//! with a `---` delimited YAML front-matter block followed by free-form body
//! text.
//!
//! Nothing here is cached: every call reloads the manifest and documents from
//! disk. That is a deliberate latency/consistency tradeoff carried over from
//! the original design, not an oversight.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::ContentError;

/// Manifest of the whole content tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentManifest {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub modules: Vec<ManifestModule>,
    #[serde(default)]
    pub assessments: Assessments,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestModule {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sections: Vec<ManifestSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSection {
    #[serde(default)]
    pub title: String,
    /// Ordered lesson file paths, relative to the library root
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assessments {
    #[serde(default)]
    pub quizzes: Vec<String>,
    #[serde(default)]
    pub exams: Vec<String>,
    #[serde(default)]
    pub exercises: Vec<String>,
}

/// A parsed lesson document: front-matter metadata plus body text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDocument {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub module: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub min_level: String,
    #[serde(default, rename = "targetOS")]
    pub target_os: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
    #[serde(default)]
    pub body: String,
}

/// File-backed document store rooted at a manifest path
#[derive(Debug, Clone)]
pub struct ContentLibrary {
    manifest_path: PathBuf,
    root: PathBuf,
}

impl ContentLibrary {
    /// `root` is the directory manifest item paths are resolved against.
    pub fn new(manifest_path: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            root: root.into(),
        }
    }

    /// Reload the manifest from disk.
    pub fn manifest(&self) -> Result<ContentManifest, ContentError> {
        let raw = std::fs::read_to_string(&self.manifest_path).map_err(|source| {
            ContentError::Io {
                path: self.manifest_path.clone(),
                source,
            }
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ContentError::Yaml {
            path: self.manifest_path.clone(),
            source,
        })
    }

    /// Load every document referenced by the manifest, in manifest order,
    /// keeping those that match the optional level and OS filters.
    pub fn all_documents(
        &self,
        level: Option<&str>,
        target_os: Option<&str>,
    ) -> Result<Vec<ContentDocument>, ContentError> {
        let manifest = self.manifest()?;
        let mut documents = Vec::new();
        for module in &manifest.modules {
            for section in &module.sections {
                for item in &section.items {
                    let doc = self.load_document(&self.root.join(item))?;
                    if matches_level(&doc, level) && matches_os(&doc, target_os) {
                        documents.push(doc);
                    }
                }
            }
        }
        Ok(documents)
    }

    /// Find one document by id, loading the full set to resolve it.
    pub fn document_by_id(&self, id: &str) -> Result<ContentDocument, ContentError> {
        self.all_documents(None, None)?
            .into_iter()
            .find(|doc| doc.id == id)
            .ok_or_else(|| ContentError::NotFound(id.to_string()))
    }

    /// Filtered documents grouped by module name. Module ordering within the
    /// map is not guaranteed.
    pub fn documents_by_module(
        &self,
        level: Option<&str>,
        target_os: Option<&str>,
    ) -> Result<HashMap<String, Vec<ContentDocument>>, ContentError> {
        let mut grouped: HashMap<String, Vec<ContentDocument>> = HashMap::new();
        for doc in self.all_documents(level, target_os)? {
            grouped.entry(doc.module.clone()).or_default().push(doc);
        }
        Ok(grouped)
    }

    /// Parse one lesson file: leading `---` YAML block, then the body.
    pub fn load_document(&self, path: &Path) -> Result<ContentDocument, ContentError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = raw.trim_start_matches('\u{feff}');
        let Some(rest) = trimmed.strip_prefix("---") else {
            return Err(ContentError::MissingFrontMatter(path.to_path_buf()));
        };
        let Some(end) = rest.find("---") else {
            return Err(ContentError::UnterminatedFrontMatter(path.to_path_buf()));
        };
        let front_matter = &rest[..end];
        let body = rest[end + 3..].trim();

        let mut doc: ContentDocument =
            serde_yaml::from_str(front_matter).map_err(|source| ContentError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        doc.body = body.to_string();
        Ok(doc)
    }
}

fn matches_level(doc: &ContentDocument, level: Option<&str>) -> bool {
    match level {
        None => true,
        Some(filter) => doc.min_level.eq_ignore_ascii_case(filter),
    }
}

fn matches_os(doc: &ContentDocument, target_os: Option<&str>) -> bool {
    match target_os {
        None => true,
        Some(filter) => {
            doc.target_os.eq_ignore_ascii_case("any") || doc.target_os.eq_ignore_ascii_case(filter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const LESSON: &str = "---\n\
id: own-1\n\
title: Ownership\n\
summary: Moves and borrows\n\
module: rust-basics\n\
type: lesson\n\
minLevel: NEWBIE\n\
targetOS: any\n\
order: 1\n\
tags: [memory, basics]\n\
estimatedMinutes: 20\n\
---\n\
Every value has a single owner.\n";

    const LINUX_LESSON: &str = "---\n\
id: perf-1\n\
title: perf basics\n\
module: tooling\n\
minLevel: PRO\n\
targetOS: linux\n\
---\n\
Profile first.\n";

    fn library() -> (TempDir, ContentLibrary) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("lessons")).unwrap();
        fs::write(dir.path().join("lessons/ownership.md"), LESSON).unwrap();
        fs::write(dir.path().join("lessons/perf.md"), LINUX_LESSON).unwrap();
        fs::write(
            dir.path().join("manifest.yaml"),
            "version: 1\n\
             modules:\n  \
             - id: rust-basics\n    \
             title: Rust Basics\n    \
             sections:\n      \
             - title: Memory\n        \
             items: [lessons/ownership.md]\n  \
             - id: tooling\n    \
             title: Tooling\n    \
             sections:\n      \
             - title: Profiling\n        \
             items: [lessons/perf.md]\n\
             assessments:\n  \
             quizzes: [quiz-1]\n",
        )
        .unwrap();
        let lib = ContentLibrary::new(dir.path().join("manifest.yaml"), dir.path());
        (dir, lib)
    }

    #[test]
    fn test_manifest_roundtrip() {
        let (_dir, lib) = library();
        let manifest = lib.manifest().unwrap();
        assert_eq!(manifest.version, 1);
        assert_eq!(manifest.modules.len(), 2);
        assert_eq!(manifest.assessments.quizzes, vec!["quiz-1"]);
    }

    #[test]
    fn test_front_matter_parsing() {
        let (_dir, lib) = library();
        let docs = lib.all_documents(None, None).unwrap();
        assert_eq!(docs.len(), 2);
        let doc = &docs[0];
        assert_eq!(doc.id, "own-1");
        assert_eq!(doc.module, "rust-basics");
        assert_eq!(doc.order, 1);
        assert_eq!(doc.tags, vec!["memory", "basics"]);
        assert_eq!(doc.estimated_minutes, Some(20));
        assert_eq!(doc.body, "Every value has a single owner.");
    }

    #[test]
    fn test_level_and_os_filters() {
        let (_dir, lib) = library();
        let pro = lib.all_documents(Some("pro"), None).unwrap();
        assert_eq!(pro.len(), 1);
        assert_eq!(pro[0].id, "perf-1");

        // "any" documents pass every OS filter; "linux" only passes linux.
        let windows = lib.all_documents(None, Some("windows")).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].id, "own-1");
        let linux = lib.all_documents(None, Some("LINUX")).unwrap();
        assert_eq!(linux.len(), 2);
    }

    #[test]
    fn test_document_by_id() {
        let (_dir, lib) = library();
        assert_eq!(lib.document_by_id("perf-1").unwrap().title, "perf basics");
        assert!(matches!(
            lib.document_by_id("ghost"),
            Err(ContentError::NotFound(_))
        ));
    }

    #[test]
    fn test_documents_by_module() {
        let (_dir, lib) = library();
        let grouped = lib.documents_by_module(None, None).unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["rust-basics"][0].id, "own-1");
    }

    #[test]
    fn test_missing_front_matter_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.md"), "no front matter here").unwrap();
        fs::write(dir.path().join("open.md"), "---\nid: x\ntitle: t\nmodule: m").unwrap();
        let lib = ContentLibrary::new(dir.path().join("manifest.yaml"), dir.path());
        assert!(matches!(
            lib.load_document(&dir.path().join("bad.md")),
            Err(ContentError::MissingFrontMatter(_))
        ));
        assert!(matches!(
            lib.load_document(&dir.path().join("open.md")),
            Err(ContentError::UnterminatedFrontMatter(_))
        ));
    }

    #[test]
    fn test_missing_required_key_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("anon.md"), "---\ntitle: No id\nmodule: m\n---\nbody").unwrap();
        let lib = ContentLibrary::new(dir.path().join("manifest.yaml"), dir.path());
        assert!(matches!(
            lib.load_document(&dir.path().join("anon.md")),
            Err(ContentError::Yaml { .. })
        ));
    }
}
