//! Curriculum catalog: modules, sections, and quiz questions
//!
//! Loaded once at startup from a JSON document. Field names on the wire are
//! camelCase (`minLevel`, `targetOs`, `focusTags`, ...); almost everything is
//! optional so authors can keep lesson files terse.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::ContentError;

/// A single multiple-choice quiz question
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    /// 0-based index into `options`
    pub correct_index: usize,
}

/// One lesson unit inside a module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSection {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Section kind, e.g. "lesson", "lab", "quiz"
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub diagram: String,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub min_level: Option<String>,
    /// OS values this section applies to; empty or containing "ANY" means
    /// unrestricted
    #[serde(default)]
    pub target_os: Vec<String>,
    /// Free-text topic labels; empty means the section never matches a set
    /// focus filter
    #[serde(default)]
    pub focus_tags: Vec<String>,
    #[serde(default)]
    pub exercise_prompt: String,
    #[serde(default)]
    pub exercise_starter: String,
    #[serde(default)]
    pub exercise_solution: String,
}

impl ContentSection {
    pub fn has_questions(&self) -> bool {
        !self.questions.is_empty()
    }
}

/// A top-level curriculum unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentModule {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub min_level: Option<String>,
    #[serde(default)]
    pub sections: Vec<ContentSection>,
}

/// The full catalog as authored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentCatalog {
    #[serde(default)]
    pub modules: Vec<ContentModule>,
}

impl ContentCatalog {
    /// Load and validate a catalog from a JSON file. Duplicate ids,
    /// out-of-bounds answer indices, and unparsable level strings are all
    /// fatal load errors.
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog: ContentCatalog =
            serde_json::from_str(&raw).map_err(|source| ContentError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Structural validation, run once at load time so per-request filtering
    /// never has to handle malformed levels or dangling answer indices.
    pub fn validate(&self) -> Result<(), ContentError> {
        let mut module_ids = HashSet::new();
        for module in &self.modules {
            if module.id.is_empty() {
                return Err(ContentError::Invalid("module with empty id".to_string()));
            }
            if !module_ids.insert(module.id.as_str()) {
                return Err(ContentError::Invalid(format!(
                    "duplicate module id: {}",
                    module.id
                )));
            }
            validate_level(&module.min_level)?;

            let mut section_ids = HashSet::new();
            for section in &module.sections {
                if section.id.is_empty() {
                    return Err(ContentError::Invalid(format!(
                        "section with empty id in module {}",
                        module.id
                    )));
                }
                if !section_ids.insert(section.id.as_str()) {
                    return Err(ContentError::Invalid(format!(
                        "duplicate section id {} in module {}",
                        section.id, module.id
                    )));
                }
                validate_level(&section.min_level)?;
                for question in &section.questions {
                    if question.correct_index >= question.options.len() {
                        return Err(ContentError::Invalid(format!(
                            "question {} in section {} has correctIndex {} but only {} options",
                            question.id,
                            section.id,
                            question.correct_index,
                            question.options.len()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Total number of sections across all modules
    pub fn section_count(&self) -> usize {
        self.modules.iter().map(|m| m.sections.len()).sum()
    }
}

fn validate_level(min_level: &Option<String>) -> Result<(), ContentError> {
    if let Some(level) = min_level {
        if !level.trim().is_empty() {
            level.parse::<crate::types::LearningLevel>()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: &str) -> ContentSection {
        serde_json::from_value(serde_json::json!({ "id": id })).unwrap()
    }

    #[test]
    fn test_deserialize_camel_case_fields() {
        let json = serde_json::json!({
            "modules": [{
                "id": "rust-basics",
                "title": "Rust Basics",
                "minLevel": "NEWBIE",
                "sections": [{
                    "id": "ownership",
                    "title": "Ownership",
                    "type": "lesson",
                    "targetOs": ["ANY"],
                    "focusTags": ["memory"],
                    "questions": [{
                        "id": "q1",
                        "prompt": "Who owns it?",
                        "options": ["caller", "callee"],
                        "correctIndex": 0
                    }]
                }]
            }]
        });
        let catalog: ContentCatalog = serde_json::from_value(json).unwrap();
        assert_eq!(catalog.modules[0].min_level.as_deref(), Some("NEWBIE"));
        let section = &catalog.modules[0].sections[0];
        assert_eq!(section.kind, "lesson");
        assert_eq!(section.focus_tags, vec!["memory"]);
        assert_eq!(section.questions[0].correct_index, 0);
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_module_ids() {
        let catalog = ContentCatalog {
            modules: vec![
                ContentModule {
                    id: "a".into(),
                    title: String::new(),
                    description: String::new(),
                    min_level: None,
                    sections: vec![],
                },
                ContentModule {
                    id: "a".into(),
                    title: String::new(),
                    description: String::new(),
                    min_level: None,
                    sections: vec![],
                },
            ],
        };
        assert!(matches!(
            catalog.validate(),
            Err(ContentError::Invalid(msg)) if msg.contains("duplicate module id")
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_section_ids_within_module() {
        let catalog = ContentCatalog {
            modules: vec![ContentModule {
                id: "m".into(),
                title: String::new(),
                description: String::new(),
                min_level: None,
                sections: vec![section("s"), section("s")],
            }],
        };
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_bounds_answer() {
        let mut s = section("s");
        s.questions.push(Question {
            id: "q".into(),
            prompt: String::new(),
            options: vec!["only".into()],
            correct_index: 1,
        });
        let catalog = ContentCatalog {
            modules: vec![ContentModule {
                id: "m".into(),
                title: String::new(),
                description: String::new(),
                min_level: None,
                sections: vec![s],
            }],
        };
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_min_level() {
        let catalog = ContentCatalog {
            modules: vec![ContentModule {
                id: "m".into(),
                title: String::new(),
                description: String::new(),
                min_level: Some("WIZARD".into()),
                sections: vec![],
            }],
        };
        assert!(matches!(catalog.validate(), Err(ContentError::Level(_))));
    }
}
