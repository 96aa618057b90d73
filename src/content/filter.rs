//! Per-learner content filtering
//!
//! Applies the session context (level, target OS, focus) to the catalog.
//! Module and section ordering is preserved; a module whose filtered section
//! list ends up empty is dropped from listings entirely.

use crate::session::SessionContext;
use crate::types::ParseLevelError;

use super::catalog::{ContentCatalog, ContentModule, ContentSection};

/// All modules visible to the given context. Modules above the learner's
/// level contribute no sections and are dropped.
pub fn filter_modules(
    catalog: &ContentCatalog,
    ctx: &SessionContext,
) -> Result<Vec<ContentModule>, ParseLevelError> {
    let mut visible = Vec::new();
    for module in &catalog.modules {
        let filtered = filter_module(module, ctx)?;
        if !filtered.sections.is_empty() {
            visible.push(filtered);
        }
    }
    Ok(visible)
}

/// The single matching module with the same filtering applied, or `None`
/// when the id is unknown. Unlike `filter_modules`, an empty filtered module
/// is still returned so the caller can render its header.
pub fn module_by_id(
    catalog: &ContentCatalog,
    id: &str,
    ctx: &SessionContext,
) -> Result<Option<ContentModule>, ParseLevelError> {
    match catalog.modules.iter().find(|m| m.id == id) {
        Some(module) => Ok(Some(filter_module(module, ctx)?)),
        None => Ok(None),
    }
}

/// Unfiltered section lookup. Quiz grading must see the full section
/// regardless of the current filter context.
pub fn section<'a>(
    catalog: &'a ContentCatalog,
    module_id: &str,
    section_id: &str,
) -> Option<&'a ContentSection> {
    catalog
        .modules
        .iter()
        .find(|m| m.id == module_id)?
        .sections
        .iter()
        .find(|s| s.id == section_id)
}

fn filter_module(
    module: &ContentModule,
    ctx: &SessionContext,
) -> Result<ContentModule, ParseLevelError> {
    if !ctx.level.allows(module.min_level.as_deref())? {
        return Ok(ContentModule {
            sections: Vec::new(),
            ..module.clone()
        });
    }
    let mut sections = Vec::new();
    for section in &module.sections {
        if !ctx.level.allows(section.min_level.as_deref())? {
            continue;
        }
        if !matches_os(section, ctx) {
            continue;
        }
        if !matches_focus(section, ctx.focus()) {
            continue;
        }
        sections.push(section.clone());
    }
    Ok(ContentModule {
        sections,
        ..module.clone()
    })
}

fn matches_os(section: &ContentSection, ctx: &SessionContext) -> bool {
    if section.target_os.is_empty() {
        return true;
    }
    section.target_os.iter().any(|value| {
        let value = value.to_uppercase();
        value == "ANY" || value == ctx.target_os.as_str()
    })
}

fn matches_focus(section: &ContentSection, focus: &str) -> bool {
    if focus.is_empty() {
        return true;
    }
    section
        .focus_tags
        .iter()
        .any(|tag| tag.eq_ignore_ascii_case(focus))
}
