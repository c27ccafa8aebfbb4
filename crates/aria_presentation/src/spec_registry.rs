//! Documentation registry: presentation type name to specification section.
//!
//! Process-wide and write-once per key. It is seeded on first access from
//! every built-in grammar and is only used for documentation output.

use crate::field::PresentationType;
use crate::grammar::GrammarTable;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::sync::{PoisonError, RwLock};

/// Error from registry writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecRegistryError {
    /// Key already bound to a different section
    AlreadyRegistered {
        /// Presentation type name
        name: String,
        /// Section already recorded
        existing: String,
        /// Section that was refused
        new: String,
    },
}

impl std::fmt::Display for SpecRegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRegistered { name, existing, new } => write!(
                f,
                "{} is already documented by section {} (refused {})",
                name, existing, new
            ),
        }
    }
}

impl std::error::Error for SpecRegistryError {}

static REGISTRY: Lazy<RwLock<IndexMap<&'static str, &'static str>>> = Lazy::new(|| {
    let mut entries = IndexMap::new();
    for grammar in GrammarTable::standard().grammars() {
        for ty in grammar.root.reachable() {
            if let Some(section) = ty.spec_section {
                entries.entry(ty.name).or_insert(section);
            }
        }
    }
    tracing::debug!(count = entries.len(), "seeded specification registry");
    RwLock::new(entries)
});

/// Record the section documenting a presentation type.
///
/// Registering the same section again is a no-op.
///
/// # Errors
///
/// Returns error if the name is bound to a different section
pub fn register(name: &'static str, section: &'static str) -> Result<(), SpecRegistryError> {
    let mut entries = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    match entries.get(name) {
        Some(existing) if *existing == section => Ok(()),
        Some(existing) => Err(SpecRegistryError::AlreadyRegistered {
            name: name.to_string(),
            existing: (*existing).to_string(),
            new: section.to_string(),
        }),
        None => {
            entries.insert(name, section);
            Ok(())
        }
    }
}

/// Record every documented type reachable from `root`
///
/// # Errors
///
/// Returns the first conflicting registration
pub fn register_reachable(root: &'static PresentationType) -> Result<(), SpecRegistryError> {
    for ty in root.reachable() {
        if let Some(section) = ty.spec_section {
            register(ty.name, section)?;
        }
    }
    Ok(())
}

/// Section documenting a presentation type
#[must_use]
pub fn section_of(name: &str) -> Option<&'static str> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .copied()
}

/// All entries in registration order
#[must_use]
pub fn entries() -> Vec<(&'static str, &'static str)> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .map(|(name, section)| (*name, *section))
        .collect()
}
