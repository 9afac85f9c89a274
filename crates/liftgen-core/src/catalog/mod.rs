//! Focus catalog: the workout-focus instruction library and the known
//! muscle-group tags.
//!
//! Defined in `focus.toml` and embedded in the binary at compile time.

use std::sync::LazyLock;

use serde::Deserialize;

/// One training-style entry, e.g. `hypertrophy`.
#[derive(Debug, Clone, Deserialize)]
pub struct FocusEntry {
    /// Identifier sent by clients (e.g. `strength`).
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Training-science guidance appended to the prompt.
    pub instructions: String,
}

/// A selectable muscle group, e.g. `chest`.
#[derive(Debug, Clone, Deserialize)]
pub struct MuscleGroup {
    pub id: String,
    pub label: String,
}

/// The parsed catalog.
#[derive(Debug, Deserialize)]
pub struct FocusCatalog {
    #[serde(rename = "focus")]
    pub focuses: Vec<FocusEntry>,
    #[serde(rename = "muscle")]
    pub muscles: Vec<MuscleGroup>,
}

static CATALOG_TOML: &str = include_str!("focus.toml");

static CATALOG: LazyLock<FocusCatalog> = LazyLock::new(|| {
    toml::from_str(CATALOG_TOML).expect("embedded focus.toml is invalid")
});

/// The embedded catalog, parsed on first use.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed. The catalog test below parses
/// it, so a shipped binary always has a valid one.
pub fn catalog() -> &'static FocusCatalog {
    &CATALOG
}

impl FocusCatalog {
    /// Look up a workout-focus entry by id.
    pub fn focus(&self, id: &str) -> Option<&FocusEntry> {
        self.focuses.iter().find(|f| f.id == id)
    }

    /// Look up a muscle group by id.
    pub fn muscle_group(&self, id: &str) -> Option<&MuscleGroup> {
        self.muscles.iter().find(|m| m.id == id)
    }

    /// All focus ids, in catalog order.
    pub fn focus_ids(&self) -> Vec<&str> {
        self.focuses.iter().map(|f| f.id.as_str()).collect()
    }

    /// All muscle-group ids, in catalog order.
    pub fn muscle_ids(&self) -> Vec<&str> {
        self.muscles.iter().map(|m| m.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn embedded_catalog_parses() {
        let cat = catalog();
        assert_eq!(cat.focuses.len(), 10);
        assert_eq!(cat.muscles.len(), 12);
    }

    #[test]
    fn ids_are_unique() {
        let cat = catalog();
        let focus: HashSet<_> = cat.focus_ids().into_iter().collect();
        assert_eq!(focus.len(), cat.focuses.len());
        let muscles: HashSet<_> = cat.muscle_ids().into_iter().collect();
        assert_eq!(muscles.len(), cat.muscles.len());
    }

    #[test]
    fn lookup_known_and_unknown() {
        let cat = catalog();
        let hyp = cat.focus("hypertrophy").expect("hypertrophy is in the catalog");
        assert!(hyp.instructions.starts_with("Muscle growth optimization"));
        assert!(!hyp.instructions.contains('\n'));
        assert!(cat.focus("powerlifting").is_none());
        assert_eq!(cat.muscle_group("glutes").map(|m| m.label.as_str()), Some("Glutes"));
        assert!(cat.muscle_group("elbows").is_none());
    }

    #[test]
    fn every_entry_has_instructions() {
        for entry in &catalog().focuses {
            assert!(!entry.instructions.trim().is_empty(), "{} is empty", entry.id);
            assert!(!entry.label.is_empty());
        }
    }
}
