//! # Language selection rules
//!
//! The visitor first picks how many languages the site ships in, then which
//! ones. The panel enforces:
//!
//! - the count is clamped to `[1, max(1, min(configured max, 8))]`;
//! - with a count of 1, checking a language unchecks every other one;
//! - a fresh check that would exceed the count is rejected; other excess
//!   selections keep the first `count` languages in catalog order;
//! - once `count > 1` languages are selected, the rest are disabled;
//! - at least one language stays selected, falling back to [`Language::DEFAULT`].
//!
//! The panel never holds more than `count` languages. It may hold fewer while
//! the visitor is still choosing; the order gate in [`crate::assembler`]
//! requires an exact match before submission.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::pricing::PricingTable;
use crate::types::{Language, SelectionState};

/// Hard ceiling on the language count, whatever the form configures.
pub const MAX_LANGUAGES: u32 = 8;

/// A single checkbox change in the language panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageToggle {
    pub language: Language,
    pub checked: bool,
}

/// Clamp a requested language count. Non-positive input yields 1.
pub fn clamp_lang_count(requested: i64, configured_max: u32) -> u32 {
    let max = configured_max.min(MAX_LANGUAGES).max(1);
    requested.clamp(1, i64::from(max)) as u32
}

/// Apply the selection rules to `selected`, which already reflects `changed`.
pub fn apply_language_rules(
    selected: &[Language],
    count: u32,
    changed: Option<LanguageToggle>,
) -> LanguagePanel {
    let count = count.max(1);
    let mut set: BTreeSet<Language> = selected.iter().copied().collect();

    if set.is_empty() {
        set.insert(Language::DEFAULT);
    }

    let fresh_check = changed.filter(|c| c.checked && set.contains(&c.language));

    if count == 1 {
        if let Some(c) = fresh_check {
            set.retain(|l| *l == c.language);
        }
    }

    if set.len() > count as usize {
        if let Some(c) = fresh_check {
            set.remove(&c.language);
        }
        while set.len() > count as usize {
            set.pop_last();
        }
    }

    let selected: Vec<Language> = set.into_iter().collect();
    let disabled = if count > 1 && selected.len() >= count as usize {
        Language::CATALOG
            .into_iter()
            .filter(|l| !selected.contains(l))
            .collect()
    } else {
        BTreeSet::new()
    };

    LanguagePanel {
        count,
        selected,
        disabled,
    }
}

/// State of the language panel after the rules ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePanel {
    pub count: u32,
    /// Catalog order, distinct.
    pub selected: Vec<Language>,
    pub disabled: BTreeSet<Language>,
}

impl Default for LanguagePanel {
    fn default() -> Self {
        apply_language_rules(&[Language::DEFAULT], 1, None)
    }
}

impl LanguagePanel {
    pub fn new(count: u32, selected: &[Language]) -> Self {
        apply_language_rules(selected, count, None)
    }

    /// React to a checkbox change. Checking a disabled language is a no-op.
    pub fn toggle(&self, language: Language, checked: bool) -> Self {
        if checked && self.disabled.contains(&language) {
            return self.clone();
        }

        let mut next: Vec<Language> = self
            .selected
            .iter()
            .copied()
            .filter(|l| *l != language)
            .collect();
        if checked {
            next.push(language);
        }

        apply_language_rules(&next, self.count, Some(LanguageToggle { language, checked }))
    }

    /// React to the count input changing.
    pub fn with_count(&self, requested: i64, table: &PricingTable) -> Self {
        let count = clamp_lang_count(requested, table.max_languages);
        apply_language_rules(&self.selected, count, None)
    }

    pub fn is_complete(&self) -> bool {
        self.selected.len() == self.count as usize
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.selected.iter().map(|l| l.label()).collect()
    }

    /// Helper text under the panel.
    pub fn hint(&self) -> String {
        let noun = if self.count > 1 { "langues" } else { "langue" };
        format!(
            "Choisis {} {}. Sélection actuelle : {}. Packs de contenu = par langue. \
             (Multi-langue = structure + hreflang + gabarits.)",
            self.count,
            noun,
            self.labels().join(", ")
        )
    }

    /// Copy `selection` with this panel's count and languages.
    pub fn apply_to(&self, selection: &SelectionState) -> SelectionState {
        SelectionState {
            lang_count: self.count,
            languages: self.selected.clone(),
            ..selection.clone()
        }
    }
}
