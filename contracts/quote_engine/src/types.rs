//! # Types
//!
//! Shared data structures used across the quote engine.
//!
//! ## Selection → Quote
//!
//! A [`SelectionState`] is an immutable snapshot of the configurator form.
//! Every change produces a new snapshot, and every snapshot is priced into a
//! fresh [`Quote`]; a quote is never patched in place.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pricing::{ContentPack, MonthlyPlan};

/// Boolean options of the configurator. The foundation line is not an
/// option: it is always billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionKey {
    #[serde(rename = "programme_affilie_1")]
    ProgrammeAffilie1,
    #[serde(rename = "performance")]
    Performance,
    #[serde(rename = "branding_premium")]
    BrandingPremium,
    #[serde(rename = "seo_silos")]
    SeoSilos,
    #[serde(rename = "schema")]
    Schema,
}

impl OptionKey {
    /// Pricing order: flat options first, tiered options after.
    pub const ALL: [OptionKey; 5] = [
        OptionKey::ProgrammeAffilie1,
        OptionKey::Performance,
        OptionKey::BrandingPremium,
        OptionKey::SeoSilos,
        OptionKey::Schema,
    ];

    /// Form field name, also used as the key in `config.checks`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProgrammeAffilie1 => "programme_affilie_1",
            Self::Performance => "performance",
            Self::BrandingPremium => "branding_premium",
            Self::SeoSilos => "seo_silos",
            Self::Schema => "schema",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }

    /// Line-item label. Tiered options carry the volume they were priced at.
    pub fn label(self, pages: u32) -> String {
        match self {
            Self::ProgrammeAffilie1 => "Programme affilié #1".to_string(),
            Self::Performance => "Performance (cache + images + réglages core)".to_string(),
            Self::BrandingPremium => {
                "Branding premium (direction artistique + UI plus poussée)".to_string()
            }
            Self::SeoSilos => format!(
                "Architecture SEO (silos + plan de maillage) — palier {}",
                pages_label(pages)
            ),
            Self::Schema => format!(
                "Schema (FAQ/Review — selon gabarits) — palier {}",
                pages_label(pages)
            ),
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn pages_label(pages: u32) -> String {
    if pages == 1 {
        "1 page".to_string()
    } else {
        format!("{pages} pages")
    }
}

/// The fixed language catalog, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "fr")]
    Fr,
    #[serde(rename = "en")]
    En,
    #[serde(rename = "es")]
    Es,
    #[serde(rename = "pt-PT")]
    PtPt,
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "de")]
    De,
    #[serde(rename = "it")]
    It,
    #[serde(rename = "nl")]
    Nl,
    #[serde(rename = "pl")]
    Pl,
}

impl Language {
    pub const CATALOG: [Language; 9] = [
        Language::Fr,
        Language::En,
        Language::Es,
        Language::PtPt,
        Language::PtBr,
        Language::De,
        Language::It,
        Language::Nl,
        Language::Pl,
    ];

    /// Selected when nothing else is.
    pub const DEFAULT: Language = Language::Fr;

    pub fn code(self) -> &'static str {
        match self {
            Self::Fr => "fr",
            Self::En => "en",
            Self::Es => "es",
            Self::PtPt => "pt-PT",
            Self::PtBr => "pt-BR",
            Self::De => "de",
            Self::It => "it",
            Self::Nl => "nl",
            Self::Pl => "pl",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fr => "Français (FR)",
            Self::En => "English (EN)",
            Self::Es => "Español (ES)",
            Self::PtPt => "Português (PT)",
            Self::PtBr => "Português (BR)",
            Self::De => "Deutsch (DE)",
            Self::It => "Italiano (IT)",
            Self::Nl => "Nederlands (NL)",
            Self::Pl => "Polski (PL)",
        }
    }

    /// Codes are case-sensitive (`pt-PT`, not `pt-pt`).
    pub fn from_code(code: &str) -> Option<Self> {
        Self::CATALOG.into_iter().find(|l| l.code() == code)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Snapshot of everything the visitor picked in the configurator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub options: BTreeSet<OptionKey>,
    /// Extra affiliate programs; only billed with `programme_affilie_1`.
    pub affiliate_extra: u32,
    pub content_pack: ContentPack,
    pub monthly: MonthlyPlan,
    pub lang_count: u32,
    /// Selected languages in catalog order.
    pub languages: Vec<Language>,
    pub niche: String,
    pub consent: bool,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            options: BTreeSet::new(),
            affiliate_extra: 0,
            content_pack: ContentPack::default(),
            monthly: MonthlyPlan::default(),
            lang_count: 1,
            languages: vec![Language::DEFAULT],
            niche: String::new(),
            consent: false,
        }
    }
}

impl SelectionState {
    pub fn is_checked(&self, key: OptionKey) -> bool {
        self.options.contains(&key)
    }

    /// Copy of `self` with `key` enabled.
    pub fn with_option(&self, key: OptionKey) -> Self {
        let mut next = self.clone();
        next.options.insert(key);
        next
    }

    /// Copy of `self` with `key` disabled.
    pub fn without_option(&self, key: OptionKey) -> Self {
        let mut next = self.clone();
        next.options.remove(&key);
        next
    }

    /// Every option with its on/off state, keyed by form field name.
    pub fn checks(&self) -> BTreeMap<String, bool> {
        OptionKey::ALL
            .into_iter()
            .map(|k| (k.as_str().to_string(), self.is_checked(k)))
            .collect()
    }

    pub fn language_codes(&self) -> Vec<String> {
        self.languages.iter().map(|l| l.code().to_string()).collect()
    }
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// One priced line of a quote, amount in whole euros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub label: String,
    pub amount: u32,
    /// Informational lines shown even at a zero amount.
    #[serde(default, skip_serializing_if = "is_false")]
    pub always_show: bool,
}

impl LineItem {
    pub fn new(label: impl Into<String>, amount: u32) -> Self {
        Self {
            label: label.into(),
            amount,
            always_show: false,
        }
    }

    pub fn info(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            amount: 0,
            always_show: true,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.amount > 0 || self.always_show
    }
}

/// Working-day delivery estimate, `min_days <= max_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRange {
    pub min_days: u32,
    pub max_days: u32,
}

/// A priced selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// In computation order.
    pub line_items: Vec<LineItem>,
    pub one_shot_total: u32,
    pub monthly_total: u32,
    pub delivery: DeliveryRange,
}

impl Quote {
    /// The lines the summary panel displays.
    pub fn visible_items(&self) -> impl Iterator<Item = &LineItem> {
        self.line_items.iter().filter(|it| it.is_visible())
    }
}
