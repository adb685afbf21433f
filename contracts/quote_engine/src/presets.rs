//! Named starting points for the configurator (`?preset=...`).

use crate::languages::LanguagePanel;
use crate::pricing::{ContentPack, MonthlyPlan};
use crate::types::{Language, OptionKey, SelectionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Sprint,
    Launch,
    Growth,
}

impl Preset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sprint" => Some(Self::Sprint),
            "launch" => Some(Self::Launch),
            "growth" => Some(Self::Growth),
            _ => None,
        }
    }

    /// Apply the preset on top of `base`. Niche and consent are left untouched.
    pub fn apply(self, base: &SelectionState) -> SelectionState {
        let (options, affiliate_extra, content_pack): (&[OptionKey], u32, ContentPack) = match self {
            Self::Sprint => (&[OptionKey::ProgrammeAffilie1], 0, ContentPack::FivePages),
            Self::Launch => (
                &[OptionKey::ProgrammeAffilie1, OptionKey::SeoSilos],
                0,
                ContentPack::TenPages,
            ),
            Self::Growth => (
                &[
                    OptionKey::ProgrammeAffilie1,
                    OptionKey::SeoSilos,
                    OptionKey::Performance,
                    OptionKey::Schema,
                ],
                1,
                ContentPack::TwentyPages,
            ),
        };

        let mut next = SelectionState {
            affiliate_extra,
            content_pack,
            monthly: MonthlyPlan::None,
            ..base.clone()
        };
        // Presets only switch options on.
        next.options.extend(options.iter().copied());

        LanguagePanel::new(1, &[Language::Fr]).apply_to(&next)
    }
}
