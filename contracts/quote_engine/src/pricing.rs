//! # Pricing tables
//!
//! Every business constant used to price a configuration lives here, in one
//! value consumed by both the in-browser preview and the server-side
//! authoritative recompute.
//!
//! ## Units
//!
//! | Quantity          | Unit                                   |
//! |-------------------|----------------------------------------|
//! | Prices            | whole euros (`u32`)                    |
//! | Delivery accruals | hundredths of a working day (`u32`)    |
//!
//! Fractional day constants (0.35 day per page, 0.5 day per extra affiliate
//! program, ...) are stored as integer hundredths so the estimate never goes
//! through floating point and is identical on every target.
//!
//! Bump [`PRICING_VERSION`] whenever a constant in [`PricingTable::STANDARD`]
//! changes; the version travels in the payment-session metadata.

use serde::{Deserialize, Serialize};

use crate::types::OptionKey;

/// Version of [`PricingTable::STANDARD`].
pub const PRICING_VERSION: u32 = 1;

/// Content pack tiers. Content is produced per language, so the pack price is
/// multiplied by the language count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentPack {
    OnePage,
    FivePages,
    TenPages,
    TwentyPages,
}

impl ContentPack {
    pub const ALL: [ContentPack; 4] = [
        ContentPack::OnePage,
        ContentPack::FivePages,
        ContentPack::TenPages,
        ContentPack::TwentyPages,
    ];

    pub fn price(self) -> u32 {
        match self {
            Self::OnePage => 150,
            Self::FivePages => 490,
            Self::TenPages => 990,
            Self::TwentyPages => 1890,
        }
    }

    /// Look up a tier by its price; `None` for any price outside the fixed set.
    pub fn from_price(price: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| i64::from(p.price()) == price)
    }

    pub fn pages_per_lang(self) -> u32 {
        pages_per_lang(i64::from(self.price()))
    }
}

impl Default for ContentPack {
    fn default() -> Self {
        Self::OnePage
    }
}

/// Monthly plan tiers. Billed separately from the one-shot total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyPlan {
    None,
    Maintenance,
    Growth,
}

impl MonthlyPlan {
    pub const ALL: [MonthlyPlan; 3] = [MonthlyPlan::None, MonthlyPlan::Maintenance, MonthlyPlan::Growth];

    pub fn price(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Maintenance => 49,
            Self::Growth => 249,
        }
    }

    pub fn from_price(price: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| i64::from(p.price()) == price)
    }
}

impl Default for MonthlyPlan {
    fn default() -> Self {
        Self::None
    }
}

/// Pages produced per language for a content pack price. Unknown prices map to 1.
pub fn pages_per_lang(content_pack_price: i64) -> u32 {
    match content_pack_price {
        150 => 1,
        490 => 5,
        990 => 10,
        1890 => 20,
        _ => 1,
    }
}

/// Price of the SEO silo architecture for a given pages-per-language volume.
pub fn seo_price(pages: u32) -> u32 {
    PricingTable::STANDARD.seo_silos.price_for(pages)
}

/// Price of the structured-data (schema) option for a given pages-per-language volume.
pub fn schema_price(pages: u32) -> u32 {
    PricingTable::STANDARD.schema.price_for(pages)
}

/// Three-step price keyed by pages per language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TieredPrice {
    pub base: u32,
    /// Applies from 10 pages per language.
    pub mid: u32,
    /// Applies from 20 pages per language.
    pub top: u32,
}

impl TieredPrice {
    pub const MID_BREAKPOINT: u32 = 10;
    pub const TOP_BREAKPOINT: u32 = 20;

    pub fn price_for(&self, pages: u32) -> u32 {
        if pages >= Self::TOP_BREAKPOINT {
            self.top
        } else if pages >= Self::MID_BREAKPOINT {
            self.mid
        } else {
            self.base
        }
    }
}

/// A `[min, max]` accrual in hundredths of a working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub min: u32,
    pub max: u32,
}

impl DayRange {
    pub const fn days(min: u32, max: u32) -> Self {
        Self {
            min: min * 100,
            max: max * 100,
        }
    }

    pub const fn hundredths(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn times(self, n: u32) -> Self {
        Self {
            min: self.min * n,
            max: self.max * n,
        }
    }
}

/// Delivery-time constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryTable {
    /// Starting range in whole days; also the floor of the final minimum.
    pub base_min_days: u32,
    pub base_max_days: u32,
    /// Per pending request in the production queue.
    pub per_queued_request: DayRange,
    pub max_queue: u32,
    pub per_extra_language: DayRange,
    pub per_page: DayRange,
    pub affiliate_program: DayRange,
    pub per_extra_affiliate: DayRange,
    pub seo_silos: DayRange,
    pub performance: DayRange,
    pub schema: DayRange,
    pub branding_premium: DayRange,
}

/// The full set of pricing constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingTable {
    pub foundation: u32,
    pub affiliate_program: u32,
    pub performance: u32,
    pub branding_premium: u32,
    pub seo_silos: TieredPrice,
    pub schema: TieredPrice,
    pub affiliate_extra_unit: u32,
    pub affiliate_extra_max: u32,
    pub extra_language: u32,
    /// Upper bound on the configurable language count.
    pub max_languages: u32,
    pub delivery: DeliveryTable,
}

impl PricingTable {
    pub const STANDARD: PricingTable = PricingTable {
        foundation: 860,
        affiliate_program: 190,
        performance: 190,
        branding_premium: 490,
        seo_silos: TieredPrice {
            base: 290,
            mid: 390,
            top: 490,
        },
        schema: TieredPrice {
            base: 190,
            mid: 240,
            top: 290,
        },
        affiliate_extra_unit: 150,
        affiliate_extra_max: 20,
        extra_language: 490,
        max_languages: 8,
        delivery: DeliveryTable {
            base_min_days: 7,
            base_max_days: 12,
            per_queued_request: DayRange::days(2, 4),
            max_queue: 50,
            per_extra_language: DayRange::days(1, 2),
            per_page: DayRange::hundredths(35, 65),
            affiliate_program: DayRange::days(1, 2),
            per_extra_affiliate: DayRange::hundredths(50, 100),
            seo_silos: DayRange::days(1, 2),
            performance: DayRange::hundredths(50, 100),
            schema: DayRange::hundredths(50, 100),
            branding_premium: DayRange::days(1, 3),
        },
    };

    /// Price of a boolean option at the given pages-per-language volume.
    pub fn option_price(&self, key: OptionKey, pages: u32) -> u32 {
        match key {
            OptionKey::ProgrammeAffilie1 => self.affiliate_program,
            OptionKey::Performance => self.performance,
            OptionKey::BrandingPremium => self.branding_premium,
            OptionKey::SeoSilos => self.seo_silos.price_for(pages),
            OptionKey::Schema => self.schema.price_for(pages),
        }
    }

    /// Delivery accrual contributed by a boolean option.
    pub fn option_days(&self, key: OptionKey) -> DayRange {
        match key {
            OptionKey::ProgrammeAffilie1 => self.delivery.affiliate_program,
            OptionKey::Performance => self.delivery.performance,
            OptionKey::BrandingPremium => self.delivery.branding_premium,
            OptionKey::SeoSilos => self.delivery.seo_silos,
            OptionKey::Schema => self.delivery.schema,
        }
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::STANDARD
    }
}
