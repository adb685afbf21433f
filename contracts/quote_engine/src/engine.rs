//! # Pricing rule engine
//!
//! Turns a [`SelectionState`] into a [`Quote`]. Two entry points share the
//! same rules:
//!
//! | Caller            | Entry point               | Input trust                         |
//! |-------------------|---------------------------|-------------------------------------|
//! | Configurator      | [`compute_quote`]         | form state, out-of-range is clamped |
//! | Checkout server   | [`authoritative_quote`]   | untrusted `config`, validated first |
//!
//! Neither function performs I/O, and for in-domain input neither fails.

use std::collections::BTreeSet;

use crate::errors::QuoteError;
use crate::languages::clamp_lang_count;
use crate::order::OrderConfig;
use crate::pricing::{ContentPack, DayRange, MonthlyPlan, PricingTable};
use crate::types::{DeliveryRange, Language, LineItem, OptionKey, Quote, SelectionState};

const FOUNDATION_LABEL: &str = "Fondations (site + tracking + pages + branding + logo)";

/// Price a selection with the standard table.
///
/// `queue_len` is the number of requests already waiting in the production
/// queue; it only moves the delivery estimate.
pub fn compute_quote(selection: &SelectionState, queue_len: u32) -> Quote {
    PricingTable::STANDARD.quote(selection, queue_len)
}

/// Re-price an untrusted order configuration. Client-declared totals are never read.
pub fn authoritative_quote(config: &OrderConfig) -> Result<Quote, QuoteError> {
    PricingTable::STANDARD.authoritative_quote(config)
}

impl PricingTable {
    pub fn quote(&self, selection: &SelectionState, queue_len: u32) -> Quote {
        let lang_count = clamp_lang_count(i64::from(selection.lang_count), self.max_languages);
        let pages = selection.content_pack.pages_per_lang();

        let mut items = vec![LineItem::new(FOUNDATION_LABEL, self.foundation)];

        for key in OptionKey::ALL {
            if selection.is_checked(key) {
                items.push(LineItem::new(key.label(pages), self.option_price(key, pages)));
            }
        }

        let affiliate_extra = self.billable_affiliate_extra(selection);
        if affiliate_extra > 0 {
            items.push(LineItem::new(
                format!("Programme affilié supplémentaire ×{affiliate_extra}"),
                affiliate_extra * self.affiliate_extra_unit,
            ));
        }

        let labels: Vec<&str> = if selection.languages.is_empty() {
            vec![Language::DEFAULT.label()]
        } else {
            selection.languages.iter().map(|l| l.label()).collect()
        };
        items.push(LineItem::info(format!("Langues : {}", labels.join(", "))));

        if lang_count > 1 {
            let extra = lang_count - 1;
            let noun = if extra > 1 { "langues" } else { "langue" };
            items.push(LineItem::new(
                format!("Option multi-langue (+{extra} {noun})"),
                extra * self.extra_language,
            ));
        }

        let pack_price = selection.content_pack.price();
        let pack_label = if lang_count > 1 {
            format!("Pack contenu ({pack_price}€) ×{lang_count} langues")
        } else {
            format!("Pack contenu ({pack_price}€)")
        };
        items.push(LineItem::new(pack_label, pack_price * lang_count));

        let one_shot_total = items.iter().map(|it| it.amount).sum();

        Quote {
            line_items: items,
            one_shot_total,
            monthly_total: selection.monthly.price(),
            delivery: self.estimate_delivery(selection, queue_len),
        }
    }

    /// Working-day estimate for a selection.
    pub fn estimate_delivery(&self, selection: &SelectionState, queue_len: u32) -> DeliveryRange {
        let d = &self.delivery;
        let lang_count = clamp_lang_count(i64::from(selection.lang_count), self.max_languages);
        let total_pages = selection.content_pack.pages_per_lang() * lang_count;

        let mut acc = DayRange::days(d.base_min_days, d.base_max_days);
        let mut add = |r: DayRange| {
            acc.min += r.min;
            acc.max += r.max;
        };

        add(d.per_queued_request.times(queue_len.min(d.max_queue)));
        add(d.per_extra_language.times(lang_count - 1));
        add(d.per_page.times(total_pages));

        for key in OptionKey::ALL {
            if selection.is_checked(key) {
                add(self.option_days(key));
            }
        }
        add(d.per_extra_affiliate.times(self.billable_affiliate_extra(selection)));

        let min_days = d.base_min_days.max(acc.min.div_ceil(100));
        let max_days = min_days.max(acc.max.div_ceil(100));
        DeliveryRange { min_days, max_days }
    }

    /// Extra affiliate programs only count alongside the first program.
    fn billable_affiliate_extra(&self, selection: &SelectionState) -> u32 {
        if selection.is_checked(OptionKey::ProgrammeAffilie1) {
            selection.affiliate_extra.min(self.affiliate_extra_max)
        } else {
            0
        }
    }

    /// Validate an untrusted configuration and price it with an empty queue.
    pub fn authoritative_quote(&self, config: &OrderConfig) -> Result<Quote, QuoteError> {
        let selection = self.selection_from_config(config)?;
        Ok(self.quote(&selection, 0))
    }

    /// Rebuild a [`SelectionState`] from `config`, rejecting anything outside
    /// the fixed tier sets or the language catalog.
    pub fn selection_from_config(&self, config: &OrderConfig) -> Result<SelectionState, QuoteError> {
        let lang_count = clamp_lang_count(config.lang_count, self.max_languages);

        let monthly =
            MonthlyPlan::from_price(config.monthly).ok_or(QuoteError::InvalidMonthly(config.monthly))?;

        let langs: Vec<&str> = config
            .langs
            .iter()
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
            .collect();

        if langs.len() != lang_count as usize {
            return Err(QuoteError::LanguageCountMismatch {
                selected: langs.len(),
                expected: lang_count,
            });
        }

        let unique: BTreeSet<&str> = langs.iter().copied().collect();
        if unique.len() != langs.len() {
            return Err(QuoteError::DuplicateLanguages);
        }

        let languages = langs
            .iter()
            .map(|code| {
                Language::from_code(code).ok_or_else(|| QuoteError::UnsupportedLanguage(code.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pack_price = if config.content_pack == 0 {
            ContentPack::default().price().into()
        } else {
            config.content_pack
        };
        let content_pack =
            ContentPack::from_price(pack_price).ok_or(QuoteError::InvalidContentPack(pack_price))?;

        let options = config
            .checks
            .iter()
            .filter(|(_, on)| **on)
            .filter_map(|(name, _)| OptionKey::from_key(name))
            .collect();

        let affiliate_extra = config.aff_extra.clamp(0, i64::from(self.affiliate_extra_max)) as u32;

        Ok(SelectionState {
            options,
            affiliate_extra,
            content_pack,
            monthly,
            lang_count,
            languages,
            niche: String::new(),
            consent: config.consent,
        })
    }
}
