#![allow(dead_code)]

use std::collections::BTreeSet;

use crate::languages::LanguagePanel;
use crate::types::{Language, Quote};

/// INV-1: the one-shot total is the sum of the line amounts.
pub fn assert_total_is_sum(quote: &Quote) {
    let sum: u32 = quote.line_items.iter().map(|it| it.amount).sum();
    assert_eq!(
        quote.one_shot_total, sum,
        "INV-1 violated: total {} != sum of lines {}",
        quote.one_shot_total, sum
    );
}

/// INV-2: the delivery range is ordered and never below the base minimum.
pub fn assert_delivery_ordered(quote: &Quote) {
    assert!(
        quote.delivery.min_days <= quote.delivery.max_days,
        "INV-2 violated: min {} > max {}",
        quote.delivery.min_days,
        quote.delivery.max_days
    );
    assert!(
        quote.delivery.min_days >= 7,
        "INV-2 violated: min {} below base",
        quote.delivery.min_days
    );
}

/// INV-3: enabling something never lowers the one-shot total.
pub fn assert_not_cheaper(before: &Quote, after: &Quote) {
    assert!(
        after.one_shot_total >= before.one_shot_total,
        "INV-3 violated: {} -> {}",
        before.one_shot_total,
        after.one_shot_total
    );
}

/// INV-4: the language panel holds between 1 and `count` distinct catalog languages.
pub fn assert_panel_well_formed(panel: &LanguagePanel) {
    let distinct: BTreeSet<Language> = panel.selected.iter().copied().collect();
    assert_eq!(
        distinct.len(),
        panel.selected.len(),
        "INV-4 violated: duplicates in {:?}",
        panel.selected
    );
    assert!(
        !panel.selected.is_empty() && panel.selected.len() <= panel.count as usize,
        "INV-4 violated: {} selected for count {}",
        panel.selected.len(),
        panel.count
    );
    for l in &panel.selected {
        assert!(
            !panel.disabled.contains(l),
            "INV-4 violated: selected language {l} is disabled"
        );
    }
}

/// INV-5: a complete panel with count > 1 disables exactly the unselected languages.
pub fn assert_complete_panel_locks_rest(panel: &LanguagePanel) {
    if panel.count > 1 && panel.is_complete() {
        assert_eq!(
            panel.disabled.len() + panel.selected.len(),
            Language::CATALOG.len(),
            "INV-5 violated: {:?} / {:?}",
            panel.selected,
            panel.disabled
        );
    }
}
