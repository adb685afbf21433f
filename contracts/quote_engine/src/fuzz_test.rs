use proptest::prelude::*;
use proptest::sample::select;

use crate::engine::compute_quote;
use crate::invariants::{
    assert_complete_panel_locks_rest, assert_delivery_ordered, assert_not_cheaper,
    assert_panel_well_formed, assert_total_is_sum,
};
use crate::languages::LanguagePanel;
use crate::pricing::{ContentPack, MonthlyPlan, PricingTable};
use crate::types::{Language, OptionKey, SelectionState};

fn arb_selection() -> impl Strategy<Value = SelectionState> {
    (
        prop::collection::btree_set(select(OptionKey::ALL.to_vec()), 0..=5),
        0u32..40,
        select(ContentPack::ALL.to_vec()),
        select(MonthlyPlan::ALL.to_vec()),
        prop::collection::btree_set(select(Language::CATALOG.to_vec()), 1..=8),
    )
        .prop_map(|(options, affiliate_extra, content_pack, monthly, langs)| SelectionState {
            options,
            affiliate_extra,
            content_pack,
            monthly,
            lang_count: langs.len() as u32,
            languages: langs.into_iter().collect(),
            niche: String::new(),
            consent: true,
        })
}

#[derive(Debug, Clone)]
enum PanelAction {
    Toggle(Language, bool),
    Count(i64),
}

fn arb_action() -> impl Strategy<Value = PanelAction> {
    prop_oneof![
        (select(Language::CATALOG.to_vec()), any::<bool>()).prop_map(|(l, c)| PanelAction::Toggle(l, c)),
        (-2i64..12).prop_map(PanelAction::Count),
    ]
}

proptest! {
    #[test]
    fn total_is_sum_and_delivery_ordered(s in arb_selection(), queue in 0u32..80) {
        let q = compute_quote(&s, queue);
        assert_total_is_sum(&q);
        assert_delivery_ordered(&q);
    }

    #[test]
    fn quote_is_pure(s in arb_selection(), queue in 0u32..80) {
        prop_assert_eq!(compute_quote(&s, queue), compute_quote(&s, queue));
    }

    #[test]
    fn enabling_an_option_never_lowers_total(s in arb_selection(), key in select(OptionKey::ALL.to_vec())) {
        let before = compute_quote(&s.without_option(key), 0);
        let after = compute_quote(&s.with_option(key), 0);
        assert_not_cheaper(&before, &after);
    }

    #[test]
    fn panel_stays_well_formed(actions in prop::collection::vec(arb_action(), 0..40)) {
        let table = PricingTable::STANDARD;
        let mut panel = LanguagePanel::default();
        for action in actions {
            panel = match action {
                PanelAction::Toggle(l, checked) => panel.toggle(l, checked),
                PanelAction::Count(n) => panel.with_count(n, &table),
            };
            assert_panel_well_formed(&panel);
            assert_complete_panel_locks_rest(&panel);
        }
    }
}
