use crate::engine::{authoritative_quote, compute_quote};
use crate::invariants::{assert_delivery_ordered, assert_total_is_sum};
use crate::order::OrderConfig;
use crate::pricing::{ContentPack, MonthlyPlan};
use crate::types::{Language, OptionKey, SelectionState};

fn langs(codes: &[Language]) -> SelectionState {
    SelectionState {
        lang_count: codes.len() as u32,
        languages: codes.to_vec(),
        ..SelectionState::default()
    }
}

fn config_for(selection: &SelectionState) -> OrderConfig {
    OrderConfig {
        checks: selection.checks(),
        aff_extra: selection.affiliate_extra.into(),
        content_pack: selection.content_pack.price().into(),
        monthly: selection.monthly.price().into(),
        lang_count: selection.lang_count.into(),
        langs: selection.language_codes(),
        consent: true,
    }
}

#[test]
fn scenario_minimal_pack() {
    let s = langs(&[Language::Fr]);
    let q = compute_quote(&s, 0);
    assert_eq!(q.one_shot_total, 860 + 150);
    assert_eq!(q.monthly_total, 0);
    assert_total_is_sum(&q);
    assert_delivery_ordered(&q);
}

#[test]
fn scenario_affiliate_with_extras() {
    let mut s = langs(&[Language::Fr]).with_option(OptionKey::ProgrammeAffilie1);
    s.affiliate_extra = 2;
    s.content_pack = ContentPack::TenPages;
    let q = compute_quote(&s, 0);
    assert_eq!(q.one_shot_total, 860 + 190 + 300 + 990);
    assert_total_is_sum(&q);
}

#[test]
fn scenario_three_languages() {
    let mut s = langs(&[Language::Fr, Language::En, Language::Es]);
    s.content_pack = ContentPack::FivePages;
    let q = compute_quote(&s, 0);

    let surcharge = q
        .line_items
        .iter()
        .find(|it| it.label.starts_with("Option multi-langue"))
        .unwrap();
    assert_eq!(surcharge.amount, 980);
    assert_eq!(surcharge.label, "Option multi-langue (+2 langues)");

    let content = q.line_items.last().unwrap();
    assert_eq!(content.amount, 1470);
    assert_eq!(content.label, "Pack contenu (490€) ×3 langues");

    assert_eq!(q.one_shot_total, 3310);
}

#[test]
fn single_language_has_no_surcharge_line() {
    let q = compute_quote(&langs(&[Language::De]), 0);
    assert!(q
        .line_items
        .iter()
        .all(|it| !it.label.starts_with("Option multi-langue")));
    assert_eq!(q.visible_items().count(), 3);
}

#[test]
fn second_language_lengthens_delivery() {
    let one = compute_quote(&langs(&[Language::Fr]), 0).delivery;
    let two = compute_quote(&langs(&[Language::Fr, Language::En]), 0).delivery;
    assert!(two.min_days >= one.min_days + 1);
    assert!(two.max_days >= one.max_days + 1);
}

#[test]
fn client_and_server_agree() {
    let mut s = langs(&[Language::Fr, Language::PtBr]);
    s.options.insert(OptionKey::ProgrammeAffilie1);
    s.options.insert(OptionKey::SeoSilos);
    s.options.insert(OptionKey::Schema);
    s.affiliate_extra = 3;
    s.content_pack = ContentPack::TwentyPages;
    s.monthly = MonthlyPlan::Maintenance;

    let client = compute_quote(&s, 0);
    let server = authoritative_quote(&config_for(&s)).unwrap();
    assert_eq!(client.line_items, server.line_items);
    assert_eq!(client.one_shot_total, server.one_shot_total);
    assert_eq!(client.monthly_total, server.monthly_total);
    assert_eq!(client.delivery, server.delivery);
}

#[test]
fn server_rejects_language_count_mismatch() {
    let mut config = config_for(&langs(&[Language::Fr]));
    config.lang_count = 2;
    assert!(authoritative_quote(&config).is_err());
}
