//! Ledger row layout and the operator message for a paid session.

use chrono::{DateTime, SecondsFormat, Utc};
use quote_engine::format::money_from_minor;
use quote_engine::OrderRecord;
use serde_json::{json, Value};

use crate::stripe::CheckoutSession;

pub const HEADER: [&str; 37] = [
    "stripe_session_id",
    "payment_intent",
    "livemode",
    "payment_status",
    "amount_total",
    "currency",
    "order_created_at",
    "customer_first_name",
    "customer_last_name",
    "customer_email",
    "customer_phone",
    "adresse_l1",
    "adresse_l2",
    "code_postal",
    "ville",
    "pays",
    "date_naissance",
    "lieu_naissance_ville",
    "lieu_naissance_pays",
    "societe",
    "siret",
    "niche",
    "delai_estime",
    "nombre_langues",
    "langues",
    "aff_extra",
    "content_pack",
    "mensuel",
    "checks",
    "total_one_shot",
    "total_monthly",
    "recap",
    "config_json",
    "order_json",
    "stripe_dashboard_url",
    "received_at",
    "notification_sent_at",
];

/// 1-based column index of the notification stamp.
pub const NOTIFICATION_COLUMN: usize = HEADER.len();

/// `1` → `A`, `27` → `AA`.
pub fn col_to_a1(mut index: usize) -> String {
    let mut out = Vec::new();
    while index > 0 {
        let r = (index - 1) % 26;
        out.push(b'A' + r as u8);
        index = (index - 1) / 26;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Row number from an `updatedRange` such as `Orders!A12:AK12`; 0 when absent.
pub fn parse_updated_range_row(range: &str) -> usize {
    let Some((_, cells)) = range.rsplit_once('!') else {
        return 0;
    };
    let digits_start = cells
        .find(|c: char| !c.is_ascii_uppercase())
        .unwrap_or(cells.len());
    if digits_start == 0 {
        return 0;
    }
    let rest = &cells[digits_start..];
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if digits_end == 0 || !rest[digits_end..].starts_with(':') {
        return 0;
    }
    rest[..digits_end].parse().unwrap_or(0)
}

/// Euros for EUR amounts, minor units for any other currency, blank if unknown.
pub fn amount_for_sheet(amount_total: Option<i64>, currency: &str) -> Value {
    let Some(minor) = amount_total else {
        return json!("");
    };
    if !currency.is_empty() && !currency.eq_ignore_ascii_case("eur") {
        return json!(minor);
    }
    if minor % 100 == 0 {
        json!(minor / 100)
    } else {
        json!(minor as f64 / 100.0)
    }
}

pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The denormalized row. Order columns stay blank when the order could not
/// be recovered from the session metadata.
pub fn build_row(
    session: &CheckoutSession,
    order: Option<&OrderRecord>,
    dashboard_url: &str,
    received_at: DateTime<Utc>,
) -> Vec<Value> {
    let mut row = vec![
        json!(session.id),
        json!(session.payment_intent),
        json!(session.livemode.to_string()),
        json!(session.payment_status),
        amount_for_sheet(session.amount_total, &session.currency),
        json!(session.currency.to_uppercase()),
    ];

    let order_cells: Vec<String> = match order {
        Some(o) => {
            let c = &o.customer;
            vec![
                o.created_at.clone(),
                c.first_name.clone(),
                c.last_name.clone(),
                c.email.clone(),
                c.phone.clone(),
                c.address.line1.clone(),
                c.address.line2.clone(),
                c.address.postal_code.clone(),
                c.address.city.clone(),
                c.address.country.clone(),
                c.birth.date.clone(),
                c.birth.city.clone(),
                c.birth.country.clone(),
                c.company.name.clone(),
                c.company.siret.clone(),
                o.project.niche.clone(),
                o.project.estimated_delivery.clone(),
                o.config.lang_count.to_string(),
                o.config.langs.join(","),
                o.config.aff_extra.to_string(),
                o.config.content_pack.to_string(),
                o.config.monthly.to_string(),
                o.selected_checks(),
                o.totals.one_shot.to_string(),
                o.totals.monthly.to_string(),
                o.recap.clone(),
                serde_json::to_string(&o.config).unwrap_or_default(),
                serde_json::to_string(o).unwrap_or_default(),
            ]
        }
        None => {
            let mut blank = vec![String::new(); 26];
            blank.push("{}".to_string());
            blank.push("null".to_string());
            blank
        }
    };
    row.extend(order_cells.into_iter().map(Value::String));

    row.push(json!(dashboard_url));
    row.push(json!(iso_timestamp(received_at)));
    row.push(json!(""));
    row
}

/// Plain-text summary sent to the operator.
pub fn operator_message(
    session: &CheckoutSession,
    order: Option<&OrderRecord>,
    dashboard_url: &str,
) -> String {
    let mode = if session.livemode { "LIVE" } else { "TEST" };
    let amount = money_from_minor(session.amount_total.unwrap_or(0), &session.currency);
    let mut lines = vec![format!("Nouvelle commande payée ({mode}) — {amount}")
        .trim()
        .to_string()];

    if let Some(o) = order {
        let email = o.customer.email.trim();
        let name = o.customer.display_name();
        let customer = if name.is_empty() {
            email.to_string()
        } else {
            format!("{name} <{email}>")
        };
        if !customer.is_empty() {
            lines.push(format!("Client: {customer}"));
        }
        if !o.project.niche.trim().is_empty() {
            lines.push(format!("Niche: {}", o.project.niche.trim()));
        }
        if !o.config.langs.is_empty() {
            lines.push(format!("Langues: {}", o.config.langs.join(", ")));
        }
        let checks = o.selected_checks();
        if !checks.is_empty() {
            lines.push(format!("Options: {checks}"));
        }
    }

    lines.push(format!("Stripe: {dashboard_url}"));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn session() -> CheckoutSession {
        CheckoutSession {
            id: "cs_test_1".into(),
            payment_intent: "pi_1".into(),
            livemode: false,
            payment_status: "paid".into(),
            amount_total: Some(101_050),
            currency: "eur".into(),
            ..CheckoutSession::default()
        }
    }

    fn order() -> OrderRecord {
        let mut o = OrderRecord::default();
        o.customer.first_name = "Ada".into();
        o.customer.last_name = "Lovelace".into();
        o.customer.email = "ada@example.com".into();
        o.project.niche = "jardin".into();
        o.config.langs = vec!["fr".into(), "en".into()];
        o.config.lang_count = 2;
        o.config.checks.insert("schema".into(), true);
        o.config.checks.insert("performance".into(), false);
        o
    }

    #[test]
    fn column_letters() {
        assert_eq!(col_to_a1(1), "A");
        assert_eq!(col_to_a1(26), "Z");
        assert_eq!(col_to_a1(27), "AA");
        assert_eq!(col_to_a1(NOTIFICATION_COLUMN), "AK");
    }

    #[test]
    fn updated_range_row() {
        assert_eq!(parse_updated_range_row("Orders!A12:AK12"), 12);
        assert_eq!(parse_updated_range_row("'My Tab'!AB7:AK7"), 7);
        assert_eq!(parse_updated_range_row("'Orders!2024'!A9:AK9"), 9);
        assert_eq!(parse_updated_range_row("Orders!A12"), 0);
        assert_eq!(parse_updated_range_row(""), 0);
    }

    #[test]
    fn sheet_amounts() {
        assert_eq!(amount_for_sheet(Some(101_000), "eur"), json!(1010));
        assert_eq!(amount_for_sheet(Some(101_050), "EUR"), json!(1010.5));
        assert_eq!(amount_for_sheet(Some(5000), "usd"), json!(5000));
        assert_eq!(amount_for_sheet(None, "eur"), json!(""));
    }

    #[test]
    fn row_has_one_cell_per_header() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let with_order = build_row(&session(), Some(&order()), "https://d", at);
        assert_eq!(with_order.len(), HEADER.len());
        assert_eq!(with_order[0], json!("cs_test_1"));
        assert_eq!(with_order[2], json!("false"));
        assert_eq!(with_order[5], json!("EUR"));
        assert_eq!(with_order[23], json!("2"));
        assert_eq!(with_order[24], json!("fr,en"));
        assert_eq!(with_order[28], json!("schema"));
        assert_eq!(with_order[35], json!("2024-05-01T10:00:00.000Z"));
        assert_eq!(with_order[36], json!(""));

        let without = build_row(&session(), None, "https://d", at);
        assert_eq!(without.len(), HEADER.len());
        assert_eq!(without[9], json!(""));
        assert_eq!(without[32], json!("{}"));
        assert_eq!(without[33], json!("null"));
    }

    #[test]
    fn message_lines() {
        let msg = operator_message(&session(), Some(&order()), "https://d");
        let lines: Vec<&str> = msg.lines().collect();
        assert_eq!(lines[0], "Nouvelle commande payée (TEST) — 1010.50 EUR");
        assert_eq!(lines[1], "Client: Ada Lovelace <ada@example.com>");
        assert_eq!(lines[2], "Niche: jardin");
        assert_eq!(lines[3], "Langues: fr, en");
        assert_eq!(lines[4], "Options: schema");
        assert_eq!(lines[5], "Stripe: https://d");

        let bare = operator_message(&session(), None, "https://d");
        assert_eq!(bare.lines().count(), 2);
    }
}
