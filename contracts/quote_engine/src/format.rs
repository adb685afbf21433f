//! fr-FR money and delay formatting, and the plain-text recap.

use crate::types::{DeliveryRange, Quote};

/// Narrow no-break space, the fr-FR digit group separator.
const GROUP_SEP: char = '\u{202f}';
const NBSP: char = '\u{a0}';

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(GROUP_SEP);
        }
        out.push(c);
    }
    out
}

/// `1010` → `1 010,00 €`.
pub fn money_eur(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{},00{NBSP}€", group_thousands(amount.unsigned_abs()))
}

/// Amount in minor units as `12.50 EUR`; empty for non-positive amounts.
pub fn money_from_minor(minor: i64, currency: &str) -> String {
    if minor <= 0 {
        return String::new();
    }
    format!(
        "{}.{:02} {}",
        minor / 100,
        minor % 100,
        currency.to_uppercase()
    )
}

/// `8–13 jours ouvrés`, or `8 jours ouvrés` when both bounds match.
pub fn delivery_text(range: DeliveryRange) -> String {
    if range.min_days == 0 || range.max_days == 0 {
        return "—".to_string();
    }
    if range.min_days == range.max_days {
        format!("{} jours ouvrés", range.min_days)
    } else {
        format!("{}–{} jours ouvrés", range.min_days, range.max_days)
    }
}

/// Plain-text recap stored with the order and shown on the checkout page.
pub fn build_recap(quote: &Quote) -> String {
    let mut parts = vec!["Récap pack".to_string()];
    for line in &quote.line_items {
        if line.amount > 0 {
            parts.push(format!("- {} : {}", line.label, money_eur(line.amount.into())));
        } else {
            parts.push(format!("- {}", line.label));
        }
    }
    parts.push(String::new());
    parts.push(format!(
        "Total one-shot : {}",
        money_eur(quote.one_shot_total.into())
    ));
    parts.push(format!(
        "Mensuel : {} / mois",
        money_eur(quote.monthly_total.into())
    ));
    parts.join("\n")
}
