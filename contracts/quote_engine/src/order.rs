//! # Order record
//!
//! The canonical snapshot of a configurator submission. It is written to
//! browser storage, posted to the checkout endpoint, embedded in the payment
//! session metadata and finally decoded again by the payment webhook.
//!
//! The JSON shape is camelCase and every field is optional on the way in:
//! numeric config fields accept numbers or numeric strings, and anything that
//! does not parse falls back to the field default (the engine then clamps).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const ORDER_SOURCE: &str = "configurateur";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderRecord {
    pub created_at: String,
    pub customer: Customer,
    pub project: Project,
    pub config: OrderConfig,
    pub totals: Totals,
    pub recap: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
}

impl OrderRecord {
    /// Options switched on, comma separated, in key order.
    pub fn selected_checks(&self) -> String {
        self.config
            .checks
            .iter()
            .filter(|(_, on)| **on)
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
    pub birth: Birth,
    pub company: Company,
}

impl Customer {
    /// `name`, or first and last name joined when it is blank.
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        [self.first_name.trim(), self.last_name.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub line1: String,
    pub line2: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Birth {
    pub date: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Company {
    pub name: String,
    pub siret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub niche: String,
    /// Human-readable delivery estimate, e.g. `8–13 jours ouvrés`.
    #[serde(rename = "delai_estime", alias = "delaiEstime", alias = "delai")]
    pub estimated_delivery: String,
}

/// The pricing-relevant part of an order. The only part the server prices from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderConfig {
    #[serde(deserialize_with = "lenient::checks")]
    pub checks: BTreeMap<String, bool>,
    #[serde(deserialize_with = "lenient::int_or_zero")]
    pub aff_extra: i64,
    #[serde(deserialize_with = "lenient::content_pack")]
    pub content_pack: i64,
    #[serde(deserialize_with = "lenient::int_or_zero")]
    pub monthly: i64,
    #[serde(deserialize_with = "lenient::lang_count")]
    pub lang_count: i64,
    #[serde(deserialize_with = "lenient::strings")]
    pub langs: Vec<String>,
    #[serde(deserialize_with = "lenient::truthy")]
    pub consent: bool,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            checks: BTreeMap::new(),
            aff_extra: 0,
            content_pack: 150,
            monthly: 0,
            lang_count: 1,
            langs: Vec::new(),
            consent: false,
        }
    }
}

/// Totals as computed by the configurator. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Totals {
    #[serde(deserialize_with = "lenient::int_or_zero")]
    pub one_shot: i64,
    #[serde(deserialize_with = "lenient::int_or_zero")]
    pub monthly: i64,
}

mod lenient {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Leading-integer parse: `"12abc"` is 12, `"abc"` is nothing, `2.9` is 2.
    pub(super) fn parse_int(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => {
                let s = s.trim();
                let (sign, digits) = match s.strip_prefix('-') {
                    Some(rest) => (-1, rest),
                    None => (1, s.strip_prefix('+').unwrap_or(s)),
                };
                let end = digits
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(digits.len());
                digits[..end].parse::<i64>().ok().map(|n| sign * n)
            }
            _ => None,
        }
    }

    pub(super) fn is_truthy(value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    pub(super) fn int_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(parse_int(&Value::deserialize(d)?).unwrap_or(0))
    }

    pub(super) fn lang_count<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(parse_int(&Value::deserialize(d)?).unwrap_or(1))
    }

    pub(super) fn content_pack<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(parse_int(&Value::deserialize(d)?).unwrap_or(150))
    }

    pub(super) fn truthy<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(is_truthy(&Value::deserialize(d)?))
    }

    pub(super) fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let items = match Value::deserialize(d)? {
            Value::Array(items) => items,
            _ => return Ok(Vec::new()),
        };
        Ok(items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .filter(|s| !s.is_empty())
            .collect())
    }

    pub(super) fn checks<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, bool>, D::Error> {
        match Value::deserialize(d)? {
            Value::Object(map) => Ok(map.into_iter().map(|(k, v)| (k, is_truthy(&v))).collect()),
            _ => Ok(BTreeMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_browser_shape() {
        let raw = json!({
            "createdAt": "2025-03-01T10:00:00.000Z",
            "customer": {
                "firstName": "Ada",
                "lastName": "Martin",
                "email": "ada@example.com",
                "address": { "line1": "1 rue A", "postalCode": "75001" },
                "birth": { "date": "1990-01-01" },
                "company": { "siret": "123" }
            },
            "project": { "niche": "jardin", "delai_estime": "8–13 jours ouvrés" },
            "config": {
                "checks": { "seo_silos": true, "schema": false },
                "affExtra": 2,
                "contentPack": 490,
                "monthly": 49,
                "langCount": 2,
                "langs": ["fr", "en"],
                "consent": true
            },
            "totals": { "oneShot": 1234, "monthly": 49 },
            "recap": "Récap pack",
            "source": "configurateur"
        });
        let order: OrderRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(order.customer.address.postal_code, "75001");
        assert_eq!(order.project.estimated_delivery, "8–13 jours ouvrés");
        assert_eq!(order.config.content_pack, 490);
        assert_eq!(order.config.langs, vec!["fr", "en"]);
        assert!(order.config.consent);
        assert_eq!(order.totals.one_shot, 1234);
        assert_eq!(order.selected_checks(), "seo_silos");
        assert_eq!(order.customer.display_name(), "Ada Martin");
    }

    #[test]
    fn numeric_strings_and_garbage() {
        let config: OrderConfig = serde_json::from_value(json!({
            "affExtra": "3",
            "contentPack": "990",
            "langCount": "abc",
            "monthly": null,
            "langs": ["fr", "", null, 7],
            "checks": { "performance": 1, "schema": "" },
            "consent": "on"
        }))
        .unwrap();
        assert_eq!(config.aff_extra, 3);
        assert_eq!(config.content_pack, 990);
        assert_eq!(config.lang_count, 1);
        assert_eq!(config.monthly, 0);
        assert_eq!(config.langs, vec!["fr", "7"]);
        assert_eq!(config.checks["performance"], true);
        assert_eq!(config.checks["schema"], false);
        assert!(config.consent);
    }

    #[test]
    fn missing_config_uses_defaults() {
        let order: OrderRecord = serde_json::from_value(json!({ "customer": {} })).unwrap();
        assert_eq!(order.config, OrderConfig::default());
    }

    #[test]
    fn delivery_aliases() {
        let p: Project = serde_json::from_value(json!({ "delaiEstime": "x" })).unwrap();
        assert_eq!(p.estimated_delivery, "x");
        let p: Project = serde_json::from_value(json!({ "delai": "y" })).unwrap();
        assert_eq!(p.estimated_delivery, "y");
        assert_eq!(serde_json::to_value(&p).unwrap()["delai_estime"], "y");
    }

    #[test]
    fn parse_int_mimics_leading_digits() {
        assert_eq!(lenient::parse_int(&json!("12abc")), Some(12));
        assert_eq!(lenient::parse_int(&json!(" -4 ")), Some(-4));
        assert_eq!(lenient::parse_int(&json!(2.9)), Some(2));
        assert_eq!(lenient::parse_int(&json!("abc")), None);
        assert_eq!(lenient::parse_int(&json!(true)), None);
    }
}
