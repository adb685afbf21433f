//! # Order assembly
//!
//! Gate between the configurator and checkout. On submit the selection is
//! re-priced, checked, combined with the identity form and written to
//! transient storage. Checks run in this order and the first failure wins:
//!
//! 1. consent is given;
//! 2. exactly `lang_count` distinct languages are selected;
//! 3. required identity fields are filled and the email looks valid.
//!
//! Nothing is written and no navigation happens unless every check passes and
//! the storage write succeeds.

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::{StorageError, SubmitError};
use crate::format::{build_recap, delivery_text};
use crate::languages::clamp_lang_count;
use crate::order::{Address, Birth, Company, Customer, OrderConfig, OrderRecord, Project, Totals, ORDER_SOURCE};
use crate::pricing::PricingTable;
use crate::storage::{TransientStorage, ORDER_STORAGE_KEY};
use crate::types::{Language, OptionKey, SelectionState};

/// Where the visitor goes after a successful submission.
pub const CHECKOUT_PATH: &str = "/paiement/";

/// Niche select value that switches to the free-text field.
pub const NICHE_OTHER: &str = "autre";

/// Identity fields of the order form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub birth_date: String,
    pub birth_city: String,
    pub birth_country: String,
    pub company_name: String,
    pub siret: String,
}

impl OrderForm {
    fn validate(&self) -> Result<(), SubmitError> {
        let required = [
            ("prenom", &self.first_name),
            ("nom", &self.last_name),
            ("email", &self.email),
            ("telephone", &self.phone),
            ("adresse_l1", &self.address_line1),
            ("code_postal", &self.postal_code),
            ("ville", &self.city),
            ("pays", &self.country),
            ("date_naissance", &self.birth_date),
            ("lieu_naissance_ville", &self.birth_city),
            ("lieu_naissance_pays", &self.birth_country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SubmitError::MissingField(field));
            }
        }
        if !is_valid_email(&self.email) {
            return Err(SubmitError::InvalidEmail);
        }
        Ok(())
    }

    fn customer(&self) -> Customer {
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        let name = [first_name.as_str(), last_name.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Customer {
            first_name,
            last_name,
            name,
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: Address {
                line1: self.address_line1.trim().to_string(),
                line2: self.address_line2.trim().to_string(),
                postal_code: self.postal_code.trim().to_string(),
                city: self.city.trim().to_string(),
                country: self.country.trim().to_string(),
            },
            birth: Birth {
                date: self.birth_date.trim().to_string(),
                city: self.birth_city.trim().to_string(),
                country: self.birth_country.trim().to_string(),
            },
            company: Company {
                name: self.company_name.trim().to_string(),
                siret: self.siret.trim().to_string(),
            },
        }
    }
}

/// `local@domain` with no whitespace and text on both sides of a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// The niche the order records: the free-text value when "autre" is picked.
pub fn resolve_niche(choice: &str, other: &str) -> String {
    let choice = choice.trim();
    if choice == NICHE_OTHER {
        other.trim().to_string()
    } else {
        choice.to_string()
    }
}

/// Build the order record for `selection` and `form`, without touching storage.
pub fn assemble_order(
    table: &PricingTable,
    selection: &SelectionState,
    form: &OrderForm,
    queue_len: u32,
    now: DateTime<Utc>,
) -> Result<OrderRecord, SubmitError> {
    if !selection.consent {
        return Err(SubmitError::ConsentRequired);
    }

    let lang_count = clamp_lang_count(i64::from(selection.lang_count), table.max_languages);
    let langs: Vec<Language> = if selection.languages.is_empty() {
        vec![Language::DEFAULT]
    } else {
        selection.languages.clone()
    };
    if langs.len() != lang_count as usize {
        return Err(SubmitError::LanguageCount {
            expected: lang_count,
            selected: langs.len(),
        });
    }
    let unique: BTreeSet<Language> = langs.iter().copied().collect();
    if unique.len() != langs.len() {
        return Err(SubmitError::DuplicateLanguages);
    }

    if selection.niche.trim().is_empty() {
        return Err(SubmitError::MissingField("niche"));
    }
    form.validate()?;

    let quote = table.quote(selection, queue_len);
    let affiliate_extra = if selection.is_checked(OptionKey::ProgrammeAffilie1) {
        selection.affiliate_extra.min(table.affiliate_extra_max)
    } else {
        0
    };

    Ok(OrderRecord {
        created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        customer: form.customer(),
        project: Project {
            niche: selection.niche.trim().to_string(),
            estimated_delivery: delivery_text(quote.delivery),
        },
        config: OrderConfig {
            checks: selection.checks(),
            aff_extra: affiliate_extra.into(),
            content_pack: selection.content_pack.price().into(),
            monthly: selection.monthly.price().into(),
            lang_count: lang_count.into(),
            langs: langs.iter().map(|l| l.code().to_string()).collect(),
            consent: selection.consent,
        },
        totals: Totals {
            one_shot: quote.one_shot_total.into(),
            monthly: quote.monthly_total.into(),
        },
        recap: build_recap(&quote),
        source: ORDER_SOURCE.to_string(),
    })
}

/// Assemble the order, persist it and return the checkout path to navigate to.
pub fn submit_order<S: TransientStorage>(
    storage: &mut S,
    selection: &SelectionState,
    form: &OrderForm,
    queue_len: u32,
    now: DateTime<Utc>,
) -> Result<&'static str, SubmitError> {
    let order = assemble_order(&PricingTable::STANDARD, selection, form, queue_len, now)?;
    let json = serde_json::to_string(&order).map_err(|_| StorageError::Unavailable)?;
    storage.set_item(ORDER_STORAGE_KEY, json)?;
    Ok(CHECKOUT_PATH)
}
