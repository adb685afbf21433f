//! # Post-submission client flows
//!
//! Two pages read the stored order after the configurator:
//!
//! - the checkout page shows the recap and posts the order to the checkout
//!   endpoint;
//! - the thank-you page, reached with the provider's `session_id`, submits a
//!   flat confirmation record and clears storage once that succeeded.

use crate::format::money_eur;
use crate::order::OrderRecord;
use crate::storage::{load_order, TransientStorage, ORDER_STORAGE_KEY};

/// Name of the confirmation form the thank-you page submits.
pub const CONFIRMATION_FORM: &str = "commande";

/// Where the checkout page posts [`CheckoutPage::Ready`] requests.
pub const CHECKOUT_ENDPOINT: &str = "/api/create-checkout-session";

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutPage {
    /// Nothing stored; the pay button stays disabled.
    Empty,
    /// An order exists but consent was not given; the visitor must go back.
    ConsentMissing { recap: String },
    Ready {
        recap: String,
        one_shot: String,
        monthly: String,
        /// Body for the checkout endpoint.
        request: OrderRecord,
    },
}

impl CheckoutPage {
    pub fn load(storage: &impl TransientStorage) -> Self {
        let Some(order) = load_order(storage) else {
            return Self::Empty;
        };

        let recap = match order.recap.trim() {
            "" => "Récap indisponible.".to_string(),
            r => r.to_string(),
        };

        if !order.config.consent {
            return Self::ConsentMissing { recap };
        }

        Self::Ready {
            recap,
            one_shot: money_eur(order.totals.one_shot),
            monthly: format!("{} / mois", money_eur(order.totals.monthly)),
            request: order,
        }
    }
}

/// Flat field set recorded after payment.
pub fn confirmation_fields(order: &OrderRecord, session_id: &str) -> Vec<(&'static str, String)> {
    let c = &order.customer;
    vec![
        ("stripe_session_id", session_id.to_string()),
        ("created_at", order.created_at.clone()),
        ("prenom", c.first_name.clone()),
        ("nom", c.last_name.clone()),
        ("email", c.email.clone()),
        ("telephone", c.phone.clone()),
        ("adresse_l1", c.address.line1.clone()),
        ("adresse_l2", c.address.line2.clone()),
        ("code_postal", c.address.postal_code.clone()),
        ("ville", c.address.city.clone()),
        ("pays", c.address.country.clone()),
        ("date_naissance", c.birth.date.clone()),
        ("lieu_naissance_ville", c.birth.city.clone()),
        ("lieu_naissance_pays", c.birth.country.clone()),
        ("societe", c.company.name.clone()),
        ("siret", c.company.siret.clone()),
        ("niche", order.project.niche.clone()),
        ("delai_estime", order.project.estimated_delivery.clone()),
        ("nombre_langues", order.config.lang_count.to_string()),
        ("langues", order.config.langs.join(", ")),
        ("total_one_shot", order.totals.one_shot.to_string()),
        ("total_monthly", order.totals.monthly.to_string()),
        ("recap", order.recap.clone()),
        (
            "config_json",
            serde_json::to_string(&order.config).unwrap_or_default(),
        ),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// No session id, no stored order, or no consent.
    Skipped,
    /// Submission failed; the order stays stored for a retry.
    Kept,
    /// Submitted and removed from storage.
    Completed,
}

/// Run the thank-you page flow. `submit` returns whether the confirmation was accepted.
pub fn complete_confirmation<S, F>(storage: &mut S, session_id: Option<&str>, submit: F) -> ConfirmationOutcome
where
    S: TransientStorage,
    F: FnOnce(&str, &[(&'static str, String)]) -> bool,
{
    let Some(session_id) = session_id.filter(|s| !s.is_empty()) else {
        return ConfirmationOutcome::Skipped;
    };
    let Some(order) = load_order(storage) else {
        return ConfirmationOutcome::Skipped;
    };
    if !order.config.consent {
        return ConfirmationOutcome::Skipped;
    }

    let fields = confirmation_fields(&order, session_id);
    if !submit(CONFIRMATION_FORM, &fields) {
        return ConfirmationOutcome::Kept;
    }

    // A failed removal only means the order lingers until the tab closes.
    let _ = storage.remove_item(ORDER_STORAGE_KEY);
    ConfirmationOutcome::Completed
}
