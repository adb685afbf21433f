//! # Quote engine
//!
//! Shared pricing contract of the site configurator. The same code prices the
//! live preview in the browser and the authoritative recompute on the
//! checkout server, so both sides agree on every derived value.
//!
//! | Phase          | Entry point(s)                                      |
//! |----------------|-----------------------------------------------------|
//! | Preview        | [`compute_quote`], [`LanguagePanel`], [`Preset`]    |
//! | Submission     | [`assemble_order`], [`submit_order`]                |
//! | Checkout page  | [`CheckoutPage::load`]                              |
//! | Server pricing | [`authoritative_quote`]                             |
//! | Thank-you page | [`complete_confirmation`]                           |
//!
//! ## Architecture
//!
//! Every constant lives in [`pricing`]. The rules in [`engine`] read nothing
//! else, perform no I/O and never fail on in-domain input: out-of-range
//! numbers are clamped. Only the server entry point rejects input, and only
//! values outside the fixed tier sets or the language catalog.

pub mod assembler;
pub mod engine;
pub mod errors;
pub mod flow;
pub mod format;
pub mod languages;
pub mod order;
pub mod presets;
pub mod pricing;
pub mod storage;
pub mod types;

#[cfg(test)]
mod fuzz_test;
#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_scenarios;

pub use assembler::{assemble_order, submit_order, OrderForm, CHECKOUT_PATH};
pub use engine::{authoritative_quote, compute_quote};
pub use errors::{QuoteError, StorageError, SubmitError};
pub use flow::{complete_confirmation, CheckoutPage, ConfirmationOutcome, CHECKOUT_ENDPOINT};
pub use languages::{apply_language_rules, LanguagePanel, LanguageToggle};
pub use order::{OrderConfig, OrderRecord};
pub use presets::Preset;
pub use pricing::{ContentPack, MonthlyPlan, PricingTable, PRICING_VERSION};
pub use storage::{MemoryStorage, TransientStorage, ORDER_STORAGE_KEY};
pub use types::{DeliveryRange, Language, LineItem, OptionKey, Quote, SelectionState};
