//! Error types. Display strings are shown to the visitor as-is.

use thiserror::Error;

/// Rejections from the authoritative (server-side) recompute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("Option mensuelle invalide.")]
    InvalidMonthly(i64),

    #[error("Langues invalides : {selected} sélectionnées, {expected} attendue(s).")]
    LanguageCountMismatch { selected: usize, expected: u32 },

    #[error("Langues invalides : doublons.")]
    DuplicateLanguages,

    #[error("Langue non supportée : {0}")]
    UnsupportedLanguage(String),

    #[error("Pack contenu invalide.")]
    InvalidContentPack(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage unavailable")]
    Unavailable,
}

/// Reasons the configurator refuses to hand an order to checkout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Merci de cocher la case d’autorisation avant de passer au paiement.")]
    ConsentRequired,

    #[error("Choisis exactement {expected} langue(s) (actuellement : {selected}).")]
    LanguageCount { expected: u32, selected: usize },

    #[error("Merci de choisir des langues différentes (pas de doublons).")]
    DuplicateLanguages,

    #[error("Champ obligatoire manquant : {0}")]
    MissingField(&'static str),

    #[error("Email invalide.")]
    InvalidEmail,

    #[error("Impossible de préparer la commande (stockage navigateur). Essaie un autre navigateur ou désactive le mode privé.")]
    Storage(#[from] StorageError),
}
