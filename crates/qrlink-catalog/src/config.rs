use qrlink_generator::random::DEFAULT_CODE_LENGTH;
use typed_builder::TypedBuilder;

/// Tunables of the record store.
#[derive(Debug, Clone, TypedBuilder)]
pub struct CatalogConfig {
    /// How many generated codes are tried before a create gives up with a
    /// conflict. Caller-supplied codes are never regenerated.
    #[builder(default = 3)]
    pub code_attempts: usize,
    /// Length of generated hex codes.
    #[builder(default = DEFAULT_CODE_LENGTH)]
    pub code_length: usize,
    /// Optional secret mixed into client IP hashes.
    #[builder(default, setter(strip_option, into))]
    pub ip_hash_salt: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
