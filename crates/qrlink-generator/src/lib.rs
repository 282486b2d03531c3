//! Short code generators.
//!
//! Generated codes are not assumed to be unique: the catalog checks every
//! code against the code index before committing a record.

pub mod random;
pub mod seq;

pub use self::random::HexGenerator;
pub use self::seq::SeqGenerator;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
pub trait Generator: Send + Sync + 'static {
    /// Generates a candidate short code.
    fn generate(&self) -> String;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self) -> String {
        (**self).generate()
    }
}
