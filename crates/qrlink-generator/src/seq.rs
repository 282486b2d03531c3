use crate::Generator;
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic generator producing `{prefix}{counter:06}` codes.
///
/// Codes are unique within a single instance. For multi-node use each
/// node needs its own prefix. Mostly useful in tests, where predictable
/// codes make collisions easy to provoke.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
            prefix: self.prefix.clone(),
        }
    }
}

impl SeqGenerator {
    /// Creates a new sequential generator with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_offset(prefix, 0)
    }

    /// Creates a new sequential generator starting from a specific counter value.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
            prefix: prefix.into(),
        }
    }
}

impl Generator for SeqGenerator {
    fn generate(&self) -> String {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}{:06}", self.prefix, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_sequential_codes() {
        let generator = SeqGenerator::with_prefix("qr");

        assert_eq!(generator.generate(), "qr000000");
        assert_eq!(generator.generate(), "qr000001");
        assert_eq!(generator.generate(), "qr000002");
    }

    #[test]
    fn starts_at_offset() {
        let generator = SeqGenerator::with_offset("qr", 1000);

        assert_eq!(generator.generate(), "qr001000");
        assert_eq!(generator.generate(), "qr001001");
    }

    #[test]
    fn clone_preserves_counter_state() {
        let generator = SeqGenerator::with_prefix("qr");
        generator.generate();
        generator.generate();

        let cloned = generator.clone();

        assert_eq!(generator.generate(), "qr000002");
        assert_eq!(cloned.generate(), "qr000002");
    }

    #[test]
    fn boxed_generators_delegate() {
        let generator: Box<dyn Generator> = Box::new(SeqGenerator::with_prefix("b"));
        assert_eq!(generator.generate(), "b000000");
    }
}
