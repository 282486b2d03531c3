use crate::Generator;
use rand::rngs::OsRng;
use rand::RngCore;
use typed_builder::TypedBuilder;

/// Default number of hex characters in a generated code.
pub const DEFAULT_CODE_LENGTH: usize = 10;

/// Random lowercase hexadecimal codes drawn from the operating system's
/// cryptographically strong source.
///
/// A code of `length` characters carries `4 * length` bits of entropy; the
/// default of 10 characters gives 40 bits.
#[derive(Debug, Clone, TypedBuilder)]
pub struct HexGenerator {
    #[builder(default = DEFAULT_CODE_LENGTH)]
    length: usize,
}

impl HexGenerator {
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a generator producing codes of `length` characters.
    pub fn with_length(length: usize) -> Self {
        Self::builder().length(length).build()
    }
}

impl Default for HexGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for HexGenerator {
    fn generate(&self) -> String {
        let mut bytes = vec![0_u8; self.length.div_ceil(2)];
        OsRng.fill_bytes(&mut bytes);

        let mut code = hex::encode(bytes);
        code.truncate(self.length);
        code
    }
}
