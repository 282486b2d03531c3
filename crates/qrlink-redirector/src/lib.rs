//! Public resolution of QR codes and friendly slugs.
//!
//! [`RedirectorService`] reaches records through the code and slug indexes
//! without regard to ownership, refuses inactive records, and logs a visit
//! for every successful resolution.

pub mod redirector;
pub mod service;

pub use redirector::Redirector;
pub use service::{RedirectorService, VisitRecording};
