//! Webhook authenticity checks.

pub mod signature;

pub use signature::{compute_signature, format_signature_header, verify_signature};
