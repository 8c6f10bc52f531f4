//! Genomic identifiers
//!
//! This library provides the canonical forms used to join evidence
//! produced by different tools:
//! - chromatin peaks (`chr:start-stop`, half-open)
//! - gene and transcription factor symbols

pub mod peak;
pub mod symbol;

pub use peak::{normalize_chr, parse_peak, MalformedCoordinate, Peak};
pub use symbol::normalize_symbol;
