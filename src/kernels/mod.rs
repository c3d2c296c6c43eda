//! This module contains all pure, stateless parsing and downcasting kernels.
//!
//! Kernels operate on single values or plain slices, know nothing about columns,
//! force casts, or configuration objects, and never log.

pub mod complex;
pub mod datetime;
pub mod downcast;
pub mod duration;

pub use complex::parse_complex;
pub use datetime::{parse_datetime, parse_datetime_with_format};
pub use downcast::{downcast, parse_number, Downcast, Number};
pub use duration::parse_duration;

/// Parses the boolean spellings accepted by a `bool` force cast.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}
