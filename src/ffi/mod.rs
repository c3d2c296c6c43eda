//! Foreign-language bindings. Compiled only with the matching cargo feature.

#[cfg(feature = "python")]
pub mod python;
