//! Output writers used by the command-line front end.
//!
//! The library itself never persists anything; the binary hands the returned
//! [`Collection`](crate::models::Collection) to [`json`] when `--output` is
//! given.

pub mod json;
