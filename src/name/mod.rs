//! Dotted resource names.
//!
//! Names are parsed with a small PEG grammar (`dotted_name.pest`) so that
//! malformed input (`a..b`, `a.`, empty strings) is rejected in one place and
//! every [`DottedName`] further down is known to be well formed.

mod api;

pub use api::{DottedName, NameParser, Rule};
