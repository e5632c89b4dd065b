//! Typed, ordered request-data records
//!
//! This crate wraps loosely typed key/value inputs (URL queries, form
//! bodies, cookie jars, database rows) in [`ValueMap`], an immutable record
//! that preserves insertion order and resolves duplicate names to their
//! first occurrence. Accessors coerce the raw values on the way out:
//!
//! - booleans from the literal set `true`/`on`/`yes`/`1` (and their
//!   negatives)
//! - integers from unsigned digit strings
//! - date/times from formatted text or unix timestamps
//! - durations from `H:MM:SS.ffffff` text or second counts
//! - UUIDs from canonical text or raw 16-byte strings
//! - nested records and opaque typed objects
//!
//! Strict accessors fail with a [`RecordError`]; `get_nullable_*` variants
//! map null-ish raw values to `None` instead. The scalar types the coercions
//! produce that the ecosystem does not already provide, [`TimeSpan`] and
//! [`Time`], live here too.
//!
//! # Example
//!
//! ```
//! use micro_record::ValueMap;
//!
//! # fn main() -> Result<(), micro_record::RecordError> {
//! let query = ValueMap::from_pairs([("page", "2"), ("archived", "no")]);
//!
//! assert_eq!(query.get_int("page")?, 2);
//! assert!(!query.get_bool("archived")?);
//! # Ok(())
//! # }
//! ```

mod error;
mod time;
mod time_span;
mod value;
mod value_map;

pub use error::RecordError;
pub use time::Time;
pub use time_span::TimeSpan;
pub use value::Value;
pub use value_map::ValueMap;
