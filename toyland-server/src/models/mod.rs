//! Wire-level models
//!
//! Toys are schema-less BSON documents. These modules convert them to and
//! from JSON and hold the fixed query shapes the routes use.

pub mod document;
pub mod pagination;
pub mod toy;

pub use document::{bson_to_json, document_to_json, fields_from_json, serialize_bson, FieldsError};
pub use pagination::{parse_page, page_skip, PAGE_SIZE, RECENT_LIMIT, SEARCH_LIMIT};
pub use toy::{stamp_created_at, TotalToys};
