//! Structured documents exchanged between specialist roles
//!
//! A document is a flat map from field name to JSON value. Values may be
//! primitives, lists, or nested objects — whatever the generative backend
//! proposed — but field names are unique within one document.

pub mod proposal;
pub mod shape;

pub use proposal::{FallbackDocument, ProposalDocument};
pub use shape::ExpectedShape;
