//! Core value types for the Carve free-range allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: arena offsets,
//! granted spans, the closed-interval [`Range`] used to track free
//! space, and the allocation error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod range;

pub use error::{AllocError, RangeError};
pub use id::{Offset, Span};
pub use range::{BySize, Range};
