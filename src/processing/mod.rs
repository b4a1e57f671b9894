//! Filter construction and streaming application.
//!
//! - [`literal`]: per-type literal parsers ([`PrimitiveDomain`])
//! - [`filter`]: typed filter factories and the run-time [`resolve()`] dispatch
//! - [`stream`]: lazy, fail-fast [`apply()`] over a row iterator
//!
//! ## Example
//!
//! ```rust
//! use record_filter::execution::CancellationToken;
//! use record_filter::processing::{apply, resolve};
//! use record_filter::types::{PrimitiveType, RawTargetConfig, Row, Value};
//!
//! let filter = resolve(PrimitiveType::String, &RawTargetConfig::new("status", "active")).unwrap();
//! let rows = vec![
//!     Ok(Row::new().with("status", "active")),
//!     Ok(Row::new().with("status", "inactive")),
//!     Ok(Row::new()),
//!     Ok(Row::new().with("status", Value::Null)),
//! ];
//!
//! let kept: Vec<Row> = apply(&filter, &CancellationToken::new(), rows)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(kept, vec![Row::new().with("status", "active")]);
//! ```

pub mod filter;
pub mod literal;
pub mod stream;

pub use filter::{resolve, Filter, FilterResult, TypedFilterFactory};
pub use literal::{parse_value, PrimitiveDomain};
pub use stream::{apply, FilteredRows};
