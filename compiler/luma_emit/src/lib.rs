//! Luma Emit
//!
//! Generates script source from host data.
//!
//! # Architecture
//!
//! Emission runs in two steps:
//!
//! 1. **Build**: host values (anything `serde::Serialize`, or runtime
//!    [`luma_core::Value`]s) are converted into a [`Literal`] tree, applying
//!    enum styles, custom [`Converter`]s and nil omission
//! 2. **Write**: the [`Writer`] renders literals and statements, choosing
//!    single-line or multi-line layout for each table from its size estimate
//!
//! Finished chunks pass through [`verify_source`] unless verification is
//! turned off in [`EmitConfig`]. A failed statement never leaves partial
//! output behind.
//!
//! # Modules
//!
//! - [`writer`]: token-level writer and table layout
//! - [`builder`]: host data conversion and multi-statement scripts
//! - [`host`]: serde-based capture of host values
//! - [`emitter`]: output sink abstraction
//!
//! # Example
//!
//! ```
//! use luma_emit::Builder;
//!
//! let builder = Builder::default();
//! let source = builder.build_pairs(&[("a", 1), ("b", 2)]).unwrap();
//! assert_eq!(source, "{ a = 1, b = 2 }");
//! ```

pub mod builder;
pub mod config;
pub mod emitter;
pub mod errors;
pub mod host;
pub mod lexical;
pub mod literal;
mod stack;
mod verify;
pub mod writer;

pub use builder::{Builder, ConvertContext, Converter, EnumStyle, Script, CONTEXT_KEY};
pub use config::{EmitConfig, TrailingCommas, SINGLE_LINE_THRESHOLD};
pub use emitter::{Emitter, StringEmitter};
pub use errors::{BuildError, BuildResult, EmitError, EmitResult};
pub use host::{capture, HostValue, VariantPayload};
pub use literal::{Literal, LiteralKey, TableLiteral, TableShape};
pub use verify::verify_source;
pub use writer::{Checkpoint, Keyword, Operator, Writer};
