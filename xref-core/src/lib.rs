//! Cross-reference core: usage index, annotation store, and batch indexing.
//!
//! The decompilation pipeline feeds each generated class into
//! [`usage::UsageIndex`] (directly or through [`pipeline::IndexPipeline::run`]),
//! and the code generator consults [`annotations::AnnotationStore`] while
//! emitting instructions, splicing matches in with [`codegen::splice_comments`].

pub mod annotations;
pub mod codegen;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod usage;

pub use xref_graph;
