//! Table input/output and sampling helpers shared by the workspace
//!
//! - delimited text (optionally gzipped) readers and writers
//! - keyed tables with nullable numeric columns, stored as parquet
//! - reproducible group partitioning and minibatch intervals

pub mod common_io;
pub mod parquet;
pub mod table;
pub mod utils;
