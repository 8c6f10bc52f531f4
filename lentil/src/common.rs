pub use matrix_util::common_io::mkdir;
pub use matrix_util::table::Table;

pub use lentil::aggregate::*;
pub use lentil::balanced_sampler::balanced_sample;
pub use lentil::evaluation::Evaluation;
pub use lentil::evidence::*;
pub use lentil::EdgeError;
pub use lentil::ground_truth::*;
pub use lentil::reshape::*;

pub use clap::{Args, Parser, Subcommand};
pub use log::{info, warn};
