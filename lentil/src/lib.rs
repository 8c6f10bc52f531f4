pub mod aggregate;
pub mod balanced_sampler;
pub mod error;
pub mod evaluation;
pub mod evidence;
pub mod ground_truth;
pub mod pair_aggregate;
pub mod reshape;
pub mod score_normalization;
pub mod scoring;

pub use error::EdgeError;
