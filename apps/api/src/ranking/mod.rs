// Completeness scoring and cross-source ranking. Pure functions, no I/O.

pub mod aggregate;
pub mod completeness;

pub use aggregate::rank_with_total;
