//! Similarity Clustering Engine and Representative Selector.
//!
//! Both are pure functions over immutable inputs: vectors in, partition out
//! ([`Dbscan::fit_predict`]); partition in, one winner per cluster out
//! ([`select_representatives`]).

mod dbscan;
mod select;
mod similarity;
mod types;

pub use dbscan::Dbscan;
pub use select::{KeepStrategy, Representative, select_representatives};
pub use similarity::{cosine_distance, cosine_similarity, is_degenerate};
pub use types::{ClusterId, Clustering};
