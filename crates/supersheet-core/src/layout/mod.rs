pub mod cluster;
pub mod segmenter;

pub use cluster::{cluster_1d, Cluster};
pub use segmenter::{segment_page, Block};
