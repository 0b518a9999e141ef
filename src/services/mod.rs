pub mod espn;
pub mod stats;
