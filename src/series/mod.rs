//! Series generators and merging
//!
//! Turns compiled sequence state into the ordered series stream: one
//! [`SeriesGenerator`] per measurement and field, any number of them merged
//! into a single key-ordered stream by [`MergedSeriesGenerator`].

pub mod generator;
pub mod merge;

pub use generator::SeriesGenerator;
pub use merge::MergedSeriesGenerator;
