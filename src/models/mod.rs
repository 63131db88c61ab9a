pub mod chart;
pub mod dataset;
