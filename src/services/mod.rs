pub mod dataset;
pub mod evaluation;
