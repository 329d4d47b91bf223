pub mod generator;
pub mod module;

pub use generator::PostGenerator;
