pub mod trim_adapters;

pub use trim_adapters::*;
