pub mod sentiment;
pub mod utils;

pub use sentiment::*;
