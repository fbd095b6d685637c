pub mod preprocessing;

pub use preprocessing::*;
