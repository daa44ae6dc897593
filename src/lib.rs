pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod quadrature;
pub mod topology;
pub mod tracks;

pub use error::{MocError, Result};
