pub mod outcome;
pub mod stats;
pub mod forecast;

pub use outcome::*;
pub use stats::*;
pub use forecast::*;
