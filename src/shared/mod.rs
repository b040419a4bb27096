pub mod geo;
pub mod naming;

pub use geo::*;
pub use naming::*;
