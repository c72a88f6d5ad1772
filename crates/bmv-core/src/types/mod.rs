pub mod beacon;
pub mod execution;
pub mod proof;

pub use beacon::*;
pub use execution::*;
pub use proof::*;
