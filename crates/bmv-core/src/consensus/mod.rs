pub mod block_update;
pub mod sync_committee;

pub use block_update::*;
pub use sync_committee::*;
