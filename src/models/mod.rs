pub mod enums;
pub mod claim;
pub mod coding;
pub mod settlement;

pub use enums::*;
pub use claim::*;
pub use coding::*;
pub use settlement::*;
