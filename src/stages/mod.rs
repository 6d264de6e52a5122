pub mod stage0_chunk;
pub mod stage1_analyst;
pub mod stage2_critic;
pub mod stage3_report;

pub use stage0_chunk::*;
pub use stage1_analyst::*;
pub use stage2_critic::*;
pub use stage3_report::*;
