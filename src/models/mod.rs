pub mod finding;
pub mod turn;
pub mod window;

pub use finding::*;
pub use turn::*;
pub use window::*;
