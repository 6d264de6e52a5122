pub mod anthropic;
pub mod client;
pub mod decode;
pub mod gemini;
pub mod openai;
pub mod prompts;
pub mod retry;

pub use anthropic::*;
pub use client::*;
pub use decode::*;
pub use gemini::*;
pub use openai::*;
pub use prompts::*;
pub use retry::*;
