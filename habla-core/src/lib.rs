pub mod catalog;
pub mod config;
pub mod conversation;
pub mod prompts;
pub mod reply;
pub mod types;

// Keep the public surface small and intentional.
pub use catalog::*;
pub use config::*;
pub use conversation::*;
pub use prompts::*;
pub use reply::*;
pub use types::*;
