pub mod service;

pub use service::{ConfigInfo, TutorService};
