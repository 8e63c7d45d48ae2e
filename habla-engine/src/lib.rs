pub mod diagnostics;
pub mod router;
pub mod traits;
pub mod tutor;
