pub mod bootstrap;
pub mod frontend;
pub mod router;

pub use bootstrap::{initialize, AppContext, StartupError};
pub use router::create_router;
