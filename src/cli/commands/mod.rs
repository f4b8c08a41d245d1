//! CLI command implementations

pub mod config;
pub mod icon;
pub mod status;
pub mod sync;

pub use config::execute as config;
pub use icon::execute as icon;
pub use status::execute as status;
pub use sync::execute as sync;
