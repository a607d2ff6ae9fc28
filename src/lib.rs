pub mod cli;
pub mod config;
pub mod ignore;
pub mod query;
pub mod runtime;
pub mod scan;
pub mod stats;
pub mod store;
pub mod usage;
pub mod util;

pub use cli::run_cli;
