// Crate root library declaration and module exports.
pub mod cli;
pub mod clock;
pub mod config;
pub mod context;
pub mod export;
pub mod model;
pub mod reminder;
pub mod storage;
pub mod store;
