pub mod config;
pub mod package;
pub mod paths;
pub mod progress;
pub mod shell;
pub mod terminal;
