pub mod catalog;
pub mod check;
pub mod config;
pub mod format;
pub mod import;
pub mod parse;
pub mod paths;
pub mod repair;
pub mod util;
