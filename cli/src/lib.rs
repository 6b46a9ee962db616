pub mod cmd;
pub mod config;
pub mod style;
pub mod util;
