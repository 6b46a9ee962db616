// exported modules
pub mod error;
pub mod http;
pub mod model;

// client impls
pub mod grading;

// re-exports
pub use error::*;
pub use grading::{ClientOptions, GradingUrls, HttpGradingClient};
pub use model::*;

// internal modules
mod util;
