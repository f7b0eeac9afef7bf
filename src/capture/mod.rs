mod client;
pub mod config;
mod model;
mod readiness;
mod taker;

pub use config::CaptureConfig;
pub use model::CapturedPage;
pub use taker::PageCapturer;
