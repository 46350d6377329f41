pub mod commands;
pub mod controller;
pub mod state;

pub use controller::{UploadController, UploadSnapshot};
pub use state::{ClassificationResult, Prediction, SessionState, UploadStatus};
