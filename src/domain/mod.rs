pub mod error;
pub mod model;

pub use error::AppError;
pub use model::{DownloadRequest, DownloadResult, ProgressStep, SaveState, SessionState};
