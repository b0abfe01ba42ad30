pub mod download_coordinator;
pub mod link_fetcher;
pub mod session;

pub use download_coordinator::{DownloadCoordinator, SaveEvent, SaveJob};
pub use link_fetcher::FetchEvent;
pub use session::{Effect, SessionController, Timer};
