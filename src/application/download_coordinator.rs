use std::path::{Path, PathBuf};

use futures::{channel::mpsc, stream::BoxStream, StreamExt};
use tokio::io::AsyncWriteExt;

use super::link_fetcher::{fetch_with_retry, FetchEvent};
use crate::{api::ApiClient, domain::AppError, utils::DEFAULT_VIDEO_FILENAME};

#[derive(Debug, Clone)]
pub enum SaveEvent {
    Progress(f32),
    Completed(PathBuf),
    Failed(AppError),
}

/// One save of one resolved link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveJob {
    /// Session cycle whose result is being saved
    pub epoch: u64,
    pub url: String,
    pub target: PathBuf,
}

#[derive(Clone)]
pub struct DownloadCoordinator {
    api_client: ApiClient,
}

impl DownloadCoordinator {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    /// Resolve a post or reel URL into a direct media link, see [`fetch_with_retry`].
    pub fn resolve_link(&self, instagram_url: String) -> BoxStream<'static, FetchEvent> {
        fetch_with_retry(self.api_client.clone(), instagram_url)
    }

    pub async fn choose_save_path(&self) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_file_name(DEFAULT_VIDEO_FILENAME)
            .add_filter("MP4 video", &["mp4"])
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    /// Progress events in 0.0..=1.0, then exactly one `Completed` or `Failed`.
    ///
    /// Bytes go to `<target>.part` and are renamed onto the target only once the
    /// whole body is on disk. Failing, or dropping the stream early, leaves no file behind.
    pub fn save_stream(&self, job: SaveJob) -> BoxStream<'static, SaveEvent> {
        let client = self.api_client.clone();
        let (events, received) = mpsc::unbounded();

        let driver = futures::stream::once(async move {
            let outcome = match save_to_disk(&client, &job, &events).await {
                Ok(path) => SaveEvent::Completed(path),
                Err(e) => SaveEvent::Failed(e),
            };
            let _ = events.unbounded_send(outcome);
        })
        .filter_map(|()| futures::future::ready(None::<SaveEvent>));

        // The driver yields nothing; every event flows through the channel in order.
        futures::stream::select(received, driver).boxed()
    }
}

async fn save_to_disk(
    client: &ApiClient,
    job: &SaveJob,
    events: &mpsc::UnboundedSender<SaveEvent>,
) -> Result<PathBuf, AppError> {
    let (total, body) = client.download_file_stream(&job.url).await?;
    let mut body = Box::pin(body);

    let mut part = PartFile::create(&job.target).await?;
    let _ = events.unbounded_send(SaveEvent::Progress(0.0));

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        part.append(&chunk).await?;
        let _ = events.unbounded_send(SaveEvent::Progress(fraction(part.len(), total)));
    }

    tracing::debug!(
        epoch = job.epoch,
        bytes = part.len(),
        target = %job.target.display(),
        "body complete"
    );
    part.commit().await
}

fn fraction(written: u64, total: Option<u64>) -> f32 {
    match total {
        Some(total) if total > 0 => (written as f32 / total as f32).min(1.0),
        _ => 0.0,
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> AppError {
    AppError::Io(format!("{} {}: {}", action, path.display(), e))
}

/// Partially written download next to its final location.
///
/// Removed on drop unless [`PartFile::commit`] moved it into place.
struct PartFile {
    file: Option<tokio::fs::File>,
    part_path: PathBuf,
    target: PathBuf,
    len: u64,
    committed: bool,
}

impl PartFile {
    fn part_path_for(target: &Path) -> PathBuf {
        let mut name = target.as_os_str().to_owned();
        name.push(".part");
        PathBuf::from(name)
    }

    async fn create(target: &Path) -> Result<Self, AppError> {
        let part_path = Self::part_path_for(target);
        let file = tokio::fs::File::create(&part_path)
            .await
            .map_err(|e| io_error("creating", &part_path, e))?;

        Ok(Self {
            file: Some(file),
            part_path,
            target: target.to_path_buf(),
            len: 0,
            committed: false,
        })
    }

    fn len(&self) -> u64 {
        self.len
    }

    async fn append(&mut self, bytes: &[u8]) -> Result<(), AppError> {
        let Some(file) = self.file.as_mut() else {
            return Err(io_error("writing", &self.part_path, std::io::ErrorKind::NotConnected.into()));
        };
        file.write_all(bytes)
            .await
            .map_err(|e| io_error("writing", &self.part_path, e))?;
        self.len += bytes.len() as u64;
        Ok(())
    }

    async fn commit(mut self) -> Result<PathBuf, AppError> {
        if let Some(file) = self.file.take() {
            file.sync_all()
                .await
                .map_err(|e| io_error("flushing", &self.part_path, e))?;
        }

        tokio::fs::rename(&self.part_path, &self.target)
            .await
            .map_err(|e| io_error("moving into place", &self.target, e))?;

        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Close before unlinking so this also works where open files cannot be removed.
        drop(self.file.take());
        if let Err(e) = std::fs::remove_file(&self.part_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.part_path.display(), error = %e, "could not remove partial download");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiConfig;

    fn coordinator_for(server: &mockito::ServerGuard) -> DownloadCoordinator {
        DownloadCoordinator::new(ApiClient::new(ApiConfig {
            base_url: server.url(),
            ..ApiConfig::default()
        }))
    }

    fn temp_target(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}-{}-video.mp4", name, std::process::id()))
    }

    fn job(url: String, target: &Path) -> SaveJob {
        SaveJob {
            epoch: 1,
            url,
            target: target.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_save_stream_writes_file_and_completes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/media/clip.mp4")
            .with_status(200)
            .with_body(vec![7u8; 4096])
            .create_async()
            .await;

        let target = temp_target("save-ok");
        let url = format!("{}/media/clip.mp4", server.url());
        let events: Vec<SaveEvent> = coordinator_for(&server)
            .save_stream(job(url, &target))
            .collect()
            .await;

        assert!(matches!(events.first(), Some(SaveEvent::Progress(p)) if *p == 0.0));
        assert!(matches!(events.last(), Some(SaveEvent::Completed(p)) if *p == target));
        let last_progress = events
            .iter()
            .filter_map(|e| match e {
                SaveEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .last()
            .unwrap();
        assert_eq!(last_progress, 1.0);

        let written = tokio::fs::read(&target).await.unwrap();
        assert_eq!(written.len(), 4096);
        assert!(!PartFile::part_path_for(&target).exists());
        let _ = tokio::fs::remove_file(&target).await;
    }

    #[tokio::test]
    async fn test_http_failure_leaves_no_file() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/media/gone.mp4")
            .with_status(404)
            .create_async()
            .await;

        let target = temp_target("save-404");
        let url = format!("{}/media/gone.mp4", server.url());
        let events: Vec<SaveEvent> = coordinator_for(&server)
            .save_stream(job(url, &target))
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            SaveEvent::Failed(AppError::BackendUnavailable(_))
        ));
        assert!(!target.exists());
        assert!(!PartFile::part_path_for(&target).exists());
    }

    #[tokio::test]
    async fn test_unwritable_target_fails_without_leftovers() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/media/clip.mp4")
            .with_status(200)
            .with_body("abc")
            .create_async()
            .await;

        let target = std::env::temp_dir()
            .join(format!("missing-dir-{}", std::process::id()))
            .join("video.mp4");
        let url = format!("{}/media/clip.mp4", server.url());
        let events: Vec<SaveEvent> = coordinator_for(&server)
            .save_stream(job(url, &target))
            .collect()
            .await;

        assert!(matches!(events.as_slice(), [SaveEvent::Failed(AppError::Io(_))]));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_abandoned_part_file_is_removed() {
        let target = temp_target("save-abandoned");
        let part_path = PartFile::part_path_for(&target);

        let mut part = PartFile::create(&target).await.unwrap();
        part.append(b"half a video").await.unwrap();
        assert!(part_path.exists());

        drop(part);
        assert!(!part_path.exists());
        assert!(!target.exists());
    }

    #[test]
    fn test_part_path_sits_next_to_target() {
        let target = Path::new("/videos/instagram-video.mp4");
        assert_eq!(
            PartFile::part_path_for(target),
            PathBuf::from("/videos/instagram-video.mp4.part")
        );
    }

    #[test]
    fn test_fraction_without_length_stays_zero() {
        assert_eq!(fraction(10, None), 0.0);
        assert_eq!(fraction(10, Some(0)), 0.0);
        assert_eq!(fraction(5, Some(10)), 0.5);
        assert_eq!(fraction(15, Some(10)), 1.0);
    }
}
