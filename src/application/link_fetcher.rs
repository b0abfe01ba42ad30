use futures::{stream::BoxStream, StreamExt};

use crate::{
    api::ApiClient,
    domain::{AppError, DownloadRequest, DownloadResult},
};

#[derive(Debug, Clone)]
pub enum FetchEvent {
    /// First attempt failed and the retry delay has elapsed; the retry starts now.
    Retrying,
    Resolved(Result<DownloadResult, AppError>),
}

/// Resolve a download link, tolerating one cold-start failure.
///
/// Yields at most one `Retrying` followed by exactly one `Resolved`.
pub fn fetch_with_retry(client: ApiClient, input_url: String) -> BoxStream<'static, FetchEvent> {
    futures::stream::unfold(
        FetchState::Attempt {
            client,
            request: DownloadRequest::first(input_url),
        },
        |state| async move {
            match state {
                FetchState::Attempt { client, request } => {
                    match client.fetch_link(&request).await {
                        Ok(result) => {
                            tracing::info!(is_retry = request.is_retry, "download link resolved");
                            Some((FetchEvent::Resolved(Ok(result)), FetchState::Finished))
                        }
                        Err(e) if !request.is_retry => {
                            let delay = client.config().retry_delay;
                            tracing::warn!(
                                error = %e,
                                delay_ms = delay.as_millis() as u64,
                                "first attempt failed, backend may be cold starting"
                            );
                            tokio::time::sleep(delay).await;

                            Some((
                                FetchEvent::Retrying,
                                FetchState::Attempt {
                                    request: request.retry(),
                                    client,
                                },
                            ))
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "retry failed");
                            Some((FetchEvent::Resolved(Err(e.into())), FetchState::Finished))
                        }
                    }
                }
                FetchState::Finished => None,
            }
        },
    )
    .boxed()
}

enum FetchState {
    Attempt {
        client: ApiClient,
        request: DownloadRequest,
    },
    Finished,
}
