use crate::api::{ApiClient, ApiConfig};
use crate::application::{
    DownloadCoordinator, Effect, FetchEvent, SaveEvent, SaveJob, SessionController, Timer,
};
use crate::domain::{error::MSG_SAVE_FAILED, SaveState, SessionState};
use crate::ui::clipboard::{copy_or_fallback, CopyOutcome, SystemClipboard};
use crate::ui::{url_input_id, DownloadMessage, DownloadView};
use futures::StreamExt;
use iced::widget::operation;
use iced::{task, Task};
use std::path::PathBuf;

pub struct App {
    view: DownloadView,
    session: SessionController,
    coordinator: DownloadCoordinator,
    // Keyframe and reveal timers of the current loading cycle
    session_tasks: Vec<task::Handle>,
    save_task: Option<task::Handle>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        let config = ApiConfig::from_env();
        tracing::info!(backend = %config.base_url, "starting downloader");

        Self {
            view: DownloadView::default(),
            session: SessionController::new(),
            coordinator: DownloadCoordinator::new(ApiClient::new(config)),
            session_tasks: Vec::new(),
            save_task: None,
        }
    }

    /// Startup state plus focusing the URL input
    pub fn boot() -> (Self, Task<Message>) {
        (Self::new(), operation::focus(url_input_id()))
    }

    /// Save work only belongs to the success region of the cycle it started in.
    fn owns_save(&self, epoch: u64) -> bool {
        epoch == self.session.epoch() && self.session.state() == SessionState::Success
    }

    /// Dropping the stream removes any partially written file.
    fn cancel_save(&mut self) {
        if let Some(handle) = self.save_task.take() {
            handle.abort();
        }
        self.view.save = SaveState::Idle;
    }

    /// Carry out what the session controller asked for
    fn run_effects(&mut self, effects: Vec<Effect>) -> Task<Message> {
        let mut tasks = Vec::with_capacity(effects.len());

        for effect in effects {
            match effect {
                Effect::CancelPending => {
                    for handle in self.session_tasks.drain(..) {
                        handle.abort();
                    }
                }
                Effect::Fetch { epoch, url } => {
                    // Never aborted; a superseded result is dropped by the controller.
                    tasks.push(Task::stream(
                        self.coordinator
                            .resolve_link(url)
                            .map(move |event| Message::Fetch { epoch, event }),
                    ));
                }
                Effect::Schedule {
                    token,
                    after,
                    timer,
                } => {
                    let sleep = Task::perform(tokio::time::sleep(after), move |_| {
                        Message::TimerFired(timer, token)
                    });

                    if timer.is_session_scoped() {
                        let (sleep, handle) = sleep.abortable();
                        self.session_tasks.push(handle);
                        tasks.push(sleep);
                    } else {
                        tasks.push(sleep);
                    }
                }
                Effect::WriteClipboard(href) => {
                    tasks.push(match copy_or_fallback(SystemClipboard::new(), &href) {
                        CopyOutcome::Copied => Task::done(Message::Copied),
                        CopyOutcome::Fallback(href) => {
                            iced::clipboard::write::<Message>(href).chain(Task::done(Message::Copied))
                        }
                    });
                }
            }
        }

        Task::batch(tasks)
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    TimerFired(Timer, u64),
    /// Event from the link request started in cycle `epoch`
    Fetch { epoch: u64, event: FetchEvent },
    Copied,
    /// Dialog result for the link shown in cycle `epoch`
    SavePathSelected {
        epoch: u64,
        url: String,
        path: Option<PathBuf>,
    },
    Save { epoch: u64, event: SaveEvent },
}

pub fn update(app: &mut App, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            let effects = match ui_msg {
                DownloadMessage::UrlChanged(text) => app.session.input_changed(text),
                DownloadMessage::UrlPasted(text) => app.session.pasted(text),
                DownloadMessage::DownloadPressed => {
                    if !app.session.is_loading() {
                        app.cancel_save();
                    }
                    app.session.submit()
                }
                DownloadMessage::CopyPressed => app.session.copy_link(),
                DownloadMessage::SavePressed => return start_save(app),
                DownloadMessage::FaqToggled(_) | DownloadMessage::AdShown(_) => Vec::new(),
            };

            return app.run_effects(effects);
        }
        Message::TimerFired(timer, token) => {
            app.session.timer_fired(timer, token);
        }
        Message::Fetch { epoch, event } => match event {
            FetchEvent::Retrying => app.session.retrying(epoch),
            FetchEvent::Resolved(result) => {
                let effects = app.session.resolved(epoch, result);
                return app.run_effects(effects);
            }
        },
        Message::Copied => {
            let effects = app.session.copied();
            return app.run_effects(effects);
        }
        Message::SavePathSelected { epoch, url, path } => {
            if !app.owns_save(epoch) {
                tracing::debug!(epoch, "dropping save dialog result for a replaced link");
                return Task::none();
            }

            match path {
                Some(target) => {
                    tracing::info!(path = %target.display(), "saving video");
                    app.view.save = SaveState::Saving { progress: 0.0 };

                    let job = SaveJob { epoch, url, target };
                    let (save, handle) = Task::stream(
                        app.coordinator
                            .save_stream(job)
                            .map(move |event| Message::Save { epoch, event }),
                    )
                    .abortable();
                    app.save_task = Some(handle);
                    return save;
                }
                None => {
                    // User cancelled dialog
                    app.view.save = SaveState::Idle;
                }
            }
        }
        Message::Save { epoch, event } => {
            if !app.owns_save(epoch) {
                return Task::none();
            }

            match event {
                SaveEvent::Progress(progress) => {
                    app.view.save = SaveState::Saving { progress };
                }
                SaveEvent::Completed(path) => {
                    tracing::info!(path = %path.display(), "video saved");
                    app.save_task = None;
                    app.view.save = SaveState::Saved(path);
                }
                SaveEvent::Failed(e) => {
                    tracing::warn!(error = %e, "saving video failed");
                    app.save_task = None;
                    app.view.save = SaveState::Failed(MSG_SAVE_FAILED);
                }
            }
        }
    }
    Task::none()
}

fn start_save(app: &mut App) -> Task<Message> {
    if app.view.save.is_busy() {
        return Task::none();
    }
    let Some(url) = app.session.download_url().map(str::to_string) else {
        return Task::none();
    };

    // The link is pinned now; the dialog may return after the user moved on.
    let epoch = app.session.epoch();
    app.view.save = SaveState::ChoosingPath;
    let coordinator = app.coordinator.clone();

    Task::perform(
        async move { coordinator.choose_save_path().await },
        move |path| Message::SavePathSelected { epoch, url, path },
    )
}

pub fn view(app: &App) -> iced::Element<'_, Message> {
    app.view.view(&app.session).map(Message::UiMessage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppError, DownloadResult};

    const REEL: &str = "https://www.instagram.com/reel/Cabc123/";
    const OTHER_REEL: &str = "https://www.instagram.com/reel/Dxyz789/";

    /// Drive the controller straight to the success region, returning its cycle.
    fn show_result(app: &mut App, input: &str, video: &str) -> u64 {
        app.session.input_changed(input.to_string());
        app.session.submit();
        let epoch = app.session.epoch();
        app.session.resolved(
            epoch,
            Ok(DownloadResult {
                download_url: video.to_string(),
            }),
        );
        app.session.timer_fired(Timer::Reveal, epoch);
        assert_eq!(app.session.state(), SessionState::Success);
        epoch
    }

    #[test]
    fn test_boot_starts_idle_with_focus_task() {
        let (app, _focus) = App::boot();
        assert_eq!(app.session.state(), SessionState::Idle);
        assert_eq!(app.view.save, SaveState::Idle);
    }

    #[tokio::test]
    async fn test_save_events_for_current_link_update_view() {
        let mut app = App::new();
        let epoch = show_result(&mut app, REEL, "https://cdn.example/a.mp4");

        let _ = update(
            &mut app,
            Message::Save {
                epoch,
                event: SaveEvent::Progress(0.5),
            },
        );
        assert_eq!(app.view.save, SaveState::Saving { progress: 0.5 });

        let _ = update(
            &mut app,
            Message::Save {
                epoch,
                event: SaveEvent::Failed(AppError::Io("disk full".into())),
            },
        );
        assert_eq!(app.view.save, SaveState::Failed(MSG_SAVE_FAILED));
    }

    #[tokio::test]
    async fn test_resubmit_detaches_previous_save() {
        let mut app = App::new();
        let first = show_result(&mut app, REEL, "https://cdn.example/a.mp4");
        app.view.save = SaveState::Saving { progress: 0.4 };

        app.session.input_changed(OTHER_REEL.to_string());
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));
        assert_eq!(app.view.save, SaveState::Idle);
        assert!(app.save_task.is_none());

        let second = app.session.epoch();
        assert_ne!(first, second);
        app.session.resolved(
            second,
            Ok(DownloadResult {
                download_url: "https://cdn.example/b.mp4".to_string(),
            }),
        );
        app.session.timer_fired(Timer::Reveal, second);

        // late events from the first link's save stay out of the new result
        let _ = update(
            &mut app,
            Message::Save {
                epoch: first,
                event: SaveEvent::Completed(PathBuf::from("/tmp/a.mp4")),
            },
        );
        assert_eq!(app.view.save, SaveState::Idle);

        let _ = update(
            &mut app,
            Message::SavePathSelected {
                epoch: first,
                url: "https://cdn.example/a.mp4".to_string(),
                path: Some(PathBuf::from("/tmp/a.mp4")),
            },
        );
        assert_eq!(app.view.save, SaveState::Idle);
        assert!(app.save_task.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_dialog_returns_to_idle() {
        let mut app = App::new();
        let epoch = show_result(&mut app, REEL, "https://cdn.example/a.mp4");
        app.view.save = SaveState::ChoosingPath;

        let _ = update(
            &mut app,
            Message::SavePathSelected {
                epoch,
                url: "https://cdn.example/a.mp4".to_string(),
                path: None,
            },
        );
        assert_eq!(app.view.save, SaveState::Idle);
    }
}
