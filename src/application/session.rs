//! Owned controller behind the form and result regions.
//!
//! The controller never touches the runtime. Every operation mutates state and
//! returns the [`Effect`]s the caller must carry out (start a fetch, schedule a
//! timer, write to the clipboard). Scheduled work comes back tagged with the
//! token it was issued under; anything issued before the latest transition is
//! ignored, so late timers and superseded fetches cannot touch the UI.

use std::time::Duration;

use crate::{
    domain::{AppError, DownloadResult, ProgressStep, SessionState},
    utils::is_valid_instagram_url,
};

pub const VALIDATION_DEBOUNCE: Duration = Duration::from_millis(280);
pub const PASTE_FLASH: Duration = Duration::from_millis(600);
pub const COMPLETION_HOLD: Duration = Duration::from_millis(350);
pub const COPY_ACKNOWLEDGEMENT: Duration = Duration::from_millis(2000);

pub const WAKING_UP_LABEL: &str = "Server waking up, please wait a few seconds…";
pub const READY_LABEL: &str = "Ready!";
pub const COPY_LABEL: &str = "Copy link";
pub const COPIED_LABEL: &str = "Copied!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    Keyframe(ProgressStep),
    Reveal,
    Validate,
    PasteFlashEnd,
    CopyReset,
}

impl Timer {
    /// Timers that belong to one loading cycle and die with it.
    pub fn is_session_scoped(self) -> bool {
        matches!(self, Timer::Keyframe(_) | Timer::Reveal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Abort every session-scoped timer still scheduled.
    CancelPending,
    Fetch {
        epoch: u64,
        url: String,
    },
    Schedule {
        token: u64,
        after: Duration,
        timer: Timer,
    },
    WriteClipboard(String),
}

#[derive(Debug)]
pub struct SessionController {
    state: SessionState,
    epoch: u64,

    input: String,
    input_valid: bool,
    validation_epoch: u64,
    paste_flash: bool,
    flash_epoch: u64,
    form_error: Option<&'static str>,

    progress: f32,
    step_label: &'static str,
    retrying: bool,
    pending_completion: Option<DownloadResult>,

    download_url: Option<String>,
    error_message: Option<&'static str>,

    copy_label: &'static str,
    copy_epoch: u64,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            epoch: 0,
            input: String::new(),
            input_valid: false,
            validation_epoch: 0,
            paste_flash: false,
            flash_epoch: 0,
            form_error: None,
            progress: 0.0,
            step_label: "",
            retrying: false,
            pending_completion: None,
            download_url: None,
            error_message: None,
            copy_label: COPY_LABEL,
            copy_epoch: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_valid(&self) -> bool {
        self.input_valid
    }

    pub fn has_value(&self) -> bool {
        !self.input.trim().is_empty()
    }

    pub fn paste_flash(&self) -> bool {
        self.paste_flash
    }

    pub fn form_error(&self) -> Option<&'static str> {
        self.form_error
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn step_label(&self) -> &'static str {
        self.step_label
    }

    pub fn download_url(&self) -> Option<&str> {
        self.download_url.as_deref()
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.error_message
    }

    pub fn copy_label(&self) -> &'static str {
        self.copy_label
    }

    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Loading
    }

    pub fn submit_enabled(&self) -> bool {
        self.input_valid && !self.is_loading()
    }

    pub fn input_changed(&mut self, text: String) -> Vec<Effect> {
        self.input = text;
        self.form_error = None;
        self.validation_epoch += 1;

        vec![Effect::Schedule {
            token: self.validation_epoch,
            after: VALIDATION_DEBOUNCE,
            timer: Timer::Validate,
        }]
    }

    pub fn pasted(&mut self, text: String) -> Vec<Effect> {
        self.input = text;
        self.form_error = None;
        // A pending debounce would only repeat what happens right now.
        self.validation_epoch += 1;
        self.refresh_validation();

        self.paste_flash = true;
        self.flash_epoch += 1;

        vec![Effect::Schedule {
            token: self.flash_epoch,
            after: PASTE_FLASH,
            timer: Timer::PasteFlashEnd,
        }]
    }

    fn refresh_validation(&mut self) {
        self.input_valid = is_valid_instagram_url(&self.input);
    }

    /// Start a new cycle. Invalid input never reaches the network.
    pub fn submit(&mut self) -> Vec<Effect> {
        if self.is_loading() {
            return Vec::new();
        }

        let mut effects = self.reset_to_idle();

        let url = self.input.trim().to_string();
        if !is_valid_instagram_url(&url) {
            tracing::info!("rejected submission with invalid url");
            self.form_error = Some(AppError::InvalidInput.user_message());
            self.input_valid = false;
            return effects;
        }

        self.input = url.clone();
        self.input_valid = true;
        self.state = SessionState::Loading;
        tracing::info!(epoch = self.epoch, "submitting download request");

        for step in ProgressStep::ALL {
            if step.offset_ms() == 0 {
                self.apply_keyframe(step);
            } else {
                effects.push(Effect::Schedule {
                    token: self.epoch,
                    after: Duration::from_millis(step.offset_ms()),
                    timer: Timer::Keyframe(step),
                });
            }
        }

        effects.push(Effect::Fetch {
            epoch: self.epoch,
            url,
        });
        effects
    }

    fn reset_to_idle(&mut self) -> Vec<Effect> {
        self.epoch += 1;
        self.state = SessionState::Idle;
        self.form_error = None;
        self.progress = 0.0;
        self.step_label = "";
        self.retrying = false;
        self.pending_completion = None;
        self.download_url = None;
        self.error_message = None;
        self.copy_label = COPY_LABEL;
        self.copy_epoch += 1;

        vec![Effect::CancelPending]
    }

    /// Keyframes only move forward and stop once data has arrived.
    fn apply_keyframe(&mut self, step: ProgressStep) {
        if self.state != SessionState::Loading || self.pending_completion.is_some() {
            return;
        }

        self.progress = self.progress.max(step.percent());
        if let Some(label) = step.label() {
            if !self.retrying {
                self.step_label = label;
            }
        }
    }

    pub fn retrying(&mut self, epoch: u64) {
        if epoch != self.epoch || !self.is_loading() || self.pending_completion.is_some() {
            return;
        }
        self.retrying = true;
        self.step_label = WAKING_UP_LABEL;
    }

    pub fn resolved(&mut self, epoch: u64, result: Result<DownloadResult, AppError>) -> Vec<Effect> {
        if epoch != self.epoch || !self.is_loading() {
            tracing::debug!(epoch, current = self.epoch, "dropping superseded fetch result");
            return Vec::new();
        }

        match result {
            Ok(result) => {
                self.progress = 100.0;
                self.step_label = READY_LABEL;
                self.pending_completion = Some(result);

                vec![
                    Effect::CancelPending,
                    Effect::Schedule {
                        token: self.epoch,
                        after: COMPLETION_HOLD,
                        timer: Timer::Reveal,
                    },
                ]
            }
            Err(err) => {
                tracing::warn!(error = %err, "download request failed");
                self.state = SessionState::Error;
                self.progress = 0.0;
                self.step_label = "";
                self.error_message = Some(err.user_message());

                vec![Effect::CancelPending]
            }
        }
    }

    fn reveal(&mut self) {
        if let Some(result) = self.pending_completion.take() {
            self.state = SessionState::Success;
            self.download_url = Some(result.download_url);
        }
    }

    pub fn copy_link(&self) -> Vec<Effect> {
        match self.download_url.as_deref() {
            Some(href) if !href.is_empty() && href != "#" => {
                vec![Effect::WriteClipboard(href.to_string())]
            }
            _ => Vec::new(),
        }
    }

    pub fn copied(&mut self) -> Vec<Effect> {
        self.copy_label = COPIED_LABEL;
        self.copy_epoch += 1;

        vec![Effect::Schedule {
            token: self.copy_epoch,
            after: COPY_ACKNOWLEDGEMENT,
            timer: Timer::CopyReset,
        }]
    }

    pub fn timer_fired(&mut self, timer: Timer, token: u64) {
        tracing::debug!(?timer, token, "timer fired");

        match timer {
            Timer::Keyframe(step) if token == self.epoch => self.apply_keyframe(step),
            Timer::Reveal if token == self.epoch => self.reveal(),
            Timer::Validate if token == self.validation_epoch => self.refresh_validation(),
            Timer::PasteFlashEnd if token == self.flash_epoch => self.paste_flash = false,
            Timer::CopyReset if token == self.copy_epoch => self.copy_label = COPY_LABEL,
            _ => {}
        }
    }
}
