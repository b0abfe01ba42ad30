use std::path::PathBuf;

/// The four mutually exclusive regions of the result area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub input_url: String,
    /// Only changes the loading copy, never the request itself.
    pub is_retry: bool,
}

impl DownloadRequest {
    pub fn first(input_url: impl Into<String>) -> Self {
        Self {
            input_url: input_url.into(),
            is_retry: false,
        }
    }

    pub fn retry(&self) -> Self {
        Self {
            input_url: self.input_url.clone(),
            is_retry: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub download_url: String,
}

/// Cosmetic loading keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStep {
    Analyzing,
    Fetching,
    Preparing,
    Finishing,
}

impl ProgressStep {
    pub const ALL: [ProgressStep; 4] = [
        ProgressStep::Analyzing,
        ProgressStep::Fetching,
        ProgressStep::Preparing,
        ProgressStep::Finishing,
    ];

    pub fn offset_ms(self) -> u64 {
        match self {
            ProgressStep::Analyzing => 0,
            ProgressStep::Fetching => 400,
            ProgressStep::Preparing => 900,
            ProgressStep::Finishing => 1400,
        }
    }

    pub fn percent(self) -> f32 {
        match self {
            ProgressStep::Analyzing => 0.0,
            ProgressStep::Fetching => 30.0,
            ProgressStep::Preparing => 60.0,
            ProgressStep::Finishing => 85.0,
        }
    }

    /// `None` keeps whatever label is currently shown.
    pub fn label(self) -> Option<&'static str> {
        match self {
            ProgressStep::Analyzing => Some("Analyzing link..."),
            ProgressStep::Fetching => Some("Fetching video..."),
            ProgressStep::Preparing => Some("Preparing download..."),
            ProgressStep::Finishing => None,
        }
    }
}

/// Progress of the optional save-to-disk step after a link resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SaveState {
    #[default]
    Idle,
    ChoosingPath,
    Saving {
        progress: f32,
    },
    Saved(PathBuf),
    Failed(&'static str),
}

impl SaveState {
    pub fn is_busy(&self) -> bool {
        matches!(self, SaveState::ChoosingPath | SaveState::Saving { .. })
    }
}
