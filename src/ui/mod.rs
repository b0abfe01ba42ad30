pub mod ads;
pub mod clipboard;
pub mod faq;

use iced::{
    widget::{button, column, container, progress_bar, row, scrollable, text, text_input, Space},
    Alignment, Element, Length, Theme,
};

use crate::{
    application::SessionController,
    domain::{error::MSG_GENERIC, SaveState, SessionState},
    utils::percent_label,
};
use ads::AdSlots;
use faq::Faq;

const URL_INPUT: &str = "url-input";

pub fn url_input_id() -> iced::widget::Id {
    iced::widget::Id::new(URL_INPUT)
}

/// View state that lives outside the session controller
#[derive(Default)]
pub struct DownloadView {
    pub faq: Faq,
    pub ads: AdSlots,
    pub save: SaveState,
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    UrlPasted(String),
    DownloadPressed,
    CopyPressed,
    SavePressed,
    FaqToggled(usize),
    AdShown(usize),
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::FaqToggled(index) => self.faq.toggle(index),
            DownloadMessage::AdShown(index) => {
                self.ads.mark_loaded(index);
            }
            _ => {
                // Will be handled by the app
            }
        }
    }

    pub fn view<'a>(&'a self, session: &'a SessionController) -> Element<'a, DownloadMessage> {
        let content = column![
            text("Instagram Video Downloader").size(32),
            text("Paste a link to a public post or reel.").size(14),
            Space::new().height(Length::Fixed(10.0)),
            self.form(session),
            self.result_region(session),
            Space::new().height(Length::Fixed(10.0)),
            self.ads.view(0).map(DownloadMessage::AdShown),
            self.faq.view().map(DownloadMessage::FaqToggled),
            self.ads.view(1).map(DownloadMessage::AdShown),
        ]
        .padding(20)
        .spacing(10);

        scrollable(content).height(Length::Fill).into()
    }

    fn form<'a>(&'a self, session: &'a SessionController) -> Element<'a, DownloadMessage> {
        let valid = session.input_valid() && session.has_value();
        let flash = session.paste_flash();

        let input = text_input("https://www.instagram.com/reel/...", session.input())
            .id(url_input_id())
            .on_input(DownloadMessage::UrlChanged)
            .on_paste(DownloadMessage::UrlPasted)
            .on_submit(DownloadMessage::DownloadPressed)
            .padding(10)
            .style(move |theme: &Theme, status| {
                let mut style = text_input::default(theme, status);
                let palette = theme.extended_palette();
                if flash {
                    style.border.color = palette.primary.strong.color;
                    style.border.width = 2.0;
                } else if valid {
                    style.border.color = palette.success.base.color;
                }
                style
            });

        let valid_icon = if valid {
            text("✓").size(20).style(text::success)
        } else {
            text("").size(20)
        };

        let submit = button("Download")
            .on_press_maybe(session.submit_enabled().then_some(DownloadMessage::DownloadPressed))
            .padding([10, 20]);

        let mut form = column![row![input, valid_icon, submit]
            .spacing(10)
            .align_y(Alignment::Center)]
        .spacing(6);

        if let Some(error) = session.form_error() {
            form = form.push(text(error).size(14).style(text::danger));
        }

        form.into()
    }

    /// Exactly one of the loading, success and error regions is rendered.
    fn result_region<'a>(&'a self, session: &'a SessionController) -> Element<'a, DownloadMessage> {
        match session.state() {
            SessionState::Idle => Space::new().height(Length::Fixed(0.0)).into(),
            SessionState::Loading => loading_view(session),
            SessionState::Success => self.success_view(session),
            SessionState::Error => error_view(session),
        }
    }

    fn success_view<'a>(&'a self, session: &'a SessionController) -> Element<'a, DownloadMessage> {
        let link = session.download_url().unwrap_or_default();

        let save_button = button("Save video")
            .on_press_maybe((!self.save.is_busy()).then_some(DownloadMessage::SavePressed))
            .padding([10, 20]);
        let copy_button = button(text(session.copy_label()))
            .on_press(DownloadMessage::CopyPressed)
            .padding([10, 20]);

        let mut region = column![
            text("Your video is ready").size(20).style(text::success),
            text(link).size(12),
            row![save_button, copy_button].spacing(10),
        ]
        .spacing(10);

        match &self.save {
            SaveState::Idle => {}
            SaveState::ChoosingPath => {
                region = region.push(text("Choose where to save the video...").size(14));
            }
            SaveState::Saving { progress } => {
                let percent = progress * 100.0;
                region = region
                    .push(progress_bar(0.0..=100.0, percent))
                    .push(text(format!("Saving: {}", percent_label(percent))).size(14));
            }
            SaveState::Saved(path) => {
                region = region.push(text(format!("Saved: {}", path.display())).size(14));
            }
            SaveState::Failed(message) => {
                region = region.push(text(*message).size(14).style(text::danger));
            }
        }

        container(region).padding(10).style(container::rounded_box).into()
    }
}

fn loading_view(session: &SessionController) -> Element<'_, DownloadMessage> {
    column![
        progress_bar(0.0..=100.0, session.progress()),
        text(session.step_label()).size(14),
    ]
    .spacing(8)
    .into()
}

fn error_view(session: &SessionController) -> Element<'_, DownloadMessage> {
    let message = session
        .error_message()
        .unwrap_or(MSG_GENERIC);

    container(
        column![
            text(message).size(16).style(text::danger),
            text("Check the link and press Download to try again.").size(13),
        ]
        .spacing(6),
    )
    .padding(10)
    .style(container::rounded_box)
    .into()
}
