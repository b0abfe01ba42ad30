mod api;
mod app;
mod application;
mod domain;
mod ui;
mod utils;

use iced::{window, Size};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> iced::Result {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "insta_reel_downloader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let icon_data = include_bytes!("../assets/icon.png");

    let icon = match image::load_from_memory(icon_data) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            window::icon::from_rgba(rgba.into_raw(), width, height).ok()
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not decode window icon");
            None
        }
    };

    iced::application(app::App::boot, app::update, app::view)
        .title("Instagram Video Downloader")
        .window(window::Settings {
            size: Size::new(640.0, 760.0),
            icon,
            ..Default::default()
        })
        .run()
}
