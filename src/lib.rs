pub mod app;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod input;
pub mod logging;
pub mod messaging;
pub mod notification;
pub mod page;
pub mod popup;
pub mod settings;
pub mod storage;
pub mod theme;

#[cfg(test)]
mod testing;

pub use error::{AppError, AppResult};

/// Entrypoint used by the headless binary.
pub fn run<I>(args: I) -> AppResult<()>
where
    I: IntoIterator<Item = String>,
{
    logging::init();
    tracing::debug!("starting pdfshade");

    let request = app::Request::parse(args)?;
    let config = config::load_app_config();
    let outcome = app::execute(&request, &config)?;

    let rendered = serde_json::to_string_pretty(&outcome)?;
    println!("{rendered}");
    Ok(())
}
