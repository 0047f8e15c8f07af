//! Refresh command handler.

use log::debug;

use crate::{app::App, commands::text_response::format_refresh};

/// Requests a refresh of the selected platform. The refreshed alerts are printed
/// when the sync event arrives.
pub async fn handle_refresh(app: &App) -> String {
    debug!("handling refresh command");

    format_refresh(app.refresh_current().await)
}
