//! Alerts command handler.
//!
//! Lists the alert snapshot as currently cached in the store. It does not hit the
//! API; use the refresh command for that.

use log::debug;

use crate::{app::App, commands::text_response::format_alerts};

pub async fn handle_alerts(app: &App) -> String {
    debug!("handling alerts command");

    format_alerts(&app.list_alerts().await)
}
