//! Platform command handler.
//!
//! Stores the selected platform and triggers a refresh of its alerts. A failed
//! write is reported to the user and leaves the previous platform in place.

use log::debug;

use crate::{
    app::App,
    commands::text_response::{format_platform_set, format_storage_error},
    store::Platform,
};

pub async fn handle_platform(app: &App, platform: Platform) -> String {
    debug!("handling platform command - platform: {}", platform);

    match app.set_platform(platform).await {
        Ok(_) => format_platform_set(platform),
        Err(e) => format_storage_error(&e),
    }
}
