use notion_calendar::components::calendar::{CalendarHandle, WidgetOptions};
use notion_calendar::components::notion::NotionClient;
use notion_calendar::{console, startup};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting Notion calendar");

    // Load configuration
    let config = startup::load_config()?;

    let client = NotionClient::from_config(&config)?;
    let options = WidgetOptions::from_config(&config)?;
    let handle = CalendarHandle::new(Arc::new(client), options);

    console::run(handle, &config).await?;
    Ok(())
}
