use super::actor::{CalendarActor, CalendarActorHandle, CreateOutcome, WidgetOptions};
use super::state::WidgetSnapshot;
use crate::components::notion::client::NotionApi;
use crate::components::notion::connection::ConnectionSettings;
use crate::error::CalendarResult;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the calendar actor
#[derive(Clone)]
pub struct CalendarHandle {
    actor_handle: CalendarActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl CalendarHandle {
    /// Create a new CalendarHandle and spawn the actor
    pub fn new(api: Arc<dyn NotionApi>, options: WidgetOptions) -> Self {
        // Create the actor and get its handle
        let (mut actor, handle) = CalendarActor::new(api, options);

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    pub async fn configure(&self, settings: ConnectionSettings) -> CalendarResult<WidgetSnapshot> {
        self.actor_handle.configure(settings).await
    }

    pub async fn reconfigure(&self) -> CalendarResult<WidgetSnapshot> {
        self.actor_handle.reconfigure().await
    }

    pub async fn refresh(&self) -> CalendarResult<WidgetSnapshot> {
        self.actor_handle.refresh().await
    }

    pub async fn next_month(&self) -> CalendarResult<WidgetSnapshot> {
        self.actor_handle.next_month().await
    }

    pub async fn previous_month(&self) -> CalendarResult<WidgetSnapshot> {
        self.actor_handle.previous_month().await
    }

    pub async fn add_entry(&self) -> CalendarResult<CreateOutcome> {
        self.actor_handle.add_entry().await
    }

    pub async fn snapshot(&self) -> CalendarResult<WidgetSnapshot> {
        self.actor_handle.snapshot().await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> CalendarResult<()> {
        self.actor_handle.shutdown().await
    }
}
