use super::month::DisplayedMonth;
use super::query::{month_query, new_entry_page};
use super::state::{QueryTicket, WidgetSnapshot, WidgetState};
use crate::components::notion::client::NotionApi;
use crate::components::notion::connection::ConnectionSettings;
use crate::components::notion::models::{CreatedPage, QueryResponse};
use crate::config::Config;
use crate::error::{component_error, CalendarResult};
use crate::utils::time::today_in;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Settings the actor needs besides the connection
#[derive(Debug, Clone)]
pub struct WidgetOptions {
    pub timezone: Tz,
    pub locale: String,
    pub refresh_delay: Duration,
    /// Month shown at start; the current month when `None`
    pub initial_month: Option<DisplayedMonth>,
}

impl WidgetOptions {
    pub fn from_config(config: &Config) -> CalendarResult<Self> {
        Ok(Self {
            timezone: config.tz()?,
            locale: config.locale.clone(),
            refresh_delay: config.refresh_delay(),
            initial_month: None,
        })
    }
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            locale: String::from("en"),
            refresh_delay: Duration::from_millis(crate::config::DEFAULT_REFRESH_DELAY_MS),
            initial_month: None,
        }
    }
}

/// Result of an "add entry" request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The page was created; a refresh follows after the configured delay
    Created(String),
    /// The call failed; see the snapshot error
    Failed,
    /// Another creation is still running
    Busy,
    NotConfigured,
}

/// Commands that can be sent to the calendar actor
pub enum CalendarCommand {
    Configure(ConnectionSettings, mpsc::Sender<WidgetSnapshot>),
    Reconfigure(mpsc::Sender<WidgetSnapshot>),
    Refresh(Option<mpsc::Sender<WidgetSnapshot>>),
    NextMonth(mpsc::Sender<WidgetSnapshot>),
    PreviousMonth(mpsc::Sender<WidgetSnapshot>),
    AddEntry(mpsc::Sender<CreateOutcome>),
    Snapshot(mpsc::Sender<WidgetSnapshot>),
    QueryFinished {
        ticket: QueryTicket,
        result: CalendarResult<QueryResponse>,
        reply: Option<mpsc::Sender<WidgetSnapshot>>,
    },
    EntryCreated {
        result: CalendarResult<CreatedPage>,
        reply: mpsc::Sender<CreateOutcome>,
    },
    Shutdown,
}

/// The calendar actor. It owns the widget state; network calls run in
/// spawned tasks and report back through the mailbox.
pub struct CalendarActor {
    api: Arc<dyn NotionApi>,
    options: WidgetOptions,
    state: WidgetState,
    command_rx: mpsc::Receiver<CalendarCommand>,
    self_tx: mpsc::WeakSender<CalendarCommand>,
}

/// Handle for communicating with the calendar actor
#[derive(Clone)]
pub struct CalendarActorHandle {
    command_tx: mpsc::Sender<CalendarCommand>,
}

impl CalendarActorHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(mpsc::Sender<T>) -> CalendarCommand,
    ) -> CalendarResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(make(response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))
    }

    /// Validate settings and load the displayed month
    pub async fn configure(&self, settings: ConnectionSettings) -> CalendarResult<WidgetSnapshot> {
        self.request(|tx| CalendarCommand::Configure(settings, tx)).await
    }

    /// Forget the connection
    pub async fn reconfigure(&self) -> CalendarResult<WidgetSnapshot> {
        self.request(CalendarCommand::Reconfigure).await
    }

    /// Reload the displayed month
    pub async fn refresh(&self) -> CalendarResult<WidgetSnapshot> {
        self.request(|tx| CalendarCommand::Refresh(Some(tx))).await
    }

    pub async fn next_month(&self) -> CalendarResult<WidgetSnapshot> {
        self.request(CalendarCommand::NextMonth).await
    }

    pub async fn previous_month(&self) -> CalendarResult<WidgetSnapshot> {
        self.request(CalendarCommand::PreviousMonth).await
    }

    /// Create today's record
    pub async fn add_entry(&self) -> CalendarResult<CreateOutcome> {
        self.request(CalendarCommand::AddEntry).await
    }

    pub async fn snapshot(&self) -> CalendarResult<WidgetSnapshot> {
        self.request(CalendarCommand::Snapshot).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> CalendarResult<()> {
        let _ = self.command_tx.send(CalendarCommand::Shutdown).await;
        Ok(())
    }
}

impl CalendarActor {
    /// Create a new actor and return its handle
    pub fn new(api: Arc<dyn NotionApi>, options: WidgetOptions) -> (Self, CalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let today = today_in(Utc::now(), &options.timezone);
        let month = options
            .initial_month
            .unwrap_or_else(|| DisplayedMonth::containing(today));

        let actor = Self {
            api,
            options,
            state: WidgetState::new(month),
            command_rx,
            self_tx: command_tx.downgrade(),
        };

        (actor, CalendarActorHandle { command_tx })
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Calendar actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                CalendarCommand::Configure(settings, reply) => {
                    if self.state.configure(settings) {
                        self.start_query(Some(reply)).await;
                    } else {
                        self.reply(reply).await;
                    }
                }
                CalendarCommand::Reconfigure(reply) => {
                    self.state.reconfigure();
                    self.reply(reply).await;
                }
                CalendarCommand::Refresh(reply) => {
                    self.start_query(reply).await;
                }
                CalendarCommand::NextMonth(reply) => {
                    self.state.next_month();
                    self.start_query(Some(reply)).await;
                }
                CalendarCommand::PreviousMonth(reply) => {
                    self.state.previous_month();
                    self.start_query(Some(reply)).await;
                }
                CalendarCommand::AddEntry(reply) => {
                    self.start_create(reply).await;
                }
                CalendarCommand::Snapshot(reply) => {
                    self.reply(reply).await;
                }
                CalendarCommand::QueryFinished {
                    ticket,
                    result,
                    reply,
                } => {
                    let outcome = self
                        .state
                        .finish_query(&ticket, result, &self.options.timezone);
                    debug!("Query for {} finished: {:?}", ticket.month, outcome);
                    if self.state.take_pending_refresh() {
                        self.start_query(reply).await;
                    } else if let Some(reply) = reply {
                        self.reply(reply).await;
                    }
                }
                CalendarCommand::EntryCreated { result, reply } => {
                    let outcome = match self.state.finish_create(result) {
                        Some(page_id) => {
                            self.schedule_refresh();
                            CreateOutcome::Created(page_id)
                        }
                        None => CreateOutcome::Failed,
                    };
                    let _ = reply.send(outcome).await;
                }
                CalendarCommand::Shutdown => {
                    info!("Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Calendar actor shut down");
    }

    fn today(&self) -> NaiveDate {
        today_in(Utc::now(), &self.options.timezone)
    }

    async fn reply(&self, reply: mpsc::Sender<WidgetSnapshot>) {
        let _ = reply.send(self.state.snapshot(self.today())).await;
    }

    /// Issue a query unless one is running; the reply is sent once the data is in
    async fn start_query(&mut self, reply: Option<mpsc::Sender<WidgetSnapshot>>) {
        let Some(ticket) = self.state.begin_query() else {
            if let Some(reply) = reply {
                self.reply(reply).await;
            }
            return;
        };

        let api = Arc::clone(&self.api);
        let self_tx = self.self_tx.clone();
        tokio::spawn(async move {
            let query = month_query(ticket.month);
            let result = api.query_database(&ticket.connection, &query).await;
            if let Some(tx) = self_tx.upgrade() {
                let _ = tx
                    .send(CalendarCommand::QueryFinished {
                        ticket,
                        result,
                        reply,
                    })
                    .await;
            }
        });
    }

    async fn start_create(&mut self, reply: mpsc::Sender<CreateOutcome>) {
        if !self.state.is_configured() {
            let _ = reply.send(CreateOutcome::NotConfigured).await;
            return;
        }
        let Some(ticket) = self.state.begin_create() else {
            let _ = reply.send(CreateOutcome::Busy).await;
            return;
        };

        let page = new_entry_page(
            &ticket.connection,
            Utc::now(),
            &self.options.timezone,
            &self.options.locale,
        );
        let api = Arc::clone(&self.api);
        let self_tx = self.self_tx.clone();
        tokio::spawn(async move {
            let result = api.create_page(&ticket.connection, &page).await;
            if let Some(tx) = self_tx.upgrade() {
                let _ = tx.send(CalendarCommand::EntryCreated { result, reply }).await;
            }
        });
    }

    /// Re-query after the read-after-write delay
    fn schedule_refresh(&self) {
        let delay = self.options.refresh_delay;
        let self_tx = self.self_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = self_tx.upgrade() {
                let _ = tx.send(CalendarCommand::Refresh(None)).await;
            }
        });
    }
}
