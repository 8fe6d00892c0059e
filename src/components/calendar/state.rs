use super::grid::CalendarGrid;
use super::month::DisplayedMonth;
use super::query::{reduce_entries, warn_if_truncated, DayMap};
use crate::components::notion::connection::{Connection, ConnectionSettings};
use crate::components::notion::models::{CreatedPage, QueryResponse};
use crate::error::{CalendarResult, Error};
use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{debug, info};

/// A query that has been started; the response is matched back against it
#[derive(Debug, Clone)]
pub struct QueryTicket {
    pub month: DisplayedMonth,
    pub connection: Connection,
}

/// A creation that has been started
#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub connection: Connection,
}

/// What happened to a query response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The day map was replaced
    Applied,
    /// The call failed; the day map was cleared
    Failed,
    /// The response belonged to a month or connection no longer shown
    Discarded,
}

/// Everything the widget holds for one session.
///
/// At most one query and one creation are in flight at any time. The error is
/// a single value; starting a new operation clears it.
#[derive(Debug)]
pub struct WidgetState {
    connection: Option<Connection>,
    month: DisplayedMonth,
    entries: DayMap,
    error: Option<Error>,
    settings_requested: bool,
    query_in_flight: Option<DisplayedMonth>,
    refresh_pending: bool,
    create_in_flight: bool,
}

impl WidgetState {
    pub fn new(month: DisplayedMonth) -> Self {
        Self {
            connection: None,
            month,
            entries: DayMap::new(),
            error: None,
            settings_requested: true,
            query_in_flight: None,
            refresh_pending: false,
            create_in_flight: false,
        }
    }

    /// Validate and adopt new connection settings
    pub fn configure(&mut self, settings: ConnectionSettings) -> bool {
        self.error = None;
        match settings.validate() {
            Ok(connection) => {
                info!(
                    database_id = %connection.database_id(),
                    relay = connection.use_relay(),
                    "Connection configured"
                );
                self.connection = Some(connection);
                self.entries.clear();
                self.settings_requested = false;
                true
            }
            Err(e) => {
                debug!("Rejected connection settings: {}", e);
                self.error = Some(e);
                false
            }
        }
    }

    /// Drop the connection and go back to the settings form
    pub fn reconfigure(&mut self) {
        self.connection = None;
        self.entries.clear();
        self.error = None;
        self.refresh_pending = false;
        self.settings_requested = true;
    }

    pub fn next_month(&mut self) {
        self.month = self.month.next();
        self.entries.clear();
    }

    pub fn previous_month(&mut self) {
        self.month = self.month.previous();
        self.entries.clear();
    }

    /// Start a query for the displayed month.
    ///
    /// Returns `None` when unconfigured or when a query is already running; in
    /// the latter case a refresh is remembered for when it completes.
    pub fn begin_query(&mut self) -> Option<QueryTicket> {
        let connection = self.connection.clone()?;
        if self.query_in_flight.is_some() {
            self.refresh_pending = true;
            return None;
        }
        self.error = None;
        self.refresh_pending = false;
        self.query_in_flight = Some(self.month);
        Some(QueryTicket {
            month: self.month,
            connection,
        })
    }

    /// Apply a query response
    pub fn finish_query(
        &mut self,
        ticket: &QueryTicket,
        result: CalendarResult<QueryResponse>,
        tz: &Tz,
    ) -> QueryOutcome {
        self.query_in_flight = None;

        if ticket.month != self.month || self.connection.as_ref() != Some(&ticket.connection) {
            debug!("Discarding response for {}, showing {}", ticket.month, self.month);
            if self.connection.is_some() {
                self.refresh_pending = true;
            }
            return QueryOutcome::Discarded;
        }

        match result {
            Ok(response) => {
                warn_if_truncated(response.has_more, ticket.month);
                self.entries = reduce_entries(&response.results, ticket.month, tz);
                debug!("Loaded {} entries for {}", self.entries.len(), ticket.month);
                QueryOutcome::Applied
            }
            Err(e) => {
                self.entries.clear();
                self.settings_requested |= e.requests_reconfigure();
                self.error = Some(e);
                QueryOutcome::Failed
            }
        }
    }

    /// Whether a refresh was requested while a query was running
    pub fn take_pending_refresh(&mut self) -> bool {
        std::mem::take(&mut self.refresh_pending)
    }

    /// Start a creation; `None` when unconfigured or one is already running
    pub fn begin_create(&mut self) -> Option<CreateTicket> {
        let connection = self.connection.clone()?;
        if self.create_in_flight {
            return None;
        }
        self.error = None;
        self.create_in_flight = true;
        Some(CreateTicket { connection })
    }

    /// Record the result of a creation. The day map is never touched here;
    /// the follow-up query is the only writer.
    pub fn finish_create(&mut self, result: CalendarResult<CreatedPage>) -> Option<String> {
        self.create_in_flight = false;
        match result {
            Ok(page) => {
                info!(page_id = %page.id, "Entry created");
                Some(page.id)
            }
            Err(e) => {
                self.settings_requested |= e.requests_reconfigure();
                self.error = Some(e);
                None
            }
        }
    }

    pub fn month(&self) -> DisplayedMonth {
        self.month
    }

    pub fn entries(&self) -> &DayMap {
        &self.entries
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.connection.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.query_in_flight.is_some()
    }

    pub fn snapshot(&self, today: NaiveDate) -> WidgetSnapshot {
        WidgetSnapshot {
            month: self.month,
            today,
            grid: CalendarGrid::layout(self.month, &self.entries, today),
            entries: self.entries.clone(),
            error: self.error.as_ref().map(Error::user_message),
            settings_requested: self.settings_requested,
            loading: self.is_loading(),
            creating: self.create_in_flight,
            database_id: self
                .connection
                .as_ref()
                .map(|c| c.database_id().to_string()),
            use_relay: self.connection.as_ref().is_some_and(Connection::use_relay),
        }
    }
}

/// Read-only view of the widget for rendering
#[derive(Debug, Clone)]
pub struct WidgetSnapshot {
    pub month: DisplayedMonth,
    pub today: NaiveDate,
    pub grid: CalendarGrid,
    pub entries: DayMap,
    /// Localized current error
    pub error: Option<String>,
    pub settings_requested: bool,
    pub loading: bool,
    pub creating: bool,
    pub database_id: Option<String>,
    pub use_relay: bool,
}
