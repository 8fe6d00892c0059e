use async_trait::async_trait;
use chrono_tz::Tz;
use notion_calendar::components::calendar::query::month_query;
use notion_calendar::components::calendar::{
    CalendarHandle, CreateOutcome, DisplayedMonth, WidgetOptions,
};
use notion_calendar::components::notion::models::{
    CreatePage, CreatedPage, DatabaseQuery, DateProperty, DateValue, Page, PageProperties,
    QueryResponse, SelectOption, SelectProperty,
};
use notion_calendar::components::notion::{Connection, ConnectionSettings, NotionApi};
use notion_calendar::error::{CalendarResult, Error};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

const DB: &str = "f6a9e1d80b5c4c7a9f0d1e2f3a4b5c6d";
const DB_HYPHENATED: &str = "f6a9e1d8-0b5c-4c7a-9f0d-1e2f3a4b5c6d";

/// In-memory Notion that records every call.
///
/// A gate, when set, holds the first matching call until it is released.
#[derive(Default)]
struct MockNotionApi {
    pages: Vec<Page>,
    fail_create: bool,
    queries: Mutex<Vec<DatabaseQuery>>,
    created: Mutex<Vec<CreatePage>>,
    query_gate: Mutex<Option<oneshot::Receiver<()>>>,
    create_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl MockNotionApi {
    fn with_pages(pages: Vec<Page>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    fn queries(&self) -> Vec<DatabaseQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn created(&self) -> Vec<CreatePage> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotionApi for MockNotionApi {
    async fn query_database(
        &self,
        connection: &Connection,
        query: &DatabaseQuery,
    ) -> CalendarResult<QueryResponse> {
        assert_eq!(connection.database_id().as_str(), DB_HYPHENATED);
        self.queries.lock().unwrap().push(query.clone());

        let gate = self.query_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        Ok(QueryResponse {
            results: self.pages.clone(),
            ..Default::default()
        })
    }

    async fn create_page(
        &self,
        _connection: &Connection,
        page: &CreatePage,
    ) -> CalendarResult<CreatedPage> {
        self.created.lock().unwrap().push(page.clone());

        let gate = self.create_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if self.fail_create {
            return Err(Error::Transport {
                message: "connection refused".to_string(),
                via_relay: false,
            });
        }
        Ok(CreatedPage {
            id: "new-page".to_string(),
        })
    }
}

fn page(id: &str, start: &str, color: Option<&str>) -> Page {
    Page {
        id: id.to_string(),
        properties: PageProperties {
            date: Some(DateProperty {
                date: Some(DateValue {
                    start: start.to_string(),
                }),
            }),
            color: color.map(|name| SelectProperty {
                select: Some(SelectOption {
                    name: name.to_string(),
                }),
            }),
        },
    }
}

fn february() -> DisplayedMonth {
    DisplayedMonth::new(2024, 1).unwrap()
}

fn options() -> WidgetOptions {
    WidgetOptions {
        timezone: Tz::UTC,
        locale: "en".to_string(),
        refresh_delay: Duration::from_millis(10),
        initial_month: Some(february()),
    }
}

fn settings() -> ConnectionSettings {
    ConnectionSettings::direct("secret_test", DB)
}

/// Poll until `check` holds or about two seconds have passed
async fn wait_for(check: impl Fn() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_invalid_database_id_makes_no_call() {
    let api = Arc::new(MockNotionApi::default());
    let handle = CalendarHandle::new(api.clone(), options());

    let snapshot = handle
        .configure(ConnectionSettings::direct("secret_test", "abc"))
        .await
        .unwrap();

    assert!(snapshot.error.is_some());
    assert!(snapshot.database_id.is_none());
    assert!(api.queries().is_empty());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_configure_loads_displayed_month() {
    let api = Arc::new(MockNotionApi::with_pages(vec![
        page("first", "2024-02-05", Some("green")),
        page("second", "2024-02-05T09:30:00.000Z", Some("red")),
        page("undated-color", "2024-02-20", None),
        page("march", "2024-03-01", Some("blue")),
    ]));
    let handle = CalendarHandle::new(api.clone(), options());

    let snapshot = handle.configure(settings()).await.unwrap();

    assert_eq!(api.queries(), vec![month_query(february())]);
    assert_eq!(snapshot.database_id.as_deref(), Some(DB_HYPHENATED));
    assert!(!snapshot.loading);
    assert_eq!(snapshot.entries.keys().copied().collect::<Vec<_>>(), vec![5, 20]);

    // Later records win a day
    let fifth = &snapshot.entries[&5];
    assert_eq!(fifth.page_id, "second");
    assert_eq!(fifth.color, "red");
    assert_eq!(snapshot.entries[&20].color, "gray");

    let cell = snapshot.grid.day(5).unwrap();
    assert_eq!(cell.link().as_deref(), Some("https://www.notion.so/second"));
}

#[tokio::test]
async fn test_navigation_queries_new_month() {
    let api = Arc::new(MockNotionApi::with_pages(vec![page(
        "feb",
        "2024-02-10",
        None,
    )]));
    let handle = CalendarHandle::new(api.clone(), options());
    handle.configure(settings()).await.unwrap();

    let january = handle.previous_month().await.unwrap();
    assert_eq!(january.month, DisplayedMonth::new(2024, 0).unwrap());
    assert!(january.entries.is_empty());

    let back = handle.next_month().await.unwrap();
    assert_eq!(back.month, february());
    assert!(back.entries.contains_key(&10));

    let queries = api.queries();
    assert_eq!(queries.len(), 3);
    assert_eq!(queries[1], month_query(DisplayedMonth::new(2024, 0).unwrap()));
    assert_eq!(queries[2], month_query(february()));
}

#[tokio::test]
async fn test_stale_response_is_discarded() {
    let (release, gate) = oneshot::channel();
    let api = Arc::new(MockNotionApi {
        pages: vec![
            page("feb", "2024-02-10", None),
            page("mar", "2024-03-03", None),
        ],
        query_gate: Mutex::new(Some(gate)),
        ..Default::default()
    });
    let handle = CalendarHandle::new(api.clone(), options());

    let configuring = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.configure(settings()).await })
    };
    wait_for(|| api.queries().len() == 1).await;

    // Moving on while February is still loading
    let moved = handle.next_month().await.unwrap();
    let march = february().next();
    assert_eq!(moved.month, march);
    assert!(moved.loading);
    assert!(moved.entries.is_empty());

    release.send(()).unwrap();
    let settled = configuring.await.unwrap().unwrap();

    assert_eq!(settled.month, march);
    assert!(!settled.loading);
    assert_eq!(settled.entries.keys().copied().collect::<Vec<_>>(), vec![3]);
    assert_eq!(api.queries()[1], month_query(march));
}

#[tokio::test]
async fn test_created_entry_triggers_refresh() {
    let api = Arc::new(MockNotionApi::default());
    let handle = CalendarHandle::new(api.clone(), options());
    handle.configure(settings()).await.unwrap();

    let outcome = handle.add_entry().await.unwrap();
    assert_eq!(outcome, CreateOutcome::Created("new-page".to_string()));

    let created = api.created();
    assert_eq!(created.len(), 1);
    let body = serde_json::to_value(&created[0]).unwrap();
    assert_eq!(body["parent"]["database_id"], json!(DB_HYPHENATED));
    assert_eq!(body["properties"]["Color"]["select"]["name"], json!("blue"));
    let title = body["properties"]["Name"]["title"][0]["text"]["content"]
        .as_str()
        .unwrap();
    assert!(title.starts_with("Today's entry ("));

    wait_for(|| api.queries().len() == 2).await;
}

#[tokio::test]
async fn test_failed_creation_keeps_grid() {
    let api = Arc::new(MockNotionApi {
        pages: vec![page("feb", "2024-02-10", None)],
        fail_create: true,
        ..Default::default()
    });
    let handle = CalendarHandle::new(api.clone(), options());
    let before = handle.configure(settings()).await.unwrap();

    let outcome = handle.add_entry().await.unwrap();
    assert_eq!(outcome, CreateOutcome::Failed);

    let after = handle.snapshot().await.unwrap();
    assert_eq!(after.entries, before.entries);
    assert_eq!(after.grid, before.grid);
    assert!(after.error.unwrap().contains("connection refused"));

    // No refresh follows a failure
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(api.queries().len(), 1);
}

#[tokio::test]
async fn test_second_creation_is_busy() {
    let (release, gate) = oneshot::channel();
    let api = Arc::new(MockNotionApi {
        create_gate: Mutex::new(Some(gate)),
        ..Default::default()
    });
    let handle = CalendarHandle::new(api.clone(), options());
    handle.configure(settings()).await.unwrap();

    let first = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.add_entry().await })
    };
    wait_for(|| api.created().len() == 1).await;

    assert!(handle.snapshot().await.unwrap().creating);
    assert_eq!(handle.add_entry().await.unwrap(), CreateOutcome::Busy);

    release.send(()).unwrap();
    assert_eq!(
        first.await.unwrap().unwrap(),
        CreateOutcome::Created("new-page".to_string())
    );
    assert_eq!(api.created().len(), 1);
}

#[tokio::test]
async fn test_add_entry_requires_connection() {
    let api = Arc::new(MockNotionApi::default());
    let handle = CalendarHandle::new(api.clone(), options());

    assert_eq!(
        handle.add_entry().await.unwrap(),
        CreateOutcome::NotConfigured
    );
    assert!(api.created().is_empty());
}

#[tokio::test]
async fn test_reconfigure_forgets_connection() {
    let api = Arc::new(MockNotionApi::with_pages(vec![page(
        "feb",
        "2024-02-10",
        None,
    )]));
    let handle = CalendarHandle::new(api.clone(), options());
    let configured = handle.configure(settings()).await.unwrap();
    assert!(!configured.settings_requested);

    let snapshot = handle.reconfigure().await.unwrap();
    assert!(snapshot.settings_requested);
    assert!(snapshot.database_id.is_none());
    assert!(snapshot.entries.is_empty());

    // Refresh without a connection does nothing
    handle.refresh().await.unwrap();
    assert_eq!(api.queries().len(), 1);
}
