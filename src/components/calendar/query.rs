use super::month::DisplayedMonth;
use crate::components::notion::connection::Connection;
use crate::components::notion::models::{
    CreatePage, DateCondition, DatabaseQuery, Page, PropertyFilter, QueryFilter, DATE_PROPERTY,
    MAX_PAGE_SIZE,
};
use crate::utils::time::localized_date;
use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Category used when a record has no tag
pub const DEFAULT_COLOR: &str = "gray";
/// Category given to records created from the widget
pub const NEW_ENTRY_COLOR: &str = "blue";

/// A record placed on the calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEntry {
    pub page_id: String,
    pub date: NaiveDate,
    /// `Date.date.start` exactly as returned
    pub start: String,
    pub color: String,
    pub day: u32,
}

/// Entries of one month keyed by day-of-month
pub type DayMap = BTreeMap<u32, CalendarEntry>;

/// Query covering every day of the month, inclusive
pub fn month_query(month: DisplayedMonth) -> DatabaseQuery {
    let (first, last) = month.date_range();
    DatabaseQuery {
        filter: QueryFilter {
            and: vec![
                PropertyFilter {
                    property: DATE_PROPERTY.to_string(),
                    date: DateCondition::OnOrAfter(first),
                },
                PropertyFilter {
                    property: DATE_PROPERTY.to_string(),
                    date: DateCondition::OnOrBefore(last),
                },
            ],
        },
        page_size: MAX_PAGE_SIZE,
    }
}

/// Resolve a Notion date string to a calendar date in `tz`.
///
/// Date-only values are taken as written; date-times are converted.
pub fn resolve_date(start: &str, tz: &Tz) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(start, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(start)
        .ok()
        .map(|dt| dt.with_timezone(tz).date_naive())
}

/// Reduce query results to the day map of `month`.
///
/// Records outside the month after time-zone resolution are dropped. When two
/// records land on the same day the later one wins.
pub fn reduce_entries(pages: &[Page], month: DisplayedMonth, tz: &Tz) -> DayMap {
    let mut map = DayMap::new();
    for page in pages {
        let Some(start) = page.date_start() else {
            continue;
        };
        let Some(date) = resolve_date(start, tz) else {
            debug!(page_id = %page.id, start, "Skipping record with unparseable date");
            continue;
        };
        if !month.contains(date) {
            debug!(page_id = %page.id, %date, "Skipping record outside {}", month);
            continue;
        }

        let day = date.day();
        map.insert(
            day,
            CalendarEntry {
                page_id: page.id.clone(),
                date,
                start: start.to_string(),
                color: page.color().unwrap_or(DEFAULT_COLOR).to_string(),
                day,
            },
        );
    }
    map
}

/// Log the rows a single-page query could not return; true when truncated
pub fn warn_if_truncated(has_more: bool, month: DisplayedMonth) -> bool {
    if has_more {
        warn!(
            "More than {} records in {}; only the first page is shown",
            MAX_PAGE_SIZE, month
        );
    }
    has_more
}

/// Body for the "today" record
pub fn new_entry_page(connection: &Connection, now: DateTime<Utc>, tz: &Tz, locale: &str) -> CreatePage {
    let today = now.with_timezone(tz).date_naive();
    let title = t!("entry.title", locale = locale, date = localized_date(today, locale));
    CreatePage::new(
        connection.database_id().as_str(),
        title,
        now.to_rfc3339_opts(SecondsFormat::Millis, true),
        NEW_ENTRY_COLOR,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::notion::connection::ConnectionSettings;
    use crate::components::notion::models::{
        DateProperty, DateValue, PageProperties, SelectOption, SelectProperty,
    };
    use chrono::TimeZone;
    use serde_json::json;

    fn page(id: &str, start: Option<&str>, color: Option<&str>) -> Page {
        Page {
            id: id.to_string(),
            properties: PageProperties {
                date: start.map(|s| DateProperty {
                    date: Some(DateValue {
                        start: s.to_string(),
                    }),
                }),
                color: color.map(|c| SelectProperty {
                    select: Some(SelectOption {
                        name: c.to_string(),
                    }),
                }),
            },
        }
    }

    #[test]
    fn test_leap_february_query() {
        let query = month_query(DisplayedMonth::new(2024, 1).unwrap());
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            json!({
                "filter": {
                    "and": [
                        { "property": "Date", "date": { "on_or_after": "2024-02-01" } },
                        { "property": "Date", "date": { "on_or_before": "2024-02-29" } }
                    ]
                },
                "page_size": 100
            })
        );
    }

    #[test]
    fn test_same_day_last_record_wins() {
        let month = DisplayedMonth::new(2024, 1).unwrap();
        let pages = vec![
            page("first", Some("2024-02-05"), Some("red")),
            page("second", Some("2024-02-05"), Some("green")),
        ];
        let map = reduce_entries(&pages, month, &Tz::UTC);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&5].page_id, "second");
        assert_eq!(map[&5].color, "green");
    }

    #[test]
    fn test_missing_color_defaults_to_gray() {
        let month = DisplayedMonth::new(2024, 1).unwrap();
        let map = reduce_entries(&[page("a", Some("2024-02-10"), None)], month, &Tz::UTC);
        assert_eq!(map[&10].color, DEFAULT_COLOR);
    }

    #[test]
    fn test_records_outside_month_are_dropped() {
        let month = DisplayedMonth::new(2024, 1).unwrap();
        let pages = vec![
            // Inside the window in UTC, but March 1st in Seoul
            page("shifted", Some("2024-02-29T20:00:00.000+00:00"), Some("red")),
            page("inside", Some("2024-02-28T20:00:00.000+00:00"), Some("blue")),
            page("january", Some("2024-01-31"), None),
            page("undated", None, None),
            page("garbage", Some("tomorrow"), None),
        ];
        let map = reduce_entries(&pages, month, &chrono_tz::Asia::Seoul);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&29].page_id, "inside");
    }

    #[test]
    fn test_resolve_date_forms() {
        let tz = chrono_tz::America::New_York;
        assert_eq!(
            resolve_date("2024-02-05", &tz),
            NaiveDate::from_ymd_opt(2024, 2, 5)
        );
        assert_eq!(
            resolve_date("2024-02-05T03:00:00Z", &tz),
            NaiveDate::from_ymd_opt(2024, 2, 4)
        );
        assert_eq!(resolve_date("05/02/2024", &tz), None);
    }

    #[test]
    fn test_new_entry_page() {
        let conn = ConnectionSettings::relayed("f6a9e1d80b5c4c7a9f0d1e2f3a4b5c6d")
            .validate()
            .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 2, 5, 23, 30, 0).unwrap();
        let body = new_entry_page(&conn, now, &chrono_tz::Asia::Seoul, "ko");
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value["parent"]["database_id"],
            "f6a9e1d8-0b5c-4c7a-9f0d-1e2f3a4b5c6d"
        );
        assert_eq!(value["properties"]["Date"]["date"]["start"], "2024-02-05T23:30:00.000Z");
        assert_eq!(value["properties"]["Color"]["select"]["name"], "blue");
        // Already the 6th in Seoul
        let title = value["properties"]["Name"]["title"][0]["text"]["content"]
            .as_str()
            .unwrap();
        assert!(title.contains("2024. 2. 6."));
    }

    #[test]
    fn test_warn_if_truncated() {
        let feb = DisplayedMonth::new(2024, 1).unwrap();
        assert!(warn_if_truncated(true, feb));
        assert!(!warn_if_truncated(false, feb));
    }
}
