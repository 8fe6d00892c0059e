//! Request and response bodies for the Notion endpoints the widget uses.
//!
//! Only the fields the calendar reads are modelled; unknown fields in
//! responses are ignored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Property holding the record date
pub const DATE_PROPERTY: &str = "Date";
/// Property holding the category tag
pub const COLOR_PROPERTY: &str = "Color";
/// Largest page the query endpoint returns
pub const MAX_PAGE_SIZE: u32 = 100;

/// Body of `POST databases/{id}/query`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseQuery {
    pub filter: QueryFilter,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFilter {
    pub and: Vec<PropertyFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyFilter {
    pub property: String,
    pub date: DateCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateCondition {
    OnOrAfter(NaiveDate),
    OnOrBefore(NaiveDate),
}

/// Response of the query endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// One database row
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: PageProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageProperties {
    #[serde(rename = "Date", default)]
    pub date: Option<DateProperty>,
    #[serde(rename = "Color", default)]
    pub color: Option<SelectProperty>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateProperty {
    #[serde(default)]
    pub date: Option<DateValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectProperty {
    #[serde(default)]
    pub select: Option<SelectOption>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

impl Page {
    /// Raw `Date.date.start`
    pub fn date_start(&self) -> Option<&str> {
        self.properties
            .date
            .as_ref()
            .and_then(|d| d.date.as_ref())
            .map(|d| d.start.as_str())
    }

    /// Raw `Color.select.name`
    pub fn color(&self) -> Option<&str> {
        self.properties
            .color
            .as_ref()
            .and_then(|c| c.select.as_ref())
            .map(|s| s.name.as_str())
    }
}

/// Body of `POST pages`
#[derive(Debug, Clone, Serialize)]
pub struct CreatePage {
    pub parent: Parent,
    pub properties: NewPageProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct Parent {
    pub database_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPageProperties {
    #[serde(rename = "Name")]
    pub name: TitleProperty,
    #[serde(rename = "Date")]
    pub date: DateProperty,
    #[serde(rename = "Color")]
    pub color: SelectProperty,
}

#[derive(Debug, Clone, Serialize)]
pub struct TitleProperty {
    pub title: Vec<RichText>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RichText {
    pub text: TextContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextContent {
    pub content: String,
}

impl CreatePage {
    pub fn new(
        database_id: impl Into<String>,
        title: impl Into<String>,
        start: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            parent: Parent {
                database_id: database_id.into(),
            },
            properties: NewPageProperties {
                name: TitleProperty {
                    title: vec![RichText {
                        text: TextContent {
                            content: title.into(),
                        },
                    }],
                },
                date: DateProperty {
                    date: Some(DateValue {
                        start: start.into(),
                    }),
                },
                color: SelectProperty {
                    select: Some(SelectOption { name: color.into() }),
                },
            },
        }
    }
}

/// Response of `POST pages`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPage {
    pub id: String,
}

/// Error body returned by Notion on non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Set by the relay when forwarding itself failed
    #[serde(default)]
    pub error: Option<String>,
}
