use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

/// Today's date in the given zone
pub fn today_in(now: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    now.with_timezone(tz).date_naive()
}

/// Date rendered the way the locale writes short dates
pub fn localized_date(date: NaiveDate, locale: &str) -> String {
    if locale.starts_with("ko") {
        format!("{}. {}. {}.", date.year(), date.month(), date.day())
    } else {
        format!("{}/{}/{}", date.month(), date.day(), date.year())
    }
}

/// Label like "10/ 13/ MON"
pub fn today_label(date: NaiveDate) -> String {
    format!(
        "{}/ {}/ {}",
        date.month(),
        date.day(),
        date.format("%a").to_string().to_uppercase()
    )
}

/// Zero-based weekday counted from Sunday
pub fn weekday_from_sunday(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}
