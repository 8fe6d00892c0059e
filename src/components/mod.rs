pub mod calendar;
pub mod notion;

pub use calendar::CalendarHandle;
pub use notion::{NotionApi, NotionClient};
