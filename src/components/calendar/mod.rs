mod actor;
mod handle;
pub mod grid;
pub mod month;
pub mod query;
pub mod state;

pub use actor::{CreateOutcome, WidgetOptions};
pub use grid::{CalendarGrid, Cell, DayCell};
pub use handle::CalendarHandle;
pub use month::DisplayedMonth;
pub use query::{CalendarEntry, DayMap};
pub use state::WidgetSnapshot;
