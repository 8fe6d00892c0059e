use super::month::DisplayedMonth;
use super::query::DayMap;
use crate::components::notion::identifier::page_url;
use crate::utils::time::weekday_from_sunday;
use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Cells in the grid: six weeks of seven days
pub const GRID_CELLS: usize = 42;
pub const GRID_COLUMNS: usize = 7;

/// Wide enough for `[15]*`
const CELL_WIDTH: usize = 5;

const WEEKDAY_HEADER: [&str; GRID_COLUMNS] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// Marker for a day that has a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMarker {
    pub color: String,
    pub page_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub day: u32,
    pub is_today: bool,
    pub entry: Option<EntryMarker>,
}

impl DayCell {
    /// Page link for an entry cell
    pub fn link(&self) -> Option<String> {
        self.entry.as_ref().map(|e| page_url(&e.page_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Blank,
    Day(DayCell),
}

/// Laid-out month, Monday first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid {
    pub month: DisplayedMonth,
    pub cells: Vec<Cell>,
}

/// Blank cells before day 1 in a Monday-first week
pub fn leading_blanks(month: DisplayedMonth) -> usize {
    ((weekday_from_sunday(month.first_day()) + 6) % 7) as usize
}

impl CalendarGrid {
    pub fn layout(month: DisplayedMonth, entries: &DayMap, today: NaiveDate) -> Self {
        let is_current_month = month.contains(today);
        let mut cells = Vec::with_capacity(GRID_CELLS);

        cells.resize(leading_blanks(month), Cell::Blank);

        for day in 1..=month.days_in_month() {
            cells.push(Cell::Day(DayCell {
                day,
                is_today: is_current_month && day == today.day(),
                entry: entries.get(&day).map(|e| EntryMarker {
                    color: e.color.clone(),
                    page_id: e.page_id.clone(),
                }),
            }));
        }

        while cells.len() < GRID_CELLS {
            cells.push(Cell::Blank);
        }

        Self { month, cells }
    }

    /// The grid split into weeks
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(GRID_COLUMNS)
    }

    /// Cell for a day of the month
    pub fn day(&self, day: u32) -> Option<&DayCell> {
        self.cells.iter().find_map(|cell| match cell {
            Cell::Day(d) if d.day == day => Some(d),
            _ => None,
        })
    }
}

impl fmt::Display for CalendarGrid {
    /// Text rendering: `[5]` marks today, `5*` a day with an entry
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", WEEKDAY_HEADER.map(|d| format!("{:>CELL_WIDTH$}", d)).join(""))?;
        for row in self.rows() {
            let mut line = String::new();
            for cell in row {
                let text = match cell {
                    Cell::Blank => String::new(),
                    Cell::Day(d) => {
                        let marker = if d.entry.is_some() { "*" } else { "" };
                        if d.is_today {
                            format!("[{}]{}", d.day, marker)
                        } else {
                            format!("{}{}", d.day, marker)
                        }
                    }
                };
                line.push_str(&format!("{:>CELL_WIDTH$}", text));
            }
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
