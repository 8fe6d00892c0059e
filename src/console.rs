//! Line-oriented terminal front end for the calendar widget.

use crate::components::calendar::{CalendarHandle, CreateOutcome, WidgetSnapshot};
use crate::components::notion::{page_url, ConnectionSettings};
use crate::config::Config;
use crate::error::CalendarResult;
use crate::utils::time::today_label;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// A command typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Connect { database_id: String, token: String },
    Relay { database_id: String },
    Next,
    Previous,
    Refresh,
    Add,
    Open(u32),
    Settings,
    Show,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_command(line: &str) -> ConsoleCommand {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return ConsoleCommand::Empty;
    };
    let args: Vec<&str> = words.collect();

    match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("connect", [database_id, token]) => ConsoleCommand::Connect {
            database_id: database_id.to_string(),
            token: token.to_string(),
        },
        ("relay", [database_id]) => ConsoleCommand::Relay {
            database_id: database_id.to_string(),
        },
        ("next" | "n" | ">", []) => ConsoleCommand::Next,
        ("prev" | "p" | "<", []) => ConsoleCommand::Previous,
        ("refresh" | "r", []) => ConsoleCommand::Refresh,
        ("add" | "a", []) => ConsoleCommand::Add,
        ("open" | "o", [day]) => match day.parse::<u32>() {
            Ok(day) => ConsoleCommand::Open(day),
            Err(_) => ConsoleCommand::Unknown(line.trim().to_string()),
        },
        ("settings", []) => ConsoleCommand::Settings,
        ("show" | "s", []) => ConsoleCommand::Show,
        ("help" | "h" | "?", []) => ConsoleCommand::Help,
        ("quit" | "q" | "exit", []) => ConsoleCommand::Quit,
        _ => ConsoleCommand::Unknown(line.trim().to_string()),
    }
}

/// Connection settings from the configuration, if it names a complete connection
pub fn startup_settings(config: &Config) -> Option<ConnectionSettings> {
    let database_id = config.database_id.clone()?;
    if config.use_relay {
        Some(ConnectionSettings::relayed(database_id))
    } else {
        config
            .notion_token
            .clone()
            .map(|token| ConnectionSettings::direct(token, database_id))
    }
}

/// Render a snapshot as text
pub fn render(snapshot: &WidgetSnapshot) -> String {
    let mut out = String::new();

    let mode = match (&snapshot.database_id, snapshot.use_relay) {
        (None, _) => "",
        (Some(_), true) => " (relay)",
        (Some(_), false) => " (direct)",
    };
    out.push_str(&format!(
        "{}   < {} >{}\n",
        snapshot.month.year,
        snapshot.month.name(),
        mode
    ));
    out.push_str(&format!(
        "{} {}\n",
        t!("widget.today_is"),
        today_label(snapshot.today)
    ));

    if snapshot.loading {
        out.push_str(&t!("widget.loading"));
        out.push('\n');
    }
    out.push_str(&snapshot.grid.to_string());

    if let Some(error) = &snapshot.error {
        out.push_str(&format!("! {}\n", error));
    }
    if snapshot.database_id.is_none() {
        out.push_str(&t!("widget.not_configured"));
        out.push('\n');
    } else if snapshot.settings_requested {
        out.push_str(&t!("widget.reconfigure_hint"));
        out.push('\n');
    }
    out
}

fn print_out(text: &str) {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "{}", text);
    if !text.ends_with('\n') {
        let _ = writeln!(stdout);
    }
    let _ = stdout.flush();
}

fn prompt() {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "> ");
    let _ = stdout.flush();
}

fn open_in_browser(url: &str) {
    print_out(url);
    if let Err(e) = webbrowser::open(url) {
        warn!("Failed to open browser: {}", e);
    }
}

/// Run the prompt until `quit` or end of input
pub async fn run(handle: CalendarHandle, config: &Config) -> CalendarResult<()> {
    let snapshot = match startup_settings(config) {
        Some(settings) => handle.configure(settings).await?,
        None => handle.snapshot().await?,
    };
    print_out(&render(&snapshot));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            ConsoleCommand::Connect { database_id, token } => {
                let snapshot = handle
                    .configure(ConnectionSettings::direct(token, database_id))
                    .await?;
                if let Some(id) = &snapshot.database_id {
                    print_out(&t!("widget.connected", id = id));
                }
                print_out(&render(&snapshot));
            }
            ConsoleCommand::Relay { database_id } => {
                let snapshot = handle
                    .configure(ConnectionSettings::relayed(database_id))
                    .await?;
                if let Some(id) = &snapshot.database_id {
                    print_out(&t!("widget.connected", id = id));
                }
                print_out(&render(&snapshot));
            }
            ConsoleCommand::Next => print_out(&render(&handle.next_month().await?)),
            ConsoleCommand::Previous => print_out(&render(&handle.previous_month().await?)),
            ConsoleCommand::Refresh => print_out(&render(&handle.refresh().await?)),
            ConsoleCommand::Add => match handle.add_entry().await? {
                CreateOutcome::Created(page_id) => {
                    print_out(&t!("entry.created", id = page_id.as_str()));
                    if config.open_created_pages {
                        open_in_browser(&page_url(&page_id));
                    }
                }
                CreateOutcome::Failed => print_out(&render(&handle.snapshot().await?)),
                CreateOutcome::Busy => print_out(&t!("widget.busy")),
                CreateOutcome::NotConfigured => print_out(&t!("widget.not_configured")),
            },
            ConsoleCommand::Open(day) => {
                let snapshot = handle.snapshot().await?;
                match snapshot.grid.day(day).and_then(|cell| cell.link()) {
                    Some(url) => open_in_browser(&url),
                    None => print_out(&t!("widget.no_entry", day = day.to_string())),
                }
            }
            ConsoleCommand::Settings => print_out(&render(&handle.reconfigure().await?)),
            ConsoleCommand::Show => print_out(&render(&handle.snapshot().await?)),
            ConsoleCommand::Help => print_out(&t!("widget.help")),
            ConsoleCommand::Quit => break,
            ConsoleCommand::Empty => {}
            ConsoleCommand::Unknown(input) => {
                warn!("Unknown command: {}", input);
                print_out(&t!("widget.help"));
            }
        }
    }

    info!("Leaving calendar");
    handle.shutdown().await
}
