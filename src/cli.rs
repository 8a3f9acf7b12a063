// File: ./src/cli.rs
//! Command-line parsing and output helpers shared by the binary.
use crate::export::ExportFormat;
use crate::store::{Entry, SearchQuery};
use anyhow::Result;
use chrono_tz::Tz;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Parse { text: String, at: Option<String> },
    Add { text: String },
    Update { id: u64, text: String },
    Delete { id: u64 },
    List,
    Search(SearchArgs),
    Export {
        format: ExportFormat,
        path: Option<PathBuf>,
    },
    Watch,
    Help,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchArgs {
    pub title: Option<String>,
    pub location: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl From<SearchArgs> for SearchQuery {
    fn from(a: SearchArgs) -> Self {
        SearchQuery {
            title: a.title,
            location: a.location,
            from: a.from,
            to: a.to,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub root: Option<PathBuf>,
    pub command: Command,
}

fn take_value(args: &[String], i: usize, flag: &str) -> Result<String> {
    args.get(i + 1)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("{} needs a value", flag))
}

fn parse_id(raw: Option<&String>) -> Result<u64> {
    let raw = raw.ok_or_else(|| anyhow::anyhow!("Missing event id"))?;
    raw.parse::<u64>()
        .map_err(|_| anyhow::anyhow!("Invalid event id '{}'", raw))
}

/// Parses the arguments after the program name.
///
/// Free text may be given as several words ("jotter add lunch at noon"); they
/// are joined with spaces.
pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut root = None;
    let mut rest: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-r" | "--root" => {
                root = Some(PathBuf::from(take_value(args, i, "--root")?));
                i += 2;
            }
            "-h" | "--help" => {
                return Ok(CliArgs {
                    root,
                    command: Command::Help,
                });
            }
            _ => {
                rest.push(args[i].clone());
                i += 1;
            }
        }
    }

    let Some((name, tail)) = rest.split_first() else {
        return Ok(CliArgs {
            root,
            command: Command::Help,
        });
    };

    let command = match name.as_str() {
        "help" => Command::Help,
        "parse" => {
            let mut at = None;
            let mut words = Vec::new();
            let mut j = 0;
            while j < tail.len() {
                if tail[j] == "--at" {
                    at = Some(take_value(tail, j, "--at")?);
                    j += 2;
                } else {
                    words.push(tail[j].as_str());
                    j += 1;
                }
            }
            Command::Parse {
                text: require_text(&words)?,
                at,
            }
        }
        "add" => Command::Add {
            text: require_text(&tail.iter().map(String::as_str).collect::<Vec<_>>())?,
        },
        "update" => {
            let id = parse_id(tail.first())?;
            let words: Vec<&str> = tail.iter().skip(1).map(String::as_str).collect();
            Command::Update {
                id,
                text: require_text(&words)?,
            }
        }
        "delete" => Command::Delete {
            id: parse_id(tail.first())?,
        },
        "list" => Command::List,
        "search" => {
            let mut search = SearchArgs::default();
            let mut j = 0;
            while j < tail.len() {
                let flag = tail[j].as_str();
                let slot = match flag {
                    "--title" => &mut search.title,
                    "--location" => &mut search.location,
                    "--from" => &mut search.from,
                    "--to" => &mut search.to,
                    other => return Err(anyhow::anyhow!("Unknown search option '{}'", other)),
                };
                *slot = Some(take_value(tail, j, flag)?);
                j += 2;
            }
            Command::Search(search)
        }
        "export" => {
            let raw = tail
                .first()
                .ok_or_else(|| anyhow::anyhow!("export needs a format: json or ics"))?;
            let format = raw
                .parse::<ExportFormat>()
                .map_err(|_| anyhow::anyhow!("Unknown export format '{}'", raw))?;
            Command::Export {
                format,
                path: tail.get(1).map(PathBuf::from),
            }
        }
        "watch" => Command::Watch,
        other => return Err(anyhow::anyhow!("Unknown command '{}'. Try --help", other)),
    };

    Ok(CliArgs { root, command })
}

fn require_text(words: &[&str]) -> Result<String> {
    let text = words.join(" ");
    if text.trim().is_empty() {
        return Err(anyhow::anyhow!("Missing event text"));
    }
    Ok(text)
}

/// One line per entry for `list` and `search`.
pub fn format_entry(entry: &Entry, tz: &Tz) -> String {
    let when = match entry.event.start_time {
        Some(start) => start.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string(),
        None => "----------------".to_string(),
    };
    let mut line = format!("{:>4}  {}  {}", entry.id, when, entry.title());
    if let Some(loc) = &entry.event.location {
        line.push_str(&format!(" @ {}", loc));
    }
    if entry.event.reminder_minutes > 0 {
        line.push_str(&format!(" (remind {} min before)", entry.event.reminder_minutes));
    }
    line
}

pub fn print_help(binary_name: &str) {
    println!(
        "Jotter v{} - turn a sentence into a calendar entry",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--root <path>] <command>", binary_name);
    println!();
    println!("COMMANDS:");
    println!("    parse <text> [--at <rfc3339>]   Print the parsed event as JSON");
    println!("    add <text>                      Parse and store a new event");
    println!("    update <id> <text>              Re-parse and replace an event");
    println!("    delete <id>                     Remove an event");
    println!("    list                            List events by start time");
    println!("    search [--title T] [--location L] [--from D] [--to D]");
    println!("                                    D is YYYY-MM-DD or 'YYYY-MM-DD HH:MM'");
    println!("    export json|ics [path]          Export to stdout or a file");
    println!("    watch                           Run the reminder loop until Ctrl-C");
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("EXAMPLES:");
    println!("    {} add \"Remind me to call mom tomorrow at 5pm\"", binary_name);
    println!(
        "    {} add \"Team sync at the office 10:30 Thursday, remind before 15 minutes\"",
        binary_name
    );
    println!("    {} search --from 2025-11-13 --to 2025-11-13", binary_name);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_root_anywhere_and_words_joined() {
        let parsed = parse_args(&args(&["add", "lunch", "at", "noon", "--root", "/tmp/j"])).unwrap();
        assert_eq!(parsed.root, Some(PathBuf::from("/tmp/j")));
        assert_eq!(
            parsed.command,
            Command::Add {
                text: "lunch at noon".into()
            }
        );
    }

    #[test]
    fn test_parse_with_reference() {
        let parsed =
            parse_args(&args(&["parse", "gym 7pm", "--at", "2025-11-12T09:00:00+07:00"])).unwrap();
        assert_eq!(
            parsed.command,
            Command::Parse {
                text: "gym 7pm".into(),
                at: Some("2025-11-12T09:00:00+07:00".into())
            }
        );
    }

    #[test]
    fn test_search_and_export() {
        let parsed = parse_args(&args(&["search", "--title", "sync", "--to", "2025-11-13"])).unwrap();
        assert_eq!(
            parsed.command,
            Command::Search(SearchArgs {
                title: Some("sync".into()),
                to: Some("2025-11-13".into()),
                ..SearchArgs::default()
            })
        );

        let parsed = parse_args(&args(&["export", "ICS", "out.ics"])).unwrap();
        assert_eq!(
            parsed.command,
            Command::Export {
                format: ExportFormat::Ics,
                path: Some(PathBuf::from("out.ics"))
            }
        );
    }

    #[test]
    fn test_bad_input() {
        assert!(parse_args(&args(&["delete", "abc"])).is_err());
        assert!(parse_args(&args(&["add"])).is_err());
        assert!(parse_args(&args(&["export", "pdf"])).is_err());
        assert!(parse_args(&args(&["frobnicate"])).is_err());
        assert_eq!(parse_args(&[]).unwrap().command, Command::Help);
    }
}
