use std::path::PathBuf;
use std::thread;
use std::time::Duration as StdDuration;

use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, instrument, warn};

use crate::cli::Invocation;
use crate::clock::{make_instant, parse_clock_time, parse_event_date, parse_now};
use crate::config::Config;
use crate::datastore::DataStore;
use crate::event::EventRecord;
use crate::fixture::{canned_records, load_fixture_file, shift_records};
use crate::present::Painter;
use crate::session::{CardLimits, RenderSession};
use crate::status::classify_record;
use crate::text::{CARD_DESC_MAX_WORDS, CARD_TITLE_MAX_WORDS, count_words};

/// Word limit enforced on new event names.
pub const MAX_NAME_WORDS: usize = CARD_TITLE_MAX_WORDS;
/// Word limit enforced on new event descriptions.
pub const MAX_DESC_WORDS: usize = CARD_DESC_MAX_WORDS;

const USAGE: &str = "\
usage: eatz [options] [campus:<name>] [command] [args]

commands:
  list                         show upcoming events with live status (default)
  status <DATE> <START> <END>  classify one event window, e.g. 2026-10-16 \"2:00 PM\" \"4:00 PM\"
  add key:value...             store an event (name, campus, building, room,
                               date, start, end, description, food)
  fixture                      print the time-shifted fixture records
  help                         show this text
  version                      print the version

options:
  --mock            use fixture events instead of the datastore
  --fixture <PATH>  JSON records to shift in place of the built-in fixture
  --now <WHEN>      evaluate at WHEN (now, RFC3339, or YYYY-MM-DD HH:MM)
  --json            print JSON instead of a table
  --watch <SECS>    repeat the list pass every SECS seconds
  --data <DIR>      datastore directory
  --eatzrc <PATH>   config file
  --rc KEY=VALUE    override a config key
";

/// Settings for one invocation that are not config keys.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub tz: Tz,
    pub now: Option<String>,
    pub mock: bool,
    pub fixture: Option<PathBuf>,
    pub json: bool,
    pub watch: Option<u64>,
}

impl RunOptions {
    pub fn resolve_now(&self) -> anyhow::Result<DateTime<Tz>> {
        match &self.now {
            Some(raw) => parse_now(raw, &self.tz),
            None => Ok(Utc::now().with_timezone(&self.tz)),
        }
    }

    fn uses_fixture(&self) -> bool {
        self.mock || self.fixture.is_some()
    }
}

pub fn known_command_names() -> Vec<&'static str> {
    vec!["list", "status", "add", "fixture", "help", "version"]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, cfg, painter, opts, inv))]
pub fn dispatch(
    store: Option<&DataStore>,
    cfg: &Config,
    painter: &Painter,
    opts: &RunOptions,
    inv: Invocation,
) -> anyhow::Result<()> {
    let command = inv.command.as_str();
    debug!(
        command,
        filters = ?inv.filter_terms,
        args = ?inv.command_args,
        "dispatching command"
    );

    match command {
        "list" => {
            reject_command_args(command, &inv.command_args)?;
            cmd_list(store, cfg, painter, opts, &inv.filter_terms)
        }
        "status" => cmd_status(painter, opts, &inv.command_args),
        "add" => cmd_add(store, opts, &inv.command_args),
        "fixture" => {
            reject_command_args(command, &inv.command_args)?;
            cmd_fixture(painter, opts)
        }
        "help" => {
            print!("{USAGE}");
            Ok(())
        }
        "version" => {
            println!("eatz {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// Global flags go before the command.
fn reject_command_args(command: &str, args: &[String]) -> anyhow::Result<()> {
    if args.is_empty() {
        return Ok(());
    }
    bail!(
        "{command} takes no arguments, got: {} (put flags such as --json before the command)",
        args.join(" ")
    )
}

/// Campus selection from `campus:<name>` filter terms, falling back to the
/// `campus` config key.
pub fn campus_selection(cfg: &Config, filter_terms: &[String]) -> anyhow::Result<Option<String>> {
    let mut selected = None;
    for term in filter_terms {
        match term.split_once(':') {
            Some((key, value)) if key.eq_ignore_ascii_case("campus") => {
                selected = Some(value.trim().to_string());
            }
            _ => bail!("unsupported filter term: {term} (expected campus:<name>)"),
        }
    }
    Ok(selected.or_else(|| cfg.get("campus")))
}

#[instrument(skip(store, cfg, painter, opts, filter_terms))]
fn cmd_list(
    store: Option<&DataStore>,
    cfg: &Config,
    painter: &Painter,
    opts: &RunOptions,
    filter_terms: &[String],
) -> anyhow::Result<()> {
    let campus = campus_selection(cfg, filter_terms)?;
    let limits = CardLimits::from_config(cfg)?;
    let mut session = RenderSession::new(opts.tz, limits);

    if opts.watch.is_some() && opts.now.is_some() {
        warn!("--watch with a fixed --now renders the same instant every pass");
    }

    loop {
        let now = opts.resolve_now()?;
        let fetched = fetch_events(store, opts, &now)?;
        session.load(fetched, &now);

        let pass = session.render_campus(campus.as_deref(), &now);
        info!(
            campus = campus.as_deref().unwrap_or("all"),
            cards = pass.cards.len(),
            "rendered events"
        );

        if opts.json {
            painter.print_json(&pass)?;
        } else {
            painter.print_cards(&pass)?;
        }

        let Some(secs) = opts.watch else {
            return Ok(());
        };
        thread::sleep(StdDuration::from_secs(secs.max(1)));
        if !opts.json {
            println!();
        }
    }
}

fn fetch_events(
    store: Option<&DataStore>,
    opts: &RunOptions,
    now: &DateTime<Tz>,
) -> anyhow::Result<Vec<EventRecord>> {
    if opts.uses_fixture() {
        return fixture_events(opts, now);
    }

    let store = store.ok_or_else(|| anyhow!("no datastore is open"))?;
    store
        .query_upcoming(&opts.tz, now)
        .context("failed to fetch events")
}

fn fixture_events(opts: &RunOptions, now: &DateTime<Tz>) -> anyhow::Result<Vec<EventRecord>> {
    let base = match &opts.fixture {
        Some(path) => load_fixture_file(path)?,
        None => canned_records(),
    };
    Ok(shift_records(base, now))
}

#[instrument(skip(painter, opts))]
fn cmd_status(painter: &Painter, opts: &RunOptions, args: &[String]) -> anyhow::Result<()> {
    let [date, start, end] = args else {
        bail!("status expects <DATE> <START> <END>, e.g. 2026-10-16 \"2:00 PM\" \"4:00 PM\"");
    };

    let record = EventRecord {
        date: date.clone(),
        starttime: start.clone(),
        endtime: end.clone(),
        ..EventRecord::default()
    };
    let now = opts.resolve_now()?;
    let descriptor = classify_record(&record, &opts.tz, &now)?;

    if opts.json {
        return painter.print_json(&descriptor);
    }

    match &descriptor.label {
        Some(label) => println!("{}: {label}", descriptor.status),
        None => println!("{}", descriptor.status),
    }
    Ok(())
}

#[instrument(skip(store, opts, args))]
fn cmd_add(store: Option<&DataStore>, opts: &RunOptions, args: &[String]) -> anyhow::Result<()> {
    if opts.uses_fixture() {
        bail!("add writes to the datastore; drop --mock/--fixture");
    }
    let store = store.ok_or_else(|| anyhow!("no datastore is open"))?;

    let record = build_event(args, &opts.tz)?;
    let name = record.eventname.clone();
    store.add_event(record)?;
    info!(event = %name, "event added");
    println!("Event added successfully: {name}");
    Ok(())
}

/// Builds a record from `key:value` arguments, enforcing word limits and
/// normalizing clock times to `H:MM AM|PM`.
pub fn build_event(args: &[String], tz: &Tz) -> anyhow::Result<EventRecord> {
    let mut record = EventRecord::default();

    for arg in args {
        let (key, value) = arg
            .split_once(':')
            .ok_or_else(|| anyhow!("expected key:value, got: {arg}"))?;
        let value = value.trim().to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "name" => record.eventname = value,
            "campus" => record.campus = value,
            "building" => record.building = value,
            "room" => record.room = value,
            "date" => record.date = value,
            "start" => record.starttime = value,
            "end" => record.endtime = value,
            "description" | "desc" => record.description = value,
            "food" => record.freefood = value,
            other => bail!("unknown event field: {other}"),
        }
    }

    for (field, value) in [
        ("name", &record.eventname),
        ("campus", &record.campus),
        ("date", &record.date),
        ("start", &record.starttime),
        ("end", &record.endtime),
    ] {
        if value.trim().is_empty() {
            bail!("missing required field: {field}");
        }
    }

    if count_words(&record.eventname) > MAX_NAME_WORDS {
        bail!("Event name is too long (max {MAX_NAME_WORDS} words).");
    }
    if count_words(&record.description) > MAX_DESC_WORDS {
        bail!("Event description is too long (max {MAX_DESC_WORDS} words).");
    }

    record.date = parse_event_date(&record.date)?.format("%Y-%m-%d").to_string();
    record.starttime = parse_clock_time(&record.starttime)?.to_12h_string();
    record.endtime = parse_clock_time(&record.endtime)?.to_12h_string();

    let start = make_instant(&record.date, &record.starttime, tz)?;
    let end = make_instant(&record.date, &record.endtime, tz)?;
    if end < start {
        bail!(
            "end time {} is before start time {}",
            record.endtime,
            record.starttime
        );
    }

    record.timestamp = Some(Utc::now().timestamp_millis().to_string());
    Ok(record)
}

#[instrument(skip(painter, opts))]
fn cmd_fixture(painter: &Painter, opts: &RunOptions) -> anyhow::Result<()> {
    let now = opts.resolve_now()?;
    let records = fixture_events(opts, &now)?;
    painter.print_json(&records)
}
