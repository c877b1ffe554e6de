use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::DateTime;
use chrono_tz::Tz;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::clock::start_of_day;
use crate::event::EventRecord;

#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub events_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let events_path = data_dir.join("events.data");
        if !events_path.exists() {
            fs::write(&events_path, "")?;
        }

        info!(
            data_dir = %data_dir.display(),
            events = %events_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            events_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_all(&self) -> anyhow::Result<Vec<EventRecord>> {
        load_jsonl(&self.events_path).context("failed to load events.data")
    }

    #[tracing::instrument(skip(self, events))]
    pub fn save_all(&self, events: &[EventRecord]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.events_path, events).context("failed to save events.data")
    }

    #[tracing::instrument(skip(self, event), fields(event = %event.eventname))]
    pub fn add_event(&self, event: EventRecord) -> anyhow::Result<()> {
        let mut events = self.load_all()?;
        events.push(event);
        self.save_all(&events)
    }

    /// Events starting on or after local midnight of `now`'s day, earliest
    /// first. Records whose times do not parse cannot be placed and are left
    /// out.
    #[tracing::instrument(skip(self, tz, now))]
    pub fn query_upcoming(&self, tz: &Tz, now: &DateTime<Tz>) -> anyhow::Result<Vec<EventRecord>> {
        let min = start_of_day(now)
            .ok_or_else(|| anyhow!("no valid local midnight for {}", now.date_naive()))?;

        let mut dated = Vec::new();
        for event in self.load_all()? {
            match event.window(tz) {
                Ok(window) if window.start >= min => dated.push((window.start, event)),
                Ok(_) => {}
                Err(err) => {
                    warn!(event = %event.eventname, error = %err, "skipping event with unreadable time");
                }
            }
        }

        dated.sort_by_key(|(start, _)| *start);
        debug!(count = dated.len(), "queried upcoming events");
        Ok(dated.into_iter().map(|(_, event)| event).collect())
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> anyhow::Result<Vec<EventRecord>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: EventRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(event);
    }

    debug!(count = out.len(), "loaded events from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, events))]
fn save_jsonl_atomic(path: &Path, events: &[EventRecord]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = events.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for event in events {
        let serialized = serde_json::to_string(event)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
