use std::collections::BTreeMap;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock::make_instant;
use crate::error::ParseError;

/// One campus event as stored and fetched. Wire keys are uppercase.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub struct EventRecord {
    #[serde(default)]
    pub eventname: String,

    #[serde(default)]
    pub campus: String,

    #[serde(default)]
    pub building: String,

    #[serde(default)]
    pub room: String,

    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,

    /// `H:MM AM|PM`
    #[serde(default)]
    pub starttime: String,

    #[serde(default)]
    pub endtime: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub freefood: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flyerlink: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Start and end instants of an event plus the clock text shown in labels.
#[derive(Debug, Clone, PartialEq)]
pub struct EventWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub start_text: String,
    pub end_text: String,
}

impl EventRecord {
    pub fn location(&self) -> String {
        format!("{} Campus, {} {}", self.campus, self.building, self.room)
    }

    /// Derives the event window; both times sit on the record's `DATE`.
    pub fn window(&self, tz: &Tz) -> Result<EventWindow, ParseError> {
        Ok(EventWindow {
            start: make_instant(&self.date, &self.starttime, tz)?,
            end: make_instant(&self.date, &self.endtime, tz)?,
            start_text: self.starttime.clone(),
            end_text: self.endtime.clone(),
        })
    }

    pub fn is_on_campus(&self, campus: &str) -> bool {
        self.campus.trim().to_lowercase() == campus.trim().to_lowercase()
    }
}
