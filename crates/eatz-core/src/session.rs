//! The in-memory event board: one fetched collection, filtered and rendered
//! without refetching.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::event::EventRecord;
use crate::present::{Annotation, annotate};
use crate::status::{StatusDescriptor, classify_record};
use crate::text::{CARD_DESC_MAX_WORDS, CARD_TITLE_MAX_WORDS, truncate_words};

pub const EMPTY_MESSAGE: &str = "No events found for this campus.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardLimits {
    pub title_words: usize,
    pub description_words: usize,
}

impl Default for CardLimits {
    fn default() -> Self {
        Self {
            title_words: CARD_TITLE_MAX_WORDS,
            description_words: CARD_DESC_MAX_WORDS,
        }
    }
}

impl CardLimits {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            title_words: cfg
                .get_usize("card.title.max_words")?
                .unwrap_or(defaults.title_words),
            description_words: cfg
                .get_usize("card.description.max_words")?
                .unwrap_or(defaults.description_words),
        })
    }
}

/// A rendered event. Title and description are cut to the card limits; the
/// full text is kept alongside.
#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub title: String,
    pub full_title: String,
    pub location: String,
    pub description: String,
    pub full_description: String,
    pub free_food: String,
    pub status: Option<StatusDescriptor>,
    pub annotation: Option<Annotation>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderPass {
    pub cards: Vec<Card>,
    pub skipped_past: usize,
    pub unparsed: usize,
}

impl RenderPass {
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RenderSession {
    events: Vec<EventRecord>,
    tz: Tz,
    limits: CardLimits,
}

impl RenderSession {
    pub fn new(tz: Tz, limits: CardLimits) -> Self {
        Self {
            events: Vec::new(),
            tz,
            limits,
        }
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Replaces the held collection with `fetched`, dropping events already
    /// past at `now`. Events whose times do not parse are kept. Returns the
    /// number held.
    #[tracing::instrument(skip(self, fetched, now), fields(fetched = fetched.len()))]
    pub fn load(&mut self, fetched: Vec<EventRecord>, now: &DateTime<Tz>) -> usize {
        let mut kept = Vec::with_capacity(fetched.len());
        for event in fetched {
            match classify_record(&event, &self.tz, now) {
                Ok(status) if status.is_past() => {
                    debug!(event = %event.eventname, "dropping past event");
                }
                Ok(_) => kept.push(event),
                Err(err) => {
                    warn!(event = %event.eventname, error = %err, "event status error; keeping event");
                    kept.push(event);
                }
            }
        }

        self.events = kept;
        info!(held = self.events.len(), "loaded event collection");
        self.events.len()
    }

    /// Case-insensitive campus match; a blank selection returns everything.
    pub fn filter_by_campus(&self, campus: &str) -> Vec<&EventRecord> {
        if campus.trim().is_empty() {
            return self.events.iter().collect();
        }
        self.events
            .iter()
            .filter(|event| event.is_on_campus(campus))
            .collect()
    }

    /// Classifies each event once against `now` and builds its card, skipping
    /// past events.
    #[tracing::instrument(skip(self, events, now), fields(events = events.len()))]
    pub fn render(&self, events: &[&EventRecord], now: &DateTime<Tz>) -> RenderPass {
        let mut pass = RenderPass::default();

        for event in events {
            let status = match classify_record(event, &self.tz, now) {
                Ok(status) if status.is_past() => {
                    debug!(event = %event.eventname, "skipping past event");
                    pass.skipped_past += 1;
                    continue;
                }
                Ok(status) => Some(status),
                Err(err) => {
                    warn!(event = %event.eventname, error = %err, "event status error");
                    pass.unparsed += 1;
                    None
                }
            };

            let annotation = status.as_ref().and_then(annotate);
            pass.cards.push(Card {
                title: truncate_words(Some(&event.eventname), self.limits.title_words),
                full_title: event.eventname.clone(),
                location: event.location(),
                description: truncate_words(
                    Some(&event.description),
                    self.limits.description_words,
                ),
                full_description: event.description.clone(),
                free_food: event.freefood.clone(),
                status,
                annotation,
            });
        }

        debug!(
            cards = pass.cards.len(),
            skipped_past = pass.skipped_past,
            unparsed = pass.unparsed,
            "render pass complete"
        );
        pass
    }

    pub fn render_campus(&self, campus: Option<&str>, now: &DateTime<Tz>) -> RenderPass {
        let selected = self.filter_by_campus(campus.unwrap_or_default());
        self.render(&selected, now)
    }
}
