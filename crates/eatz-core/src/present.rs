use std::io::{self, IsTerminal, Write};

use serde::{Serialize, Serializer};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::session::{Card, EMPTY_MESSAGE, RenderPass};
use crate::status::{Status, StatusColor, StatusDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayColor {
    pub hex: &'static str,
    rgb: (u8, u8, u8),
}

pub const RED: DisplayColor = DisplayColor {
    hex: "#dd3c18",
    rgb: (0xdd, 0x3c, 0x18),
};
pub const GREEN: DisplayColor = DisplayColor {
    hex: "#19b875",
    rgb: (0x19, 0xb8, 0x75),
};
pub const ORANGE: DisplayColor = DisplayColor {
    hex: "#f6cc5d",
    rgb: (0xf6, 0xcc, 0x5d),
};

impl Serialize for DisplayColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.hex)
    }
}

/// Red stands in for a missing color.
pub fn display_color(color: Option<StatusColor>) -> DisplayColor {
    match color {
        Some(StatusColor::Red) | None => RED,
        Some(StatusColor::Green) => GREEN,
        Some(StatusColor::Orange) => ORANGE,
    }
}

/// Looks up a color by its symbolic name; unrecognized names fall back to red.
pub fn color_from_name(name: &str) -> DisplayColor {
    let color = match name.trim().to_ascii_lowercase().as_str() {
        "red" => Some(StatusColor::Red),
        "green" => Some(StatusColor::Green),
        "orange" => Some(StatusColor::Orange),
        _ => None,
    };
    display_color(color)
}

/// What a card shows for its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub label: String,
    pub color: DisplayColor,
    pub blink: bool,
}

/// `None` for past events, which are not rendered at all.
pub fn annotate(status: &StatusDescriptor) -> Option<Annotation> {
    match status.status {
        Status::Past => None,
        Status::Future
        | Status::EndingSoon
        | Status::Now
        | Status::Upcoming
        | Status::Unknown => Some(Annotation {
            label: status.label.clone().unwrap_or_default(),
            color: display_color(status.color),
            blink: status.blink,
        }),
    }
}

#[derive(Debug, Clone)]
pub struct Painter {
    color: bool,
}

impl Painter {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, pass), fields(cards = pass.cards.len()))]
    pub fn print_cards(&self, pass: &RenderPass) -> anyhow::Result<()> {
        let out = io::stdout().lock();
        self.write_cards(out, pass)
    }

    pub fn write_cards<W: Write>(&self, mut writer: W, pass: &RenderPass) -> anyhow::Result<()> {
        if pass.cards.is_empty() {
            writeln!(writer, "{EMPTY_MESSAGE}")?;
            return Ok(());
        }

        let headers = vec![
            "Status".to_string(),
            "Event".to_string(),
            "Where".to_string(),
            "Free food".to_string(),
            "About".to_string(),
        ];

        let rows = pass
            .cards
            .iter()
            .map(|card| {
                vec![
                    self.status_cell(card),
                    card.title.clone(),
                    card.location.clone(),
                    card.free_food.clone(),
                    card.description.clone(),
                ]
            })
            .collect();

        write_table(&mut writer, headers, rows)
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
        Ok(())
    }

    fn status_cell(&self, card: &Card) -> String {
        match &card.annotation {
            Some(annotation) => self.paint(annotation),
            None => "-".to_string(),
        }
    }

    fn paint(&self, annotation: &Annotation) -> String {
        if !self.color {
            return annotation.label.clone();
        }
        let (r, g, b) = annotation.color.rgb;
        let blink = if annotation.blink { "5;" } else { "" };
        format!("\x1b[{blink}38;2;{r};{g};{b}m{}\x1b[0m", annotation.label)
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{
        Annotation, GREEN, ORANGE, Painter, RED, annotate, color_from_name, display_color,
        strip_ansi,
    };
    use crate::config::Config;
    use crate::session::{Card, RenderPass};
    use crate::status::{Status, StatusColor, StatusDescriptor};

    fn descriptor(status: Status, color: Option<StatusColor>, blink: bool) -> StatusDescriptor {
        StatusDescriptor {
            status,
            color,
            blink,
            label: color.map(|_| "Happening now (today from 1:00 PM to 2:00 PM)".to_string()),
            time: None,
        }
    }

    #[test]
    fn maps_colors_with_red_fallback() {
        assert_eq!(display_color(Some(StatusColor::Green)), GREEN);
        assert_eq!(display_color(Some(StatusColor::Orange)), ORANGE);
        assert_eq!(display_color(None), RED);
        assert_eq!(color_from_name("purple"), RED);
        assert_eq!(color_from_name(" Orange "), ORANGE);
        assert_eq!(GREEN.hex, "#19b875");
    }

    #[test]
    fn past_has_no_annotation() {
        assert_eq!(annotate(&descriptor(Status::Past, None, false)), None);
    }

    #[test]
    fn unknown_renders_red_and_blank() {
        let annotation = annotate(&descriptor(Status::Unknown, None, false)).expect("annotation");
        assert_eq!(annotation.color, RED);
        assert_eq!(annotation.label, "");
        assert!(!annotation.blink);
    }

    #[test]
    fn blink_is_carried_through() {
        let annotation = annotate(&descriptor(Status::EndingSoon, Some(StatusColor::Green), true))
            .expect("annotation");
        assert!(annotation.blink);
        assert_eq!(annotation.color, GREEN);
    }

    #[test]
    fn color_setting_is_validated() {
        let mut cfg = Config::default();
        cfg.apply_overrides(vec![("rc.color".to_string(), "off".to_string())]);
        assert!(!Painter::new(&cfg).expect("color off").color);

        cfg.apply_overrides(vec![("color".to_string(), "sometimes".to_string())]);
        assert!(Painter::new(&cfg).is_err());
    }

    #[test]
    fn painted_label_keeps_visible_text() {
        let painter = Painter { color: true };
        let painted = painter.paint(&Annotation {
            label: "Starts in 5 minutes".to_string(),
            color: ORANGE,
            blink: true,
        });
        assert!(painted.starts_with("\x1b[5;38;2;246;204;93m"));
        assert_eq!(strip_ansi(&painted), "Starts in 5 minutes");
    }

    #[test]
    fn writes_table_and_empty_state() {
        let painter = Painter::plain();
        let mut buf = Vec::new();
        painter
            .write_cards(&mut buf, &RenderPass::default())
            .expect("write empty");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "No events found for this campus.\n"
        );

        let card = Card {
            title: "Pizza Night".to_string(),
            full_title: "Pizza Night".to_string(),
            location: "North Campus, Hall B 101".to_string(),
            description: "Slices".to_string(),
            full_description: "Slices".to_string(),
            free_food: "Pizza".to_string(),
            status: None,
            annotation: None,
        };
        let pass = RenderPass {
            cards: vec![card],
            ..RenderPass::default()
        };
        let mut buf = Vec::new();
        painter.write_cards(&mut buf, &pass).expect("write cards");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Status Event"));
        assert!(lines[2].starts_with("-      Pizza Night"));
    }
}
