use std::io::{self, IsTerminal, Write};

use chrono::Datelike;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::calendar::{MonthView, WeekView};
use crate::config::Config;
use crate::datetime::to_datetime_local;
use crate::event::CalendarEvent;

const CELL_WIDTH: usize = 14;
const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.color()?;
        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all)]
    pub fn print_month(&self, view: &MonthView<'_>) -> anyhow::Result<()> {
        self.write_month(io::stdout().lock(), view)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_week(&self, view: &WeekView<'_>) -> anyhow::Result<()> {
        self.write_week(io::stdout().lock(), view)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_events(&self, events: &[CalendarEvent]) -> anyhow::Result<()> {
        self.write_events(io::stdout().lock(), events)
    }

    /// Six rows of seven cells: day number, up to three titles and the
    /// overflow count.
    pub fn write_month<W: Write>(&self, mut out: W, view: &MonthView<'_>) -> anyhow::Result<()> {
        writeln!(out, "{}", view.title)?;
        let header = WEEKDAY_LABELS
            .iter()
            .map(|label| pad(label, CELL_WIDTH))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{}", header.trim_end())?;

        for week in view.cells.chunks(7) {
            let lines_per_row = 1 + crate::grid::MONTH_CELL_VISIBLE_EVENTS + 1;
            let mut lines = vec![Vec::with_capacity(7); lines_per_row];

            for cell in week {
                let mut day = format!("{:>2}", cell.date.day());
                if cell.is_today {
                    day = format!("[{}]", day.trim());
                }
                let day = if cell.is_other_month {
                    self.paint(&pad(&day, CELL_WIDTH), "2")
                } else {
                    pad(&day, CELL_WIDTH)
                };
                lines[0].push(day);

                for slot in 0..crate::grid::MONTH_CELL_VISIBLE_EVENTS {
                    let text = cell
                        .visible_events()
                        .get(slot)
                        .map(|event| truncate_to_width(&event.title, CELL_WIDTH))
                        .unwrap_or_default();
                    lines[slot + 1].push(pad(&text, CELL_WIDTH));
                }

                let more = if cell.overflow() > 0 {
                    format!("+{} more", cell.overflow())
                } else {
                    String::new()
                };
                lines[lines_per_row - 1].push(pad(&more, CELL_WIDTH));
            }

            for line in lines {
                let joined = line.join(" ");
                if !strip_ansi(&joined).trim().is_empty() {
                    writeln!(out, "{}", joined.trim_end())?;
                }
            }
            writeln!(out)?;
        }

        Ok(())
    }

    pub fn write_week<W: Write>(&self, mut out: W, view: &WeekView<'_>) -> anyhow::Result<()> {
        writeln!(out, "{} (column height {}px)", view.title, view.total_height)?;

        let headers = vec![
            "Day".to_string(),
            "Time".to_string(),
            "Title".to_string(),
            "Top".to_string(),
            "Height".to_string(),
            "Left".to_string(),
        ];
        let mut rows = Vec::new();

        for column in &view.columns {
            let day = column.date.format("%a %m-%d").to_string();
            if column.events.is_empty() {
                rows.push(vec![self.paint(&day, "2"), String::new(), String::new(), String::new(), String::new(), String::new()]);
                continue;
            }
            for placed in &column.events {
                rows.push(vec![
                    day.clone(),
                    format!(
                        "{}-{}",
                        placed.event.start.format("%H:%M"),
                        placed.event.end.format("%H:%M")
                    ),
                    placed.event.title.clone(),
                    format!("{:.0}", placed.geometry.top),
                    format!("{:.0}", placed.geometry.height),
                    format!("{:.0}%", placed.left_percent),
                ]);
            }
        }

        write_table(&mut out, headers, rows)
    }

    pub fn write_events<W: Write>(&self, mut out: W, events: &[CalendarEvent]) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Start".to_string(),
            "End".to_string(),
            "Title".to_string(),
            "Color".to_string(),
            "Category".to_string(),
        ];
        let rows = events
            .iter()
            .map(|event| {
                vec![
                    self.paint(&event.id, "33"),
                    to_datetime_local(&event.start),
                    to_datetime_local(&event.end),
                    event.title.clone(),
                    event.color.clone(),
                    event.category.clone().unwrap_or_default(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn pad(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(strip_ansi(text).as_str());
    format!("{text}{}", " ".repeat(width.saturating_sub(visible)))
}

fn truncate_to_width(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
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

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            write!(writer, "{} ", pad(cell, widths[idx]))?;
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
    use chrono::NaiveDate;

    use super::*;
    use crate::calendar::{Calendar, CalendarOptions};
    use crate::storage::MemoryStore;

    fn calendar_with(titles: &[&str]) -> Calendar<MemoryStore> {
        let day = NaiveDate::from_ymd_opt(2024, 3, 12).expect("date");
        let mut calendar = Calendar::open(
            MemoryStore::new(),
            CalendarOptions {
                initial_date: Some(day),
                ..CalendarOptions::default()
            },
        );
        for (i, title) in titles.iter().enumerate() {
            let start = day.and_hms_opt(8 + i as u32, 0, 0).expect("time");
            calendar.save(CalendarEvent::new(*title, start, start + chrono::Duration::hours(1)));
        }
        calendar
    }

    #[test]
    fn month_output_shows_overflow() {
        let calendar = calendar_with(&["a", "b", "c", "d", "e"]);
        let mut out = Vec::new();
        Renderer::plain()
            .write_month(&mut out, &calendar.month_view())
            .expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("March 2024"));
        assert!(text.contains("+2 more"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn week_output_lists_geometry() {
        let calendar = calendar_with(&["standup"]);
        let mut out = Vec::new();
        Renderer::plain()
            .write_week(&mut out, &calendar.week_view())
            .expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("standup"));
        assert!(text.contains("384"));
        assert!(text.contains("6%"));
    }

    #[test]
    fn color_setting_goes_through_config() {
        let mut cfg = Config::default();
        cfg.apply_overrides([("color".to_string(), "n".to_string())]);
        assert!(!Renderer::new(&cfg).expect("renderer").color);

        cfg.apply_overrides([("color".to_string(), "sometimes".to_string())]);
        assert!(Renderer::new(&cfg).is_err());
    }

    #[test]
    fn long_titles_are_cut_to_cell_width() {
        let cut = truncate_to_width("a very long meeting title", 10);
        assert_eq!(UnicodeWidthStr::width(cut.as_str()), 10);
        assert!(cut.ends_with('…'));
    }
}
