use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};

use practic::{history::AttemptRecord, store::KeyValueStore, timer::format_elapsed};

use crate::App;

/// Pure presenter for a single attempt row.
pub fn present_row(record: &AttemptRecord) -> Row<'static> {
    let (status, status_color) = if record.was_completed {
        ("done", Color::Green)
    } else {
        ("abandoned", Color::Yellow)
    };

    Row::new(vec![
        Cell::from(format!("#{}", record.variant_number)),
        Cell::from(status).style(Style::default().fg(status_color)),
        Cell::from(format_elapsed(record.duration_seconds)),
        Cell::from(record.timestamp.format("%Y-%m-%d %H:%M").to_string()),
    ])
}

pub fn render_history<S: KeyValueStore + Clone>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let history = app.task.session().history();
    let title = format!(
        " Attempts: {} ({}) ",
        app.task.definition().title,
        history.len()
    );

    if history.is_empty() {
        Paragraph::new("No attempts yet. Reset a running attempt to file it here.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true })
            .render(chunks[0], buf);
    } else {
        let selected = app.selected_record();
        let rows = history.iter().enumerate().rev().map(|(index, record)| {
            let row = present_row(record);
            if Some(index) == selected {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        });

        let header = Row::new(vec!["Variant", "Status", "Time", "When (UTC)"]).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

        Table::new(
            rows,
            [
                Constraint::Length(8),
                Constraint::Length(10),
                Constraint::Length(9),
                Constraint::Min(16),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .render(chunks[0], buf);
    }

    Paragraph::new(Span::styled(
        "(↑/↓) move / (enter) view solution / (tab) back",
        Style::default().add_modifier(Modifier::DIM),
    ))
    .render(chunks[1], buf);
}

pub fn render_viewer<S: KeyValueStore + Clone>(
    app: &App<S>,
    index: usize,
    area: Rect,
    buf: &mut Buffer,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let Some(view) = app.task.view_attempt(index) else {
        Paragraph::new("That attempt no longer exists.").render(chunks[0], buf);
        return;
    };

    Paragraph::new(view.solution.to_string())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Variant {} solution ", view.variant_number)),
        )
        .wrap(Wrap { trim: false })
        .render(chunks[0], buf);

    Paragraph::new(Line::from(Span::styled(
        "(esc) back to attempts",
        Style::default().add_modifier(Modifier::DIM),
    )))
    .render(chunks[1], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(completed: bool) -> AttemptRecord {
        AttemptRecord {
            variant_number: 2,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 9, 5, 0).unwrap(),
            was_completed: completed,
            duration_seconds: 75,
            solution_snapshot: "x := 1".to_string(),
        }
    }

    #[test]
    fn present_row_renders_all_columns() {
        let area = Rect::new(0, 0, 60, 3);
        let mut buf = Buffer::empty(area);

        Table::new(
            [present_row(&record(true)), present_row(&record(false))],
            [
                Constraint::Length(8),
                Constraint::Length(10),
                Constraint::Length(9),
                Constraint::Min(16),
            ],
        )
        .render(area, &mut buf);

        let rendered: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(rendered.contains("#2"));
        assert!(rendered.contains("done"));
        assert!(rendered.contains("abandoned"));
        assert!(rendered.contains("1:15"));
        assert!(rendered.contains("2025-03-01 09:05"));
    }
}
