pub mod dialog;
pub mod history;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use practic::{store::KeyValueStore, task::PracticeTask, TaskPhase};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

impl<S: KeyValueStore + Clone> Widget for &App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let task = &self.task;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let inner_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let variant_lines =
            wrapped_lines(variant_text(task), inner_width.saturating_sub(2)).saturating_add(2);
        let sandbox_lines = if task.sandbox().is_some() { 4 } else { 0 };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(variant_lines),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(sandbox_lines),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        // header
        let definition = task.definition();
        let mut title = vec![
            Span::styled(definition.title.clone(), bold_style.fg(Color::Cyan)),
            Span::styled(
                format!("  [{}/{}]", self.current + 1, self.catalog.len()),
                dim_style,
            ),
        ];
        if let Some(estimate) = &definition.estimated_time {
            title.push(Span::styled(format!("  ~{estimate}"), dim_style));
        }
        Paragraph::new(vec![
            Line::from(title),
            Line::from(Span::styled(definition.description.clone(), dim_style)),
        ])
        .render(chunks[0], buf);

        Paragraph::new(selector_line(task)).render(chunks[1], buf);

        // variant
        let variant_style = if task.selector().is_spinning() {
            dim_style
        } else {
            Style::default()
        };
        let variant_title = match task.session().selected_variant() {
            Some(index) => format!(" Variant {} ", index + 1),
            None => " Variant ".to_string(),
        };
        Paragraph::new(Span::styled(variant_text(task).to_string(), variant_style))
            .block(Block::default().borders(Borders::ALL).title(variant_title))
            .wrap(Wrap { trim: false })
            .render(chunks[2], buf);

        // timer
        let timer_style = match task.phase() {
            TaskPhase::Completed => bold_style.fg(Color::Green),
            TaskPhase::Active => bold_style,
            TaskPhase::Idle => dim_style,
        };
        let mut timer = vec![
            Span::raw("⏱ "),
            Span::styled(task.timer().formatted(), timer_style),
        ];
        if task.phase() == TaskPhase::Completed {
            timer.push(Span::styled("  completed", Style::default().fg(Color::Green)));
        }
        Paragraph::new(Line::from(timer)).render(chunks[3], buf);

        // solution editor
        let (editor_title, border_style) = match task.phase() {
            TaskPhase::Idle => (" Solution ", dim_style),
            TaskPhase::Active => (" Solution ", Style::default().fg(Color::Yellow)),
            TaskPhase::Completed => (" Solution (read-only) ", Style::default().fg(Color::Green)),
        };
        let mut editor_text = task.session().solution().to_string();
        if task.phase() == TaskPhase::Active {
            editor_text.push('▏');
        }
        Paragraph::new(editor_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(editor_title),
            )
            .wrap(Wrap { trim: false })
            .render(chunks[4], buf);

        if let Some(embed) = task.sandbox() {
            Paragraph::new(vec![
                Line::from(Span::styled(embed.heading(), bold_style)),
                Line::from(Span::styled(embed.url().to_string(), Style::default().fg(Color::Blue))),
                Line::from(Span::styled(
                    embed.notice(),
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
            ])
            .render(chunks[5], buf);
        }

        if let Some(status) = &self.status {
            Paragraph::new(Span::styled(status.clone(), Style::default().fg(Color::Magenta)))
                .render(chunks[6], buf);
        }

        Paragraph::new(Span::styled(help_text(task.phase()), dim_style))
            .alignment(Alignment::Center)
            .render(chunks[7], buf);
    }
}

fn variant_text<S: KeyValueStore>(task: &PracticeTask<S>) -> &str {
    if let Some(text) = task.current_variant() {
        return text;
    }
    task.selector()
        .highlighted()
        .and_then(|i| task.definition().variants.get(i))
        .map(String::as_str)
        .unwrap_or("Press Enter to draw a random variant.")
}

fn selector_line<S: KeyValueStore>(task: &PracticeTask<S>) -> Line<'static> {
    let selector = task.selector();
    let shown = selector.highlighted();
    let mut spans = vec![Span::raw("Variant: ")];

    for index in 0..selector.variant_count() {
        let label = format!(" {} ", index + 1);
        let style = if Some(index) == shown {
            if selector.is_locked() {
                Style::default().fg(Color::Black).bg(Color::Green)
            } else {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            }
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(label, style));
    }

    if let Some(label) = shown.and_then(|i| selector.difficulty_label(i)) {
        spans.push(Span::styled(
            format!("  {label}"),
            Style::default().add_modifier(Modifier::ITALIC),
        ));
    }
    Line::from(spans)
}

fn help_text(phase: TaskPhase) -> &'static str {
    match phase {
        TaskPhase::Idle => "(enter) draw variant / (tab) history / (^n/^p) tasks / (esc) quit",
        TaskPhase::Active => {
            "(^s) done / (^r) reset / (^o) open editor / (tab) history / (^x) clear / (esc) quit"
        }
        TaskPhase::Completed => "(^r) new attempt / (^o) open editor / (tab) history / (^x) clear / (esc) quit",
    }
}

/// Rough line count for `text` wrapped at `width` columns.
fn wrapped_lines(text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let lines: usize = text
        .lines()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum();
    u16::try_from(lines.max(1)).unwrap_or(u16::MAX)
}
