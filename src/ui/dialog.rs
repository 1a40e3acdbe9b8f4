use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

/// A rect `percent_x` wide and `height` rows tall, centered in `area`.
pub fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let scaled = u32::from(area.width) * u32::from(percent_x.min(100)) / 100;
    let width = u16::try_from(scaled).unwrap_or(area.width).max(1).min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_modal(title: &str, lines: Vec<Line>, color: Color, area: Rect, buf: &mut Buffer) {
    let rect = centered_rect(60, 7, area);
    Clear.render(rect, buf);
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(title),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(rect, buf);
}

pub fn render_alert(message: &str, area: Rect, buf: &mut Buffer) {
    render_modal(
        " Not yet ",
        vec![
            Line::from(Span::raw(message.to_string())),
            Line::from(""),
            Line::from(Span::styled(
                "press any key",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ],
        Color::Yellow,
        area,
        buf,
    );
}

pub fn render_confirm(prompt: &str, area: Rect, buf: &mut Buffer) {
    render_modal(
        " Clear progress ",
        vec![
            Line::from(Span::raw(prompt.to_string())),
            Line::from(""),
            Line::from(Span::styled(
                "(y) clear / any other key cancels",
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ],
        Color::Red,
        area,
        buf,
    );
}
