//! Search dropdown.

use super::fragments::cursor_style;
use super::ThemeColors;
use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Draw the search box and its results below `anchor`.
pub(super) fn draw_search(f: &mut Frame<'_>, app: &App, anchor: Rect, colors: &ThemeColors) {
    if !app.search.is_active() {
        return;
    }
    let muted = Style::default().fg(colors.muted);
    let mut lines = vec![Line::from(vec![
        Span::styled("Search: ", Style::default().fg(colors.heading)),
        Span::raw(format!("{}_", app.search.buffer())),
    ])];

    if app.search.is_building() {
        lines.push(Line::from(Span::styled("Building search index...", muted)));
    }

    if let Some(results) = app.search.results() {
        if results.is_empty() {
            lines.push(Line::from(Span::styled("No results found", muted)));
        }
        let meta_max = app.session.config().search.meta_truncate;
        for group in &results.groups {
            lines.push(Line::from(Span::styled(
                format!("{} ({})", group.category.label, group.total),
                Style::default().fg(colors.label).add_modifier(Modifier::BOLD),
            )));
            for &entry in &group.shown {
                let selected = results.highlight() == Some(entry);
                let base = if selected {
                    cursor_style(colors)
                } else if group.category.display_italic {
                    Style::default().fg(colors.text).add_modifier(Modifier::ITALIC)
                } else {
                    Style::default().fg(colors.text)
                };
                let mut spans = vec![Span::raw("  ")];
                for (piece, matched) in results.highlight_spans(&results.display_text(entry)) {
                    let style = if matched && !selected {
                        base.fg(colors.matched).add_modifier(Modifier::BOLD)
                    } else {
                        base
                    };
                    spans.push(Span::styled(piece, style));
                }
                let meta = results.meta_text(entry, meta_max);
                if !meta.is_empty() {
                    spans.push(Span::styled(format!("  {meta}"), muted));
                }
                lines.push(Line::from(spans));
            }
            if group.more() > 0 {
                lines.push(Line::from(Span::styled(
                    format!("  +{} more (Tab)", group.more()),
                    Style::default().fg(colors.link),
                )));
            }
        }
    }

    let screen = f.area();
    let height = (lines.len() as u16 + 2).min(screen.height.saturating_sub(anchor.y));
    let width = anchor.width.min(80);
    let area = Rect::new(anchor.x, anchor.y, width, height);
    f.render_widget(Clear, area);
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" Search ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.heading))
            .style(Style::default().bg(colors.bg)),
    );
    f.render_widget(paragraph, area);
}
