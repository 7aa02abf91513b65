//! Detail overlay: one record's rendered sections with its notes.

use super::fragments::{cursor_style, value_spans, LinkCursor};
use super::{centered_rect, ThemeColors};
use crate::app::{App, InputMode, NoteDraft};
use crate::format::{FormattedValue, LinkedTable, RenderedSection};
use crate::plain::value_text;
use crate::session::{DetailState, DetailView};
use crate::source::AnnotationList;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Draw the detail overlay when a detail is open.
pub(super) fn draw_detail(f: &mut Frame<'_>, app: &mut App, colors: &ThemeColors) {
    let area = centered_rect(85, 85, f.area());
    f.render_widget(Clear, area);

    let title = match app.session.detail() {
        DetailState::Closed => return,
        DetailState::Loading { view_key, id } => format!(" {view_key} #{id} "),
        DetailState::Shown(detail) => format!(" {} ", detail.rendered.title),
        DetailState::Error(_) => " Details ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.heading))
        .style(Style::default().bg(colors.bg));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let (lines, selected_line) = match app.session.detail() {
        DetailState::Shown(detail) => {
            let draft = match &app.input {
                InputMode::Note(draft) => Some(draft),
                _ => None,
            };
            detail_lines(detail, app.detail_cursor, draft, colors)
        },
        DetailState::Loading { .. } => (vec![Line::from("Loading...")], None),
        DetailState::Error(message) => (
            vec![
                Line::from(Span::styled(
                    message.clone(),
                    Style::default().fg(colors.error).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from("Press Esc to close"),
            ],
            None,
        ),
        DetailState::Closed => return,
    };

    let height = chunks[0].height;
    if let Some(line) = selected_line.and_then(|l| u16::try_from(l).ok()) {
        if line < app.detail_scroll {
            app.detail_scroll = line;
        } else if line >= app.detail_scroll + height {
            app.detail_scroll = line + 1 - height;
        }
    }

    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(colors.text))
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    f.render_widget(paragraph, chunks[0]);

    let help = if matches!(app.input, InputMode::Note(_)) {
        "Enter: save | Tab: type | Esc: cancel"
    } else {
        "Tab/jk: select | Enter: open | a: add note | x: delete note | c: copy | Esc: close"
    };
    f.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(colors.muted))
            .alignment(Alignment::Center),
        chunks[1],
    );
}

/// Lines being laid out, remembering where the selected action landed.
#[derive(Default)]
struct DetailLines {
    lines: Vec<Line<'static>>,
    selected_line: Option<usize>,
}

impl DetailLines {
    fn push(&mut self, line: Line<'static>, links: &LinkCursor) {
        self.lines.push(line);
        if self.selected_line.is_none() && links.was_hit() {
            self.selected_line = Some(self.lines.len() - 1);
        }
    }
}

/// Lines of a shown detail and the line holding the selected action.
fn detail_lines(
    detail: &DetailView,
    selected: usize,
    draft: Option<&NoteDraft>,
    colors: &ThemeColors,
) -> (Vec<Line<'static>>, Option<usize>) {
    let mut out = DetailLines::default();
    let mut links = LinkCursor::new(Some(selected));

    let heading = Style::default().fg(colors.heading).add_modifier(Modifier::BOLD);
    for section in &detail.rendered.sections {
        if !out.lines.is_empty() {
            out.push(Line::from(""), &links);
        }
        if let Some(title) = section.title() {
            out.push(Line::from(Span::styled(title.to_string(), heading)), &links);
        }
        match section {
            RenderedSection::FieldGrid { rows, .. } => {
                let width = rows.iter().map(|r| r.label.width()).max().unwrap_or(0);
                for row in rows {
                    let mut spans = vec![Span::styled(
                        pad_to(&row.label, width),
                        Style::default().fg(colors.label),
                    )];
                    let base = Style::default().fg(colors.value);
                    spans.extend(value_spans(&row.value, base, colors, &mut links));
                    out.push(Line::from(spans), &links);
                }
            },
            RenderedSection::LinkedTable(table) => {
                linked_table_lines(table, colors, &mut links, &mut out);
            },
            RenderedSection::TaggedList { items, code, .. } => {
                let badge = if *code {
                    Style::default().fg(colors.value)
                } else {
                    Style::default().bg(colors.badge).add_modifier(Modifier::BOLD)
                };
                for item in items {
                    let line = Line::from(vec![
                        Span::styled(format!(" {} ", item.badge), badge),
                        Span::raw(format!(" {}", item.text)),
                    ]);
                    out.push(line, &links);
                }
            },
            RenderedSection::RawText {
                text, paragraph, ..
            } => {
                let style = if *paragraph {
                    Style::default().fg(colors.text)
                } else {
                    Style::default().fg(colors.value)
                };
                for line in text.lines() {
                    out.push(Line::from(Span::styled(line.to_string(), style)), &links);
                }
            },
            RenderedSection::Annotations {
                entity_type,
                entity_id,
                ..
            } => {
                let list = detail.annotations(entity_type, entity_id);
                annotation_lines(list, colors, &mut links, &mut out);
                if let Some(draft) = draft
                    .filter(|d| d.entity_type == *entity_type && d.entity_id == *entity_id)
                {
                    let line = Line::from(vec![
                        Span::styled(
                            format!("New {}: ", draft.annotation_type),
                            Style::default().fg(colors.heading),
                        ),
                        Span::raw(format!("{}_", draft.content)),
                    ]);
                    out.push(line, &links);
                }
            },
        }
    }
    (out.lines, out.selected_line)
}

fn linked_table_lines(
    table: &LinkedTable,
    colors: &ThemeColors,
    links: &mut LinkCursor,
    out: &mut DetailLines,
) {
    if table.rows.is_empty() {
        let message = table.empty_message.clone().unwrap_or_default();
        out.push(Line::from(Span::styled(message, Style::default().fg(colors.muted))), links);
        return;
    }

    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.width()).collect();
    for row in &table.rows {
        for (i, cell) in row.cells.iter().enumerate() {
            let w = value_text(cell).width();
            match widths.get_mut(i) {
                Some(width) => *width = (*width).max(w),
                None => widths.push(w),
            }
        }
    }

    let heading = Style::default().fg(colors.label).add_modifier(Modifier::BOLD);
    let mut header = vec![Span::raw("  ")];
    for (i, h) in table.headers.iter().enumerate() {
        header.push(Span::styled(pad_to(h, widths[i]), heading));
    }
    out.push(Line::from(header), links);

    for row in &table.rows {
        let marker = match &row.row_click {
            Some(_) if links.take() => Span::styled("› ", cursor_style(colors)),
            Some(_) => Span::styled("› ", Style::default().fg(colors.link)),
            None => Span::raw("  "),
        };
        let mut spans = vec![marker];
        for (i, cell) in row.cells.iter().enumerate() {
            spans.extend(cell_spans(cell, widths[i], colors, links));
        }
        out.push(Line::from(spans), links);
    }
}

fn cell_spans(
    cell: &FormattedValue,
    width: usize,
    colors: &ThemeColors,
    links: &mut LinkCursor,
) -> Vec<Span<'static>> {
    let mut spans = value_spans(cell, Style::default().fg(colors.text), colors, links);
    let used = value_text(cell).width();
    spans.push(Span::raw(" ".repeat(width.saturating_sub(used) + 2)));
    spans
}

fn pad_to(text: &str, width: usize) -> String {
    format!("{}{}", text, " ".repeat(width.saturating_sub(text.width()) + 2))
}

fn annotation_lines(
    list: Option<&AnnotationList>,
    colors: &ThemeColors,
    links: &mut LinkCursor,
    out: &mut DetailLines,
) {
    let muted = Style::default().fg(colors.muted);
    match list {
        None | Some(AnnotationList::Loading) => {
            out.push(Line::from(Span::styled("Loading...", muted)), links)
        },
        Some(AnnotationList::Failed(message)) => out.push(
            Line::from(Span::styled(message.clone(), Style::default().fg(colors.error))),
            links,
        ),
        Some(AnnotationList::Loaded(items)) if items.is_empty() => {
            out.push(Line::from(Span::styled("No notes yet.", muted)), links)
        },
        Some(AnnotationList::Loaded(items)) => {
            for a in items {
                let badge = if links.take() {
                    cursor_style(colors)
                } else {
                    Style::default().bg(colors.badge).add_modifier(Modifier::BOLD)
                };
                let mut spans = vec![
                    Span::styled(format!(" {} ", a.annotation_type), badge),
                    Span::raw(format!(" {}", a.content)),
                ];
                let by = a.author.as_deref().map(|who| format!(" by {who}")).unwrap_or_default();
                let at = a.created_at.as_deref().map(|t| format!(" ({t})")).unwrap_or_default();
                if !by.is_empty() || !at.is_empty() {
                    spans.push(Span::styled(format!(" ·{by}{at}"), muted));
                }
                out.push(Line::from(spans), links);
            }
        },
    }
}
