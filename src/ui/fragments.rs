//! Styling of formatted values.

use super::theme::parse_hex;
use super::ThemeColors;
use crate::format::{Fragment, FormattedValue};
use ratatui::{
    style::{Modifier, Style},
    text::Span,
};

/// Counts links as they are drawn so the selected one can be marked.
#[derive(Debug, Default)]
pub(super) struct LinkCursor {
    next: usize,
    selected: Option<usize>,
    hit: bool,
}

impl LinkCursor {
    pub(super) fn new(selected: Option<usize>) -> Self {
        Self {
            next: 0,
            selected,
            hit: false,
        }
    }

    /// True once the selected slot has been drawn.
    pub(super) fn was_hit(&self) -> bool {
        self.hit
    }

    /// Claim the next link slot; true when it is the selected one.
    pub(super) fn take(&mut self) -> bool {
        let hit = self.selected == Some(self.next);
        self.next += 1;
        self.hit |= hit;
        hit
    }
}

pub(super) fn cursor_style(colors: &ThemeColors) -> Style {
    Style::default()
        .fg(colors.cursor_fg)
        .bg(colors.cursor_bg)
        .add_modifier(Modifier::BOLD)
}

/// Spans of a formatted value on top of `base`.
pub(super) fn value_spans(
    value: &FormattedValue,
    base: Style,
    colors: &ThemeColors,
    links: &mut LinkCursor,
) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for fragment in &value.0 {
        match fragment {
            Fragment::Text(text) => spans.push(Span::styled(text.clone(), base)),
            Fragment::Italic(text) => {
                spans.push(Span::styled(text.clone(), base.add_modifier(Modifier::ITALIC)))
            },
            Fragment::Code(text) => spans.push(Span::styled(text.clone(), base.fg(colors.value))),
            Fragment::Muted(text) => spans.push(Span::styled(text.clone(), base.fg(colors.muted))),
            Fragment::Flagged { text, .. } => {
                spans.push(Span::styled(text.clone(), base.fg(colors.warning)))
            },
            Fragment::Badge(text) => spans.push(Span::styled(
                format!(" {text} "),
                base.bg(colors.badge).add_modifier(Modifier::BOLD),
            )),
            Fragment::ColorChip(code) => {
                let chip = parse_hex(code).map_or(base, |c| base.fg(c));
                spans.push(Span::styled("■ ", chip));
                spans.push(Span::styled(code.clone(), base.fg(colors.muted)));
            },
            Fragment::Link { label, .. } => {
                let style = if links.take() {
                    cursor_style(colors)
                } else {
                    base.fg(colors.link).add_modifier(Modifier::UNDERLINED)
                };
                spans.push(Span::styled(label.clone(), style));
            },
            Fragment::Arrow => spans.push(Span::styled(" → ", base.fg(colors.muted))),
        }
    }
    spans
}
