//! Status bar UI component.

use crate::app::{App, InputMode};
use crate::search::IndexState;
use crate::session::ViewContent;
use crate::ui::ThemeColors;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::Paragraph,
    Frame,
};

/// Draw the status bar: message on the left, view and index state on the right.
pub(super) fn draw_status(f: &mut Frame<'_>, area: Rect, app: &App, colors: &ThemeColors) {
    let text = match &app.input {
        InputMode::Filter => match app.session.view().content() {
            Some(ViewContent::Table(table)) => format!("filter: {}", table.filter()),
            _ => app.status.clone(),
        },
        InputMode::Note(draft) => format!("new {}: {}", draft.annotation_type, draft.content),
        InputMode::Normal => app.status.clone(),
    };

    let index = match app.session.index_state() {
        IndexState::Empty => "",
        IndexState::Building => "indexing… ",
        IndexState::Ready(_) => "",
    };
    let right = format!(
        "{}{} ",
        index,
        app.session.view().key().unwrap_or("no view")
    );

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right.chars().count() as u16)])
        .split(area);

    let style = Style::default().fg(colors.status_fg).bg(colors.status_bg);
    f.render_widget(Paragraph::new(text).style(style), chunks[0]);
    f.render_widget(Paragraph::new(right).style(style), chunks[1]);
}
