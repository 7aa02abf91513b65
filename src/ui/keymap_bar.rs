//! Keymap help bar UI component.

use crate::app::{App, Focus, InputMode};
use crate::session::ViewContent;
use crate::ui::ThemeColors;
use ratatui::{layout::Rect, style::Style, widgets::Paragraph, Frame};

/// Draw the keymap help bar.
pub(super) fn draw_keymap(f: &mut Frame<'_>, area: Rect, app: &App, colors: &ThemeColors) {
    let keymap_text = if app.search.is_active() {
        "↑↓:select | Enter:open | Tab:more | Esc:close | Type to search"
    } else if matches!(app.input, InputMode::Filter) {
        "Enter/Esc:done | Type to filter"
    } else if app.session.detail().is_open() {
        "jk/Tab:select | Enter:open | a:note | x:delete | c:copy | Esc:close"
    } else {
        match app.session.view().content() {
            Some(ViewContent::Tree(_)) if app.focus == Focus::Items => {
                "jk:nav | Enter:open | v:valid only | h/Esc:back | /:search | q:quit"
            },
            Some(ViewContent::Tree(_)) => {
                "jk:nav | hl:fold | Enter:select | i:info | E/C:all | /:search | Tab:view | c:copy | q:quit"
            },
            Some(ViewContent::Table(_)) => {
                "jk:nav | Enter:open | hl:column | s:sort | f:filter | /:search | Tab:view | c:copy | q:quit"
            },
            Some(ViewContent::Chart(_)) => {
                "hjkl:move | Enter:open | /:search | Tab:view | c:copy | T:theme | q:quit"
            },
            _ => "Tab:view | /:search | T:theme | q:quit",
        }
    };

    let paragraph =
        Paragraph::new(keymap_text).style(Style::default().fg(colors.text).bg(colors.bg));

    f.render_widget(paragraph, area);
}
