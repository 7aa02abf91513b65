//! Clipboard integration.

use crate::error::Result;
use crate::plain;
use crate::session::Session;
use arboard::Clipboard;

/// Copy text to clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new()?;
    clipboard.set_text(text)?;
    Ok(())
}

/// Copy the open detail, or the active view when no detail is open.
/// Returns a status line describing what was copied.
pub fn copy_current(session: &Session) -> Result<String> {
    let Some((what, text)) = plain::session_text(session) else {
        return Ok("Nothing to copy".to_string());
    };
    copy_to_clipboard(&text)?;
    Ok(format!("{what} copied!"))
}
