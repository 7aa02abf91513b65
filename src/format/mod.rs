//! Field and section formatting for detail views.
//!
//! Formatting never fails: missing keys, wrong types and unknown formats
//! degrade to placeholders or to sections that render nothing. Output is a
//! list of styled [`Fragment`]s that the terminal UI and the plain-text
//! printer both understand.

mod field;
mod fragment;
mod section;

pub use field::{compute_value, format_field_value};
pub use fragment::{Fragment, FormattedValue, LinkTarget};
pub use section::{
    build_detail_title, render_auto_detail, render_detail, render_detail_section, title_case,
    FieldRow, LinkedRow, LinkedTable, RenderedDetail, RenderedSection, TaggedItem,
};
