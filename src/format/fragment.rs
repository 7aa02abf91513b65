use crate::data::EntityId;

/// Where a link leads: a detail view and the id to open it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    /// Detail view key.
    pub detail_view: String,
    /// Entity id.
    pub id: EntityId,
}

impl LinkTarget {
    /// Build a target, rejecting an empty view key.
    pub fn new(detail_view: &str, id: EntityId) -> Option<Self> {
        (!detail_view.is_empty()).then(|| Self {
            detail_view: detail_view.to_string(),
            id,
        })
    }
}

/// A styled piece of formatted output.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Plain text.
    Text(String),
    /// Italic text.
    Italic(String),
    /// Monospace code.
    Code(String),
    /// De-emphasised text.
    Muted(String),
    /// Text carrying a manifest style class.
    Flagged {
        /// Text.
        text: String,
        /// Style class name.
        class: String,
    },
    /// Pill-style badge.
    Badge(String),
    /// Colour swatch followed by the colour code.
    ColorChip(String),
    /// Clickable link to a detail view.
    Link {
        /// Link text.
        label: String,
        /// Target.
        target: LinkTarget,
    },
    /// Path separator between hierarchy levels.
    Arrow,
}

impl Fragment {
    /// Text of this fragment without styling.
    pub fn plain(&self) -> &str {
        match self {
            Self::Text(s)
            | Self::Italic(s)
            | Self::Code(s)
            | Self::Muted(s)
            | Self::Badge(s)
            | Self::ColorChip(s) => s,
            Self::Flagged { text, .. } => text,
            Self::Link { label, .. } => label,
            Self::Arrow => " → ",
        }
    }
}

/// A formatted value: a run of fragments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattedValue(pub Vec<Fragment>);

impl FormattedValue {
    /// Placeholder shown for missing values.
    pub const PLACEHOLDER: &'static str = "-";

    /// The `-` placeholder.
    pub fn placeholder() -> Self {
        Self::text(Self::PLACEHOLDER)
    }

    /// A single plain text fragment.
    pub fn text(s: impl Into<String>) -> Self {
        Self(vec![Fragment::Text(s.into())])
    }

    /// A single fragment.
    pub fn one(fragment: Fragment) -> Self {
        Self(vec![fragment])
    }

    /// Nothing at all (empty table cell).
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// True when there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|f| f.plain().is_empty())
    }

    /// Append a fragment.
    pub fn push(&mut self, fragment: Fragment) {
        self.0.push(fragment);
    }

    /// All fragments concatenated without styling.
    pub fn plain_text(&self) -> String {
        self.0.iter().map(Fragment::plain).collect()
    }

    /// Link targets in display order.
    pub fn links(&self) -> impl Iterator<Item = &LinkTarget> {
        self.0.iter().filter_map(|f| match f {
            Fragment::Link { target, .. } => Some(target),
            _ => None,
        })
    }
}
