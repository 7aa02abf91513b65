//! Detail view sections and field definitions.

use super::view::ClickTarget;
use serde::Deserialize;

/// How a field value is formatted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum FieldFormat {
    /// Value shown as-is.
    #[default]
    Plain,
    /// Italic text.
    Italic,
    /// Yes/No style label.
    Boolean,
    /// Link to another detail view.
    Link,
    /// Colour swatch plus the colour code.
    ColorChip,
    /// Monospace code.
    Code,
    /// Arrow-separated classification path.
    Hierarchy,
    /// Temporal code with linked mapped intervals.
    TemporalRange,
    /// Value produced by a named compute function.
    Computed,
    /// Any format this viewer does not know; rendered as plain text.
    Unknown(String),
}

impl From<String> for FieldFormat {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "" | "text" | "plain" => Self::Plain,
            "italic" => Self::Italic,
            "boolean" => Self::Boolean,
            "link" => Self::Link,
            "color_chip" => Self::ColorChip,
            "code" => Self::Code,
            "hierarchy" => Self::Hierarchy,
            "temporal_range" => Self::TemporalRange,
            "computed" => Self::Computed,
            _ => Self::Unknown(tag),
        }
    }
}

/// Named compute functions for `computed` fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ComputeFn {
    /// `"{start_mya} — {end_mya} Ma"`.
    TimeRange,
    /// Unknown function; always yields nothing.
    Unknown(String),
}

impl From<String> for ComputeFn {
    fn from(name: String) -> Self {
        match name.as_str() {
            "time_range" => Self::TimeRange,
            _ => Self::Unknown(name),
        }
    }
}

/// Link from a field to another detail view.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinkDef {
    /// Target detail view key.
    pub detail_view: String,
    /// Dotted path to the target id within the record.
    pub id_path: Option<String>,
    /// Key of the target id (within the record, or the row for table columns).
    pub id_key: Option<String>,
}

impl LinkDef {
    /// The path used to look up the linked id.
    pub fn id_lookup(&self) -> Option<&str> {
        self.id_path.as_deref().or(self.id_key.as_deref())
    }
}

/// One field in a field grid, or one column in a linked table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldDef {
    /// Dotted data path of the value.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Formatting rule.
    pub format: FieldFormat,
    /// Compute function for `computed` fields.
    pub compute: Option<ComputeFn>,
    /// Field is only shown when this path is truthy.
    pub condition: Option<String>,
    /// Path of a value appended after the formatted value.
    pub suffix_key: Option<String>,
    /// Template for the suffix; `{value}` is replaced.
    pub suffix_format: Option<String>,
    /// Link target.
    pub link: Option<LinkDef>,
    /// Data path for `hierarchy` fields (defaults to `key`).
    pub data_key: Option<String>,
    /// Data path of the mapping list for `temporal_range` fields.
    pub mapping_key: Option<String>,
    /// Italic cell in linked tables.
    pub italic: bool,
    /// Label for true booleans.
    pub true_label: Option<String>,
    /// Label for false or missing booleans.
    pub false_label: Option<String>,
    /// Style class applied to false booleans.
    pub false_class: Option<String>,
}

impl FieldDef {
    /// Label for a true boolean.
    pub fn true_label(&self) -> &str {
        self.true_label.as_deref().unwrap_or("Yes")
    }

    /// Label for a false boolean.
    pub fn false_label(&self) -> &str {
        self.false_label.as_deref().unwrap_or("No")
    }
}

/// A table of rows embedded in the detail record.
#[derive(Debug, Clone, Default)]
pub struct LinkedTableDef {
    /// Key of the row array within the record.
    pub data_key: String,
    /// Columns.
    pub columns: Vec<FieldDef>,
    /// Click target for whole rows.
    pub on_row_click: Option<ClickTarget>,
    /// Render the section even when there are no rows.
    pub show_empty: bool,
    /// Message for an empty table.
    pub empty_message: Option<String>,
}

/// Badge + text list.
#[derive(Debug, Clone, Default)]
pub struct TaggedListDef {
    /// Key of the item array within the record.
    pub data_key: String,
    /// Item key shown as a badge.
    pub badge_key: String,
    /// Item key shown as text.
    pub text_key: String,
    /// Show the badge as code instead of a pill.
    pub badge_code: bool,
}

/// Where an annotations section gets its entity type from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationTarget {
    /// Fixed entity type.
    Fixed(String),
    /// Entity type read (lower-cased) from this record key.
    FromField(String),
    /// Nothing configured; the section renders nothing.
    Missing,
}

/// Section body, dispatched on the manifest `type` tag.
#[derive(Debug, Clone)]
pub enum SectionKind {
    /// Label/value grid.
    FieldGrid {
        /// Fields in display order.
        fields: Vec<FieldDef>,
    },
    /// Table of embedded rows.
    LinkedTable(LinkedTableDef),
    /// Badge list.
    TaggedList(TaggedListDef),
    /// Preformatted or paragraph text.
    RawText {
        /// Key of the text within the record.
        data_key: String,
        /// Render as a flowing paragraph instead of a monospace block.
        paragraph: bool,
    },
    /// User notes attached to the record.
    Annotations(AnnotationTarget),
    /// Unrecognised tag. Rendered as a linked table when it names a data key.
    Other {
        /// The unrecognised tag.
        tag: String,
        /// Linked-table interpretation, when a data key is present.
        fallback: Option<LinkedTableDef>,
    },
}

/// One section of a detail view.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawSection")]
pub struct SectionDef {
    /// Section heading; `{count}` is replaced in linked tables.
    pub title: Option<String>,
    /// Section is only rendered when this path is truthy.
    pub condition: Option<String>,
    /// Body.
    pub kind: SectionKind,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSection {
    #[serde(rename = "type")]
    tag: String,
    title: Option<String>,
    condition: Option<String>,
    fields: Vec<FieldDef>,
    data_key: Option<String>,
    columns: Vec<FieldDef>,
    on_row_click: Option<ClickTarget>,
    show_empty: bool,
    empty_message: Option<String>,
    badge_key: Option<String>,
    text_key: Option<String>,
    badge_format: Option<String>,
    format: Option<String>,
    entity_type: Option<String>,
    entity_type_from: Option<String>,
}

impl RawSection {
    fn linked_table(&mut self, data_key: String) -> LinkedTableDef {
        LinkedTableDef {
            data_key,
            columns: std::mem::take(&mut self.columns),
            on_row_click: self.on_row_click.take(),
            show_empty: self.show_empty,
            empty_message: self.empty_message.take(),
        }
    }
}

impl From<RawSection> for SectionDef {
    fn from(mut raw: RawSection) -> Self {
        let data_key = raw.data_key.take().unwrap_or_default();
        let tag = std::mem::take(&mut raw.tag);
        let kind = match tag.as_str() {
            "field_grid" => SectionKind::FieldGrid {
                fields: std::mem::take(&mut raw.fields),
            },
            "linked_table" => SectionKind::LinkedTable(raw.linked_table(data_key)),
            "tagged_list" => SectionKind::TaggedList(TaggedListDef {
                data_key,
                badge_key: raw.badge_key.take().unwrap_or_default(),
                text_key: raw.text_key.take().unwrap_or_default(),
                badge_code: raw.badge_format.as_deref() == Some("code"),
            }),
            "raw_text" => SectionKind::RawText {
                data_key,
                paragraph: raw.format.as_deref() == Some("paragraph"),
            },
            "annotations" => SectionKind::Annotations(
                match (raw.entity_type.take(), raw.entity_type_from.take()) {
                    (Some(fixed), _) if !fixed.is_empty() => AnnotationTarget::Fixed(fixed),
                    (_, Some(field)) if !field.is_empty() => AnnotationTarget::FromField(field),
                    _ => AnnotationTarget::Missing,
                },
            ),
            _ => {
                let fallback = if data_key.is_empty() {
                    None
                } else {
                    Some(raw.linked_table(data_key))
                };
                SectionKind::Other {
                    tag: tag.clone(),
                    fallback,
                }
            },
        };

        Self {
            title: raw.title,
            condition: raw.condition,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_formats_fall_back() {
        let field: FieldDef =
            serde_json::from_value(json!({"key": "x", "format": "sparkline"})).unwrap();
        assert_eq!(field.format, FieldFormat::Unknown("sparkline".into()));

        let field: FieldDef = serde_json::from_value(json!({"key": "x"})).unwrap();
        assert_eq!(field.format, FieldFormat::Plain);
    }

    #[test]
    fn sections_dispatch_on_type() {
        let section: SectionDef = serde_json::from_value(json!({
            "type": "tagged_list",
            "title": "Mapped Temporal Codes",
            "data_key": "mappings",
            "badge_key": "temporal_code",
            "badge_format": "code",
            "text_key": "mapping_type"
        }))
        .unwrap();
        match section.kind {
            SectionKind::TaggedList(def) => {
                assert_eq!(def.data_key, "mappings");
                assert!(def.badge_code);
            },
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn unknown_section_with_data_key_keeps_table_fallback() {
        let section: SectionDef = serde_json::from_value(json!({
            "type": "synonym_list",
            "data_key": "synonyms",
            "columns": [{"key": "name", "label": "Name"}]
        }))
        .unwrap();
        match section.kind {
            SectionKind::Other { tag, fallback } => {
                assert_eq!(tag, "synonym_list");
                assert_eq!(fallback.map(|f| f.columns.len()), Some(1));
            },
            other => panic!("unexpected kind {other:?}"),
        }

        let bare: SectionDef =
            serde_json::from_value(json!({"type": "genus_geography"})).unwrap();
        assert!(matches!(bare.kind, SectionKind::Other { fallback: None, .. }));
    }

    #[test]
    fn annotation_target_prefers_fixed_type() {
        let section: SectionDef = serde_json::from_value(json!({
            "type": "annotations",
            "entity_type_from": "rank"
        }))
        .unwrap();
        assert!(matches!(
            section.kind,
            SectionKind::Annotations(AnnotationTarget::FromField(ref f)) if f == "rank"
        ));
    }
}
