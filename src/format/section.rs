use super::field::{compute_value, format_field_value};
use super::fragment::{Fragment, FormattedValue, LinkTarget};
use crate::data::{check_condition, display_value, is_truthy, resolve_data_path, EntityId, Row};
use crate::manifest::{
    AnnotationTarget, ClickTarget, DetailDef, FieldDef, FieldFormat, LinkedTableDef, SectionDef,
    SectionKind, TaggedListDef, TitleTemplate,
};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// One label/value line of a field grid.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRow {
    /// Field label.
    pub label: String,
    /// Formatted value, suffix included.
    pub value: FormattedValue,
}

/// One row of a linked table.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedRow {
    /// Target opened when the row itself is activated.
    pub row_click: Option<LinkTarget>,
    /// Cells, one per column.
    pub cells: Vec<FormattedValue>,
}

impl LinkedRow {
    /// What activating the row opens.
    ///
    /// With a column given, a link inside that cell wins and the row target
    /// is not used, so one activation never opens two details.
    pub fn activate(&self, column: Option<usize>) -> Option<&LinkTarget> {
        let cell_link = column
            .and_then(|c| self.cells.get(c))
            .and_then(|cell| cell.links().next());
        cell_link.or(self.row_click.as_ref())
    }
}

/// A rendered linked table.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedTable {
    /// Title with `{count}` substituted.
    pub title: Option<String>,
    /// Column labels.
    pub headers: Vec<String>,
    /// Rows.
    pub rows: Vec<LinkedRow>,
    /// Message shown instead of an empty table.
    pub empty_message: Option<String>,
}

/// One badge line of a tagged list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedItem {
    /// Badge text.
    pub badge: String,
    /// Text beside the badge.
    pub text: String,
}

/// A detail section ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedSection {
    /// Label/value grid.
    FieldGrid {
        /// Heading.
        title: Option<String>,
        /// Visible fields.
        rows: Vec<FieldRow>,
    },
    /// Embedded table.
    LinkedTable(LinkedTable),
    /// Badge list.
    TaggedList {
        /// Heading.
        title: Option<String>,
        /// Items.
        items: Vec<TaggedItem>,
        /// Draw badges as code.
        code: bool,
    },
    /// Block of text.
    RawText {
        /// Heading.
        title: Option<String>,
        /// Text.
        text: String,
        /// Flowing paragraph instead of a monospace block.
        paragraph: bool,
    },
    /// Placeholder for the record's annotations, filled in after load.
    Annotations {
        /// Heading.
        title: Option<String>,
        /// Annotated entity type.
        entity_type: String,
        /// Annotated entity id.
        entity_id: EntityId,
    },
}

impl RenderedSection {
    /// Section heading.
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::FieldGrid { title, .. }
            | Self::TaggedList { title, .. }
            | Self::RawText { title, .. }
            | Self::Annotations { title, .. } => title.as_deref(),
            Self::LinkedTable(table) => table.title.as_deref(),
        }
    }
}

/// A fully rendered detail record.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDetail {
    /// Modal title.
    pub title: String,
    /// Sections that produced output, in manifest order.
    pub sections: Vec<RenderedSection>,
}

impl RenderedDetail {
    /// Annotation targets declared by the rendered sections.
    pub fn annotation_targets(&self) -> impl Iterator<Item = (&str, &EntityId)> {
        self.sections.iter().filter_map(|s| match s {
            RenderedSection::Annotations {
                entity_type,
                entity_id,
                ..
            } => Some((entity_type.as_str(), entity_id)),
            _ => None,
        })
    }
}

/// Render every section of a detail view against a fetched record.
pub fn render_detail(def: &DetailDef, data: &Value) -> RenderedDetail {
    RenderedDetail {
        title: build_detail_title(def.title_template.as_ref(), data),
        sections: def
            .sections
            .iter()
            .filter_map(|section| render_detail_section(section, data))
            .collect(),
    }
}

/// Render one section, or `None` when it has nothing to show.
///
/// A failed condition, a missing data key or an empty list all give `None`;
/// the caller simply draws no container for the section.
pub fn render_detail_section(section: &SectionDef, data: &Value) -> Option<RenderedSection> {
    if !check_condition(data, section.condition.as_deref()) {
        return None;
    }
    let title = section.title.clone().filter(|t| !t.is_empty());

    match &section.kind {
        SectionKind::FieldGrid { fields } => {
            let rows: Vec<FieldRow> = fields
                .iter()
                .filter(|f| check_condition(data, f.condition.as_deref()))
                .map(|f| FieldRow {
                    label: f.label.clone(),
                    value: field_with_suffix(f, data),
                })
                .collect();
            (!rows.is_empty()).then_some(RenderedSection::FieldGrid { title, rows })
        },
        SectionKind::LinkedTable(def) => {
            linked_table(def, title, data).map(RenderedSection::LinkedTable)
        },
        SectionKind::TaggedList(def) => tagged_list(def, title, data),
        SectionKind::RawText {
            data_key,
            paragraph,
        } => {
            let text = resolve_data_path(data, data_key).filter(|v| is_truthy(v))?;
            Some(RenderedSection::RawText {
                title,
                text: display_value(text),
                paragraph: *paragraph,
            })
        },
        SectionKind::Annotations(target) => {
            let entity_type = match target {
                AnnotationTarget::Fixed(kind) => kind.clone(),
                AnnotationTarget::FromField(key) => resolve_data_path(data, key)
                    .map(display_value)
                    .unwrap_or_default()
                    .to_lowercase(),
                AnnotationTarget::Missing => String::new(),
            };
            if entity_type.is_empty() {
                return None;
            }
            let entity_id = data.get("id").and_then(EntityId::from_value)?;
            Some(RenderedSection::Annotations {
                title,
                entity_type,
                entity_id,
            })
        },
        SectionKind::Other { fallback, .. } => {
            let def = fallback.as_ref()?;
            match resolve_data_path(data, &def.data_key) {
                Some(Value::Array(_)) => {
                    linked_table(def, title, data).map(RenderedSection::LinkedTable)
                },
                _ => None,
            }
        },
    }
}

fn field_with_suffix(field: &FieldDef, data: &Value) -> FormattedValue {
    let mut value = format_field_value(field, resolve_data_path(data, &field.key), data);
    let suffix = field
        .suffix_key
        .as_deref()
        .and_then(|key| resolve_data_path(data, key))
        .filter(|v| is_truthy(v));
    if let Some(suffix) = suffix {
        let suffix = display_value(suffix);
        match field.suffix_format.as_deref() {
            Some(template) => {
                value.push(Fragment::Muted(format!(" {}", template.replacen("{value}", &suffix, 1))))
            },
            None => value.push(Fragment::Text(suffix)),
        }
    }
    value
}

fn click_target(click: &ClickTarget, row: &Row) -> Option<LinkTarget> {
    let view = click.detail_view.as_deref()?;
    let id = row.get(&click.id_key).and_then(EntityId::from_value)?;
    LinkTarget::new(view, id)
}

fn linked_table(def: &LinkedTableDef, title: Option<String>, data: &Value) -> Option<LinkedTable> {
    let rows: Vec<&Row> = match resolve_data_path(data, &def.data_key) {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    };
    let title = title.map(|t| t.replacen("{count}", &rows.len().to_string(), 1));
    let headers = def.columns.iter().map(|c| c.label.clone()).collect();

    if rows.is_empty() {
        return def.show_empty.then(|| LinkedTable {
            title,
            headers,
            rows: Vec::new(),
            empty_message: Some(
                def.empty_message
                    .clone()
                    .unwrap_or_else(|| "No data.".to_string()),
            ),
        });
    }

    let rows = rows
        .into_iter()
        .map(|row| LinkedRow {
            row_click: def.on_row_click.as_ref().and_then(|c| click_target(c, row)),
            cells: def.columns.iter().map(|col| table_cell(col, row, data)).collect(),
        })
        .collect();
    Some(LinkedTable {
        title,
        headers,
        rows,
        empty_message: None,
    })
}

/// Format a linked-table cell. Unlike field grids, empty cells stay empty.
fn table_cell(col: &FieldDef, row: &Row, data: &Value) -> FormattedValue {
    let computed;
    let value = if col.format == FieldFormat::Computed {
        computed = Value::String(
            compute_value(col.compute.as_ref(), data, Some(row))
                .unwrap_or_else(|| FormattedValue::PLACEHOLDER.to_string()),
        );
        Some(&computed)
    } else {
        row.get(&col.key)
    };
    let truthy = value.is_some_and(is_truthy);
    let text = value.map(display_value).unwrap_or_default();

    if let (Some(link), true) = (&col.link, truthy) {
        let target = link
            .id_lookup()
            .and_then(|key| row.get(key))
            .and_then(EntityId::from_value)
            .and_then(|id| LinkTarget::new(&link.detail_view, id));
        return match target {
            Some(target) => FormattedValue::one(Fragment::Link {
                label: text,
                target,
            }),
            None => FormattedValue::text(text),
        };
    }

    let when_truthy = |fragment: Fragment| {
        if truthy {
            FormattedValue::one(fragment)
        } else {
            FormattedValue::empty()
        }
    };
    match col.format {
        FieldFormat::Boolean => FormattedValue::text(if truthy {
            col.true_label()
        } else {
            col.false_label()
        }),
        FieldFormat::ColorChip => when_truthy(Fragment::ColorChip(text)),
        FieldFormat::Code => when_truthy(Fragment::Code(text)),
        _ if col.italic => when_truthy(Fragment::Italic(text)),
        _ => FormattedValue::text(text),
    }
}

fn tagged_list(def: &TaggedListDef, title: Option<String>, data: &Value) -> Option<RenderedSection> {
    let Some(Value::Array(items)) = resolve_data_path(data, &def.data_key) else {
        return None;
    };
    if items.is_empty() {
        return None;
    }
    let text_of = |item: &Value, key: &str| item.get(key).map(display_value).unwrap_or_default();
    Some(RenderedSection::TaggedList {
        title,
        items: items
            .iter()
            .map(|item| TaggedItem {
                badge: text_of(item, &def.badge_key),
                text: text_of(item, &def.text_key),
            })
            .collect(),
        code: def.badge_code,
    })
}

fn placeholder_regex() -> Option<&'static Regex> {
    static PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{(\w+)\}").ok())
        .as_ref()
}

fn markup_regex() -> Option<&'static Regex> {
    static MARKUP: OnceLock<Option<Regex>> = OnceLock::new();
    MARKUP.get_or_init(|| Regex::new(r"<[^>]*>").ok()).as_ref()
}

/// Build a detail title from its template.
///
/// Without a template the record's `name` is used. `{icon}` is dropped (a
/// terminal has no icon font), `{field}` takes the record value (missing or
/// empty gives nothing) and any markup is stripped.
pub fn build_detail_title(template: Option<&TitleTemplate>, data: &Value) -> String {
    let Some(format) = template.and_then(|t| t.format.as_deref()) else {
        return data.get("name").map(display_value).unwrap_or_default();
    };
    let without_icon = format.replacen("{icon}", "", 1);
    let filled = match placeholder_regex() {
        Some(re) => re
            .replace_all(&without_icon, |caps: &regex::Captures<'_>| {
                data.get(&caps[1]).map(display_value).unwrap_or_default()
            })
            .into_owned(),
        None => without_icon,
    };
    match markup_regex() {
        Some(re) => re.replace_all(&filled, "").trim().to_string(),
        None => filled.trim().to_string(),
    }
}

/// `snake_case_key` → `Snake Case Key`.
pub fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Generic dump of a record that has no manifest detail view.
pub fn render_auto_detail(table: &str, id: &EntityId, data: &Value) -> RenderedDetail {
    let title = ["name", "title", "code"]
        .iter()
        .filter_map(|key| data.get(*key).filter(|v| is_truthy(v)))
        .map(display_value)
        .next()
        .unwrap_or_else(|| format!("{table} #{id}"));
    let rows = match data {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| FieldRow {
                label: title_case(k),
                value: FormattedValue::text(display_value(v)),
            })
            .collect(),
        _ => Vec::new(),
    };
    RenderedDetail {
        title,
        sections: vec![RenderedSection::FieldGrid { title: None, rows }],
    }
}
