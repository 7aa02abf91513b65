use super::fragment::{Fragment, FormattedValue, LinkTarget};
use crate::data::{display_value, is_blank, is_truthy, resolve_data_path, EntityId, Row};
use crate::manifest::{ComputeFn, FieldDef, FieldFormat};
use serde_json::Value;

/// Run a named compute function.
///
/// Reads from `row` when given (linked-table cells), else from the record.
/// Returns `None` when the inputs are missing.
pub fn compute_value(function: Option<&ComputeFn>, data: &Value, row: Option<&Row>) -> Option<String> {
    let get = |key: &str| -> Option<&Value> {
        let value = match row {
            Some(row) => row.get(key),
            None => data.get(key),
        };
        value.filter(|v| !v.is_null())
    };
    match function? {
        ComputeFn::TimeRange => {
            let start = get("start_mya")?;
            let end = get("end_mya")?;
            Some(format!(
                "{} — {} Ma",
                display_value(start),
                display_value(end)
            ))
        },
        ComputeFn::Unknown(_) => None,
    }
}

/// Format one field value for display.
///
/// `value` is the resolved field value and `data` the whole record, which
/// links, hierarchies and computed fields read from. Missing values yield the
/// `-` placeholder, except booleans which show their false label.
pub fn format_field_value(field: &FieldDef, value: Option<&Value>, data: &Value) -> FormattedValue {
    let computed;
    let value = if field.format == FieldFormat::Computed {
        computed = compute_value(field.compute.as_ref(), data, None).map(Value::String);
        computed.as_ref()
    } else {
        value
    };

    let Some(value) = value.filter(|v| !is_blank(Some(v))) else {
        return match field.format {
            FieldFormat::Boolean => FormattedValue::text(field.false_label()),
            _ => FormattedValue::placeholder(),
        };
    };

    let text = display_value(value);
    match &field.format {
        FieldFormat::Italic => FormattedValue::one(Fragment::Italic(text)),
        FieldFormat::Boolean => format_boolean(field, is_truthy(value)),
        FieldFormat::Link => {
            let target = field.link.as_ref().and_then(|link| {
                let id = resolve_data_path(data, link.id_lookup()?).and_then(EntityId::from_value)?;
                LinkTarget::new(&link.detail_view, id)
            });
            match target {
                Some(target) => FormattedValue::one(Fragment::Link {
                    label: text,
                    target,
                }),
                None => FormattedValue::text(text),
            }
        },
        FieldFormat::ColorChip => FormattedValue::one(Fragment::ColorChip(text)),
        FieldFormat::Code => FormattedValue::one(Fragment::Code(text)),
        FieldFormat::Hierarchy => hierarchy_path(field, data),
        FieldFormat::TemporalRange => temporal_range(field, data),
        FieldFormat::Plain | FieldFormat::Computed | FieldFormat::Unknown(_) => {
            FormattedValue::text(text)
        },
    }
}

fn format_boolean(field: &FieldDef, value: bool) -> FormattedValue {
    if value {
        return FormattedValue::text(field.true_label());
    }
    match field.false_class.as_deref().filter(|c| !c.is_empty()) {
        Some(class) => FormattedValue::one(Fragment::Flagged {
            text: field.false_label().to_string(),
            class: class.to_string(),
        }),
        None => FormattedValue::text(field.false_label()),
    }
}

fn linked_item(item: &Value, detail_view: Option<&str>) -> Fragment {
    let label = match item.get("name") {
        Some(name) if !is_blank(Some(name)) => display_value(name),
        _ => display_value(item),
    };
    let target = detail_view.and_then(|view| {
        let id = item.get("id").and_then(EntityId::from_value)?;
        LinkTarget::new(view, id)
    });
    match target {
        Some(target) => Fragment::Link { label, target },
        None => Fragment::Text(label),
    }
}

/// Classification path (`Order → Family → Genus`), each level linked when
/// the field names a detail view.
fn hierarchy_path(field: &FieldDef, data: &Value) -> FormattedValue {
    let key = field.data_key.as_deref().unwrap_or(&field.key);
    let Some(Value::Array(levels)) = resolve_data_path(data, key) else {
        return FormattedValue::placeholder();
    };
    if levels.is_empty() {
        return FormattedValue::placeholder();
    }
    let detail_view = field.link.as_ref().map(|l| l.detail_view.as_str());
    let mut out = FormattedValue::empty();
    for (i, level) in levels.iter().enumerate() {
        if i > 0 {
            out.push(Fragment::Arrow);
        }
        out.push(linked_item(level, detail_view));
    }
    out
}

/// Temporal code followed by the intervals it maps to.
fn temporal_range(field: &FieldDef, data: &Value) -> FormattedValue {
    let Some(code) = resolve_data_path(data, &field.key).filter(|v| is_truthy(v)) else {
        return FormattedValue::placeholder();
    };
    let mut out = FormattedValue::one(Fragment::Code(display_value(code)));

    let detail_view = field.link.as_ref().map(|l| l.detail_view.as_str());
    let mapping = field
        .mapping_key
        .as_deref()
        .and_then(|key| resolve_data_path(data, key));
    if let (Some(view), Some(Value::Array(items))) = (detail_view, mapping) {
        if !items.is_empty() {
            out.push(Fragment::Arrow);
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(Fragment::Text(", ".to_string()));
                }
                out.push(linked_item(item, Some(view)));
                match item.get("mapping_type") {
                    Some(Value::String(kind)) if !kind.is_empty() && kind != "exact" => {
                        out.push(Fragment::Muted(format!(" ({kind})")));
                    },
                    _ => {},
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::LinkDef;
    use serde_json::json;

    fn field(value: Value) -> FieldDef {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_values_show_placeholder() {
        let f = field(json!({"key": "author"}));
        assert_eq!(format_field_value(&f, None, &json!({})).plain_text(), "-");
        assert_eq!(
            format_field_value(&f, Some(&json!("")), &json!({})).plain_text(),
            "-"
        );
    }

    #[test]
    fn booleans_use_labels_and_false_class() {
        let f = field(json!({
            "key": "is_valid",
            "format": "boolean",
            "true_label": "Valid",
            "false_label": "Invalid",
            "false_class": "text-danger"
        }));
        assert_eq!(
            format_field_value(&f, Some(&json!(1)), &json!({})).plain_text(),
            "Valid"
        );
        assert_eq!(
            format_field_value(&f, Some(&json!(0)), &json!({})),
            FormattedValue::one(Fragment::Flagged {
                text: "Invalid".into(),
                class: "text-danger".into()
            })
        );
        assert_eq!(format_field_value(&f, None, &json!({})).plain_text(), "Invalid");
    }

    #[test]
    fn computed_time_range_runs_before_blank_check() {
        let f = field(json!({"key": "range", "format": "computed", "compute": "time_range"}));
        let data = json!({"start_mya": 538.8, "end_mya": 485.4});
        assert_eq!(
            format_field_value(&f, None, &data).plain_text(),
            "538.8 — 485.4 Ma"
        );
        assert_eq!(
            format_field_value(&f, None, &json!({"start_mya": 1})).plain_text(),
            "-"
        );
    }

    #[test]
    fn link_resolves_id_by_path() {
        let f = FieldDef {
            key: "parent.name".into(),
            format: FieldFormat::Link,
            link: Some(LinkDef {
                detail_view: "taxon_detail".into(),
                id_path: Some("parent.id".into()),
                id_key: None,
            }),
            ..FieldDef::default()
        };
        let data = json!({"parent": {"id": 12, "name": "Agnostidae"}});
        let value = resolve_data_path(&data, &f.key);
        let formatted = format_field_value(&f, value, &data);
        assert_eq!(formatted.plain_text(), "Agnostidae");
        let target = formatted.links().next().unwrap();
        assert_eq!(target.detail_view, "taxon_detail");
        assert_eq!(target.id, EntityId::from(12));

        let orphan = json!({"parent": {"name": "Nobody"}});
        let value = resolve_data_path(&orphan, &f.key);
        assert_eq!(format_field_value(&f, value, &orphan).links().count(), 0);
    }

    #[test]
    fn hierarchy_joins_levels_with_arrows() {
        let f = field(json!({
            "key": "hierarchy",
            "format": "hierarchy",
            "link": {"detail_view": "rank_detail"}
        }));
        let data = json!({"hierarchy": [{"id": 1, "name": "Agnostida"}, {"name": "Agnostidae"}]});
        let formatted = format_field_value(&f, data.get("hierarchy"), &data);
        assert_eq!(formatted.plain_text(), "Agnostida → Agnostidae");
        assert_eq!(formatted.links().count(), 1);

        let empty = json!({"hierarchy": []});
        assert_eq!(
            format_field_value(&f, empty.get("hierarchy"), &empty).plain_text(),
            "-"
        );
    }

    #[test]
    fn temporal_range_lists_mapped_intervals() {
        let f = field(json!({
            "key": "temporal_code",
            "format": "temporal_range",
            "mapping_key": "temporal_ics_mapping",
            "link": {"detail_view": "chronostrat_detail"}
        }));
        let data = json!({
            "temporal_code": "MCAM",
            "temporal_ics_mapping": [
                {"id": 5, "name": "Wuliuan", "mapping_type": "exact"},
                {"id": 6, "name": "Drumian", "mapping_type": "partial"}
            ]
        });
        let formatted = format_field_value(&f, data.get("temporal_code"), &data);
        assert_eq!(
            formatted.plain_text(),
            "MCAM → Wuliuan, Drumian (partial)"
        );
        assert_eq!(formatted.links().count(), 2);
    }
}
