use crate::data::EntityId;
use crate::error::{Result, StrataError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of user annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    /// Free-form note.
    Note,
    /// Proposed correction.
    Correction,
    /// Alternative interpretation.
    Alternative,
    /// External reference.
    Link,
}

impl AnnotationType {
    /// All types in menu order.
    pub const ALL: [AnnotationType; 4] = [Self::Note, Self::Correction, Self::Alternative, Self::Link];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Correction => "correction",
            Self::Alternative => "alternative",
            Self::Link => "link",
        }
    }

    /// The next type in menu order, wrapping around.
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation id.
    pub id: i64,
    /// Annotated entity type.
    pub entity_type: String,
    /// Annotated entity id.
    pub entity_id: Value,
    /// Type name; servers may send types this viewer does not know.
    pub annotation_type: String,
    /// Text.
    pub content: String,
    /// Optional author.
    #[serde(default)]
    pub author: Option<String>,
    /// Creation timestamp as sent by the server.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Request body for creating an annotation.
#[derive(Debug, Clone, Serialize)]
pub struct NewAnnotation {
    /// Annotated entity type.
    pub entity_type: String,
    /// Annotated entity id.
    pub entity_id: Value,
    /// Type.
    pub annotation_type: AnnotationType,
    /// Text (trimmed, non-empty).
    pub content: String,
    /// Author, when given.
    pub author: Option<String>,
}

impl NewAnnotation {
    /// Validate and build a request. Blank content is rejected.
    pub fn new(
        entity_type: &str,
        entity_id: &EntityId,
        annotation_type: AnnotationType,
        content: &str,
        author: Option<&str>,
    ) -> Result<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(StrataError::InvalidAnnotation("content is empty".to_string()));
        }
        if entity_type.is_empty() {
            return Err(StrataError::InvalidAnnotation("entity type is empty".to_string()));
        }
        Ok(Self {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_json(),
            annotation_type,
            content: content.to_string(),
            author: author.map(str::trim).filter(|a| !a.is_empty()).map(str::to_string),
        })
    }
}

/// Annotation list state of one annotations section.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationList {
    /// Request in flight.
    Loading,
    /// Loaded; may be empty.
    Loaded(Vec<Annotation>),
    /// Loading failed.
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_annotation_trims_and_rejects_blank_content() {
        let id = EntityId::from(42);
        assert!(NewAnnotation::new("genus", &id, AnnotationType::Note, "   ", None).is_err());

        let ann = NewAnnotation::new("genus", &id, AnnotationType::Correction, " fix year ", Some(" "))
            .unwrap();
        assert_eq!(
            serde_json::to_value(&ann).unwrap(),
            json!({
                "entity_type": "genus",
                "entity_id": 42,
                "annotation_type": "correction",
                "content": "fix year",
                "author": null
            })
        );
    }

    #[test]
    fn types_cycle_in_menu_order() {
        assert_eq!(AnnotationType::Link.next(), AnnotationType::Note);
        assert_eq!(AnnotationType::Note.next().as_str(), "correction");
    }
}
