use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// A scanned inventory form (ICS/PAR) as the document backend returns it.
///
/// Only the metadata is held here; the attached copy is fetched on demand
/// by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub document_number: Option<NumericField>,
    #[serde(default)]
    pub uploader_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date_acquired: Option<String>,
    #[serde(default)]
    pub quantity: Option<NumericField>,
}

impl Document {
    /// Date portion of `dateAcquired` (everything before the `T`), or an
    /// empty string when the backend sent none.
    pub fn acquired_date(&self) -> &str {
        self.date_acquired
            .as_deref()
            .and_then(|date| date.split('T').next())
            .unwrap_or("")
    }
}

/// Numeric column as stored by the backend.
///
/// Older records carry numbers as strings, so text is kept verbatim rather
/// than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl NumericField {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumericField::Integer(value) => Some(*value as f64),
            NumericField::Float(value) => Some(*value),
            NumericField::Text(_) => None,
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericField::Integer(value) => write!(f, "{}", value),
            NumericField::Float(value) => write!(f, "{}", value),
            NumericField::Text(value) => f.write_str(value),
        }
    }
}

/// One text field of the upload form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormField {
    /// Struct field name, as reported by `validator`.
    pub key: &'static str,
    /// Multipart part name expected by the backend.
    pub wire: &'static str,
    pub label: &'static str,
}

/// Upload form fields in submission order.
pub static FORM_FIELDS: [FormField; 6] = [
    FormField {
        key: "document_type",
        wire: "documentType",
        label: "Document Type",
    },
    FormField {
        key: "document_number",
        wire: "documentNumber",
        label: "Document Number",
    },
    FormField {
        key: "uploader_name",
        wire: "uploaderName",
        label: "Uploader Name",
    },
    FormField {
        key: "description",
        wire: "description",
        label: "Description",
    },
    FormField {
        key: "date_acquired",
        wire: "dateAcquired",
        label: "Date Acquired",
    },
    FormField {
        key: "quantity",
        wire: "quantity",
        label: "Quantity",
    },
];

/// Text fields of a new document, exactly as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    #[validate(length(min = 1, message = "Document type is required"))]
    pub document_type: String,
    #[validate(length(min = 1, message = "Document number is required"))]
    pub document_number: String,
    #[validate(length(min = 1, message = "Uploader name is required"))]
    pub uploader_name: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "Date acquired is required"))]
    pub date_acquired: String,
    #[validate(length(min = 1, message = "Quantity is required"))]
    pub quantity: String,
}

impl NewDocument {
    pub fn value(&self, field: &FormField) -> &str {
        match field.key {
            "document_type" => &self.document_type,
            "document_number" => &self.document_number,
            "uploader_name" => &self.uploader_name,
            "description" => &self.description,
            "date_acquired" => &self.date_acquired,
            "quantity" => &self.quantity,
            _ => "",
        }
    }

    /// Set a field by its multipart name. Unknown names are ignored.
    pub fn set_wire_field(&mut self, wire: &str, value: String) {
        match wire {
            "documentType" => self.document_type = value,
            "documentNumber" => self.document_number = value,
            "uploaderName" => self.uploader_name = value,
            "description" => self.description = value,
            "dateAcquired" => self.date_acquired = value,
            "quantity" => self.quantity = value,
            _ => {}
        }
    }

    /// `(part name, value)` pairs in submission order.
    pub fn parts(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        FORM_FIELDS
            .iter()
            .map(move |field| (field.wire, self.value(field)))
    }
}

/// The scanned copy selected for upload.
#[derive(Clone, PartialEq)]
pub struct DocumentFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for DocumentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_backend_record() {
        let doc: Document = serde_json::from_value(json!({
            "_id": "65f1c0",
            "documentType": "ICS",
            "documentNumber": 1042,
            "uploaderName": "Alice",
            "description": "chair",
            "dateAcquired": "2024-03-05T00:00:00.000Z",
            "quantity": "3",
            "documentCopy": { "data": "ignored" },
            "__v": 0
        }))
        .unwrap();

        assert_eq!(doc.id, "65f1c0");
        assert_eq!(doc.document_number, Some(NumericField::Integer(1042)));
        assert_eq!(doc.quantity, Some(NumericField::Text("3".to_string())));
        assert_eq!(doc.acquired_date(), "2024-03-05");
    }

    #[test]
    fn test_missing_fields_default_to_none() {
        let doc: Document = serde_json::from_value(json!({ "id": "x1" })).unwrap();

        assert_eq!(doc.id, "x1");
        assert!(doc.uploader_name.is_none());
        assert_eq!(doc.acquired_date(), "");
    }

    #[test]
    fn test_acquired_date_without_time_is_unchanged() {
        let doc: Document =
            serde_json::from_value(json!({ "_id": "a", "dateAcquired": "2023-12-01" })).unwrap();
        assert_eq!(doc.acquired_date(), "2023-12-01");
    }

    #[test]
    fn test_new_document_parts_follow_submission_order() {
        let mut form = NewDocument::default();
        form.set_wire_field("quantity", "2".to_string());
        form.set_wire_field("documentType", "PAR".to_string());
        form.set_wire_field("unknown", "ignored".to_string());

        let parts: Vec<_> = form.parts().collect();
        assert_eq!(parts[0], ("documentType", "PAR"));
        assert_eq!(parts[5], ("quantity", "2"));
        assert_eq!(parts.len(), 6);
    }
}
