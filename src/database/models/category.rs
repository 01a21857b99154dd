use serde::Deserialize;
use serde_json::Value;

use super::{trimmed, ValidationError, Violations};
use crate::database::store::Document;

pub const NAME_MAX_CHARS: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct CategoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CategoryInput {
    pub fn into_document(self) -> Result<Document, ValidationError> {
        let mut violations = Violations::default();
        let name = trimmed(self.name);
        violations.check(name.is_some(), "Category name is required");
        if let Some(name) = &name {
            check_name_length(&mut violations, name);
        }

        let mut doc = Document::new();
        doc.insert("name".into(), name.map(Value::from).unwrap_or_default());
        if let Some(description) = self.description {
            doc.insert("description".into(), Value::from(description));
        }
        violations.finish(doc)
    }

    pub fn into_changes(self) -> Result<Document, ValidationError> {
        let mut violations = Violations::default();
        let mut doc = Document::new();
        if let Some(name) = self.name {
            let name = name.trim().to_string();
            violations.check(!name.is_empty(), "Category name is required");
            check_name_length(&mut violations, &name);
            doc.insert("name".into(), Value::from(name));
        }
        if let Some(description) = self.description {
            doc.insert("description".into(), Value::from(description));
        }
        violations.finish(doc)
    }
}

fn check_name_length(violations: &mut Violations, name: &str) {
    violations.check(
        name.chars().count() <= NAME_MAX_CHARS,
        "Category name cannot exceed 50 characters",
    );
}
