use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_where::validate_field_name;
use super::types::{Projection, ID_FIELD};

impl Projection {
    /// Parse a `fields` directive such as `name,price` or `-description,-__v`
    pub fn parse(fields: Option<&str>) -> Result<Self, FilterError> {
        let tokens: Vec<&str> = fields
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.is_empty() {
            return Ok(Projection::default());
        }

        let excluded = tokens.iter().filter(|t| t.starts_with('-')).count();
        if excluded != 0 && excluded != tokens.len() {
            return Err(FilterError::MixedProjection);
        }

        let mut names = BTreeSet::new();
        for token in tokens {
            let name = token.trim_start_matches('-');
            validate_field_name(name)?;
            names.insert(name.to_string());
        }

        Ok(if excluded == 0 {
            Projection::Include(names)
        } else {
            Projection::Exclude(names)
        })
    }

    pub fn includes(&self, field: &str) -> bool {
        match self {
            Projection::Include(names) => field == ID_FIELD || names.contains(field),
            Projection::Exclude(names) => !names.contains(field),
        }
    }

    pub fn apply(&self, document: &mut Map<String, Value>) {
        document.retain(|key, _| self.includes(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_hides_version_field() {
        let mut doc = json!({"_id": "a", "name": "Lamp", "__v": 0})
            .as_object()
            .cloned()
            .unwrap();
        Projection::parse(None).unwrap().apply(&mut doc);
        assert!(doc.contains_key("name"));
        assert!(!doc.contains_key("__v"));
    }

    #[test]
    fn include_keeps_id() {
        let mut doc = json!({"_id": "a", "name": "Lamp", "price": 3, "__v": 0})
            .as_object()
            .cloned()
            .unwrap();
        Projection::parse(Some("name")).unwrap().apply(&mut doc);
        assert_eq!(doc.len(), 2);
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("name"));
    }

    #[test]
    fn exclude_list() {
        let projection = Projection::parse(Some("-description,-price")).unwrap();
        assert!(!projection.includes("price"));
        assert!(projection.includes("__v"));
    }

    #[test]
    fn mixed_projection_is_rejected() {
        assert_eq!(
            Projection::parse(Some("name,-price")),
            Err(FilterError::MixedProjection)
        );
    }
}
