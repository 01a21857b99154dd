use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_where::validate_field_name;
use super::types::{SortDirection, SortKey, CREATED_AT_FIELD};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse a `sort` directive such as `-price,name`. Empty tokens are skipped;
    /// an empty result falls back to the default ordering.
    pub fn validate_and_parse(sort: Option<&str>) -> Result<Vec<SortKey>, FilterError> {
        let mut out = Vec::new();
        for part in sort.unwrap_or_default().split(',') {
            let token = part.trim();
            if token.is_empty() {
                continue;
            }
            let (field, direction) = match token.strip_prefix('-') {
                Some(field) => (field, SortDirection::Desc),
                None => (token.strip_prefix('+').unwrap_or(token), SortDirection::Asc),
            };
            validate_field_name(field)?;
            out.push(SortKey {
                field: field.to_string(),
                direction,
            });
        }
        if out.is_empty() {
            out.push(SortKey::desc(CREATED_AT_FIELD));
        }
        Ok(out)
    }

    /// ORDER BY clause over the JSONB body; field names are bound parameters
    pub fn generate(keys: &[SortKey], starting_param_index: usize) -> (String, Vec<Value>) {
        if keys.is_empty() {
            return (String::new(), vec![]);
        }
        let mut params = Vec::with_capacity(keys.len());
        let parts: Vec<String> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                params.push(Value::String(key.field.clone()));
                format!("body -> ${} {}", starting_param_index + i + 1, key.direction.to_sql())
            })
            .collect();
        (format!("ORDER BY {}", parts.join(", ")), params)
    }

    /// In-process ordering consistent with Postgres JSONB ordering:
    /// strings < numbers < booleans, missing fields last when ascending.
    pub fn compare(keys: &[SortKey], a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
        for key in keys {
            let ord = compare_values(a.get(&key.field), b.get(&key.field));
            let ord = match key.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a, b) {
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_to_created_at_desc() {
        let keys = FilterOrder::validate_and_parse(None).unwrap();
        assert_eq!(keys, vec![SortKey::desc("createdAt")]);

        let keys = FilterOrder::validate_and_parse(Some(" , ")).unwrap();
        assert_eq!(keys, vec![SortKey::desc("createdAt")]);
    }

    #[test]
    fn keeps_order_and_direction() {
        let keys = FilterOrder::validate_and_parse(Some("-price,name")).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].field, "price");
        assert_eq!(keys[0].direction, SortDirection::Desc);
        assert_eq!(keys[1].field, "name");
        assert_eq!(keys[1].direction, SortDirection::Asc);
    }

    #[test]
    fn rejects_invalid_sort_fields() {
        assert!(FilterOrder::validate_and_parse(Some("price;drop")).is_err());
    }

    #[test]
    fn generates_order_by() {
        let keys = FilterOrder::validate_and_parse(Some("-price,name")).unwrap();
        let (sql, params) = FilterOrder::generate(&keys, 3);
        assert_eq!(sql, "ORDER BY body -> $4 DESC, body -> $5 ASC");
        assert_eq!(params, vec![json!("price"), json!("name")]);
    }

    #[test]
    fn compares_documents() {
        let keys = FilterOrder::validate_and_parse(Some("-price")).unwrap();
        let cheap = json!({"price": 5}).as_object().cloned().unwrap();
        let dear = json!({"price": 50}).as_object().cloned().unwrap();
        let none = json!({}).as_object().cloned().unwrap();
        assert_eq!(FilterOrder::compare(&keys, &dear, &cheap), Ordering::Less);
        // missing sorts last ascending, so first when descending
        assert_eq!(FilterOrder::compare(&keys, &none, &dear), Ordering::Less);
    }
}
