use serde_json::{Map, Number, Value};

use super::error::FilterError;
use super::types::{CompareOp, FieldFilter, FilterSet, FilterValue};

/// Builds and evaluates the predicate half of a query plan.
///
/// Both store backends share these semantics: a stored number is compared
/// numerically whenever the operand parses as one, equality otherwise
/// compares the stored value's textual form, comparisons are lexical against
/// strings, and anything else never matches.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Parse one inbound query parameter (`field` or `field[op]`) into a predicate
    pub fn parse_param(key: &str, value: &str) -> Result<FieldFilter, FilterError> {
        let (field, operator) = match key.find('[') {
            None => (key, None),
            Some(open) => {
                let rest = &key[open + 1..];
                let op = rest
                    .strip_suffix(']')
                    .filter(|op| !op.contains('[') && !op.contains(']'))
                    .ok_or_else(|| FilterError::MalformedKey(key.to_string()))?;
                (&key[..open], Some(op))
            }
        };

        validate_field_name(field)?;

        let value = match operator {
            None => FilterValue::Equals(value.to_string()),
            Some(token) => {
                let op = CompareOp::from_token(token).ok_or_else(|| {
                    FilterError::UnsupportedOperator {
                        field: field.to_string(),
                        operator: token.to_string(),
                    }
                })?;
                FilterValue::Compare(op, value.to_string())
            }
        };

        Ok(FieldFilter {
            field: field.to_string(),
            value,
        })
    }

    /// Render the filter set as SQL over the `body` JSONB column.
    /// Field names are bound as parameters, never interpolated.
    pub fn generate(filter: &FilterSet, starting_param_index: usize) -> (String, Vec<Value>) {
        let mut filter_where = Self::new(starting_param_index);
        let conditions: Vec<String> = filter
            .conditions
            .iter()
            .map(|c| filter_where.build_sql_condition(c))
            .collect();
        (conditions.join(" AND "), filter_where.param_values)
    }

    fn build_sql_condition(&mut self, condition: &FieldFilter) -> String {
        let field = self.param(Value::String(condition.field.clone()));
        match &condition.value {
            FilterValue::Equals(operand) => match numeric_operand(operand) {
                // `->>` renders 25.0 as "25.0", so numbers need a numeric test
                Some(n) => {
                    let n = self.param(Value::Number(n));
                    let t = self.param(Value::String(operand.clone()));
                    format!(
                        "CASE jsonb_typeof(body -> {f}) WHEN 'number' THEN (body ->> {f})::float8 = {n}::float8 ELSE body ->> {f} = {t} END",
                        f = field,
                        n = n,
                        t = t
                    )
                }
                None => {
                    let v = self.param(Value::String(operand.clone()));
                    format!("body ->> {} = {}", field, v)
                }
            },
            FilterValue::Compare(op, operand) => {
                let numeric = numeric_operand(operand).map(|n| {
                    let p = self.param(Value::Number(n));
                    format!(
                        "WHEN 'number' THEN (body ->> {f})::float8 {op} {p}::float8 ",
                        f = field,
                        op = op.to_sql(),
                        p = p
                    )
                });
                let text = self.param(Value::String(operand.clone()));
                format!(
                    "CASE jsonb_typeof(body -> {f}) {numeric}WHEN 'string' THEN (body ->> {f}) COLLATE \"C\" {op} {t} ELSE false END",
                    f = field,
                    numeric = numeric.unwrap_or_default(),
                    op = op.to_sql(),
                    t = text
                )
            }
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }

    /// In-process evaluation of the filter set against one document
    pub fn matches(filter: &FilterSet, document: &Map<String, Value>) -> bool {
        filter
            .conditions
            .iter()
            .all(|c| Self::matches_condition(c, document.get(&c.field)))
    }

    fn matches_condition(condition: &FieldFilter, stored: Option<&Value>) -> bool {
        match &condition.value {
            FilterValue::Equals(operand) => match (stored, numeric_operand(operand)) {
                (Some(Value::Number(n)), Some(rhs)) => n.as_f64() == rhs.as_f64(),
                _ => stored.and_then(text_form).as_deref() == Some(operand.as_str()),
            },
            FilterValue::Compare(op, operand) => match stored {
                Some(Value::Number(n)) => match (n.as_f64(), numeric_operand(operand)) {
                    (Some(lhs), Some(rhs)) => rhs
                        .as_f64()
                        .and_then(|rhs| lhs.partial_cmp(&rhs))
                        .map_or(false, |ord| op.holds(ord)),
                    _ => false,
                },
                Some(Value::String(s)) => op.holds(s.as_str().cmp(operand.as_str())),
                _ => false,
            },
        }
    }
}

/// Field names must be plain identifiers
pub fn validate_field_name(field: &str) -> Result<(), FilterError> {
    let mut chars = field.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(FilterError::InvalidField(field.to_string()))
    }
}

/// Textual form of a stored scalar, matching Postgres' `->>` operator
fn text_form(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn numeric_operand(operand: &str) -> Option<Number> {
    operand
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}
