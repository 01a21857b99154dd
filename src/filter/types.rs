use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

/// Comparison operators accepted inside a `field[op]=value` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    #[serde(rename = "$gt")]
    Gt,
    #[serde(rename = "$gte")]
    Gte,
    #[serde(rename = "$lt")]
    Lt,
    #[serde(rename = "$lte")]
    Lte,
}

impl CompareOp {
    /// Parse the operator token used on the wire (`gt`, `gte`, `lt`, `lte`)
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "gt" => Some(CompareOp::Gt),
            "gte" => Some(CompareOp::Gte),
            "lt" => Some(CompareOp::Lt),
            "lte" => Some(CompareOp::Lte),
            _ => None,
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }

    pub fn holds(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CompareOp::Gt => ordering == Greater,
            CompareOp::Gte => ordering != Less,
            CompareOp::Lt => ordering == Less,
            CompareOp::Lte => ordering != Greater,
        }
    }
}

/// A single predicate value. The operand is kept exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FilterValue {
    Equals(String),
    Compare(CompareOp, String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldFilter {
    pub field: String,
    pub value: FilterValue,
}

/// Conjunction of field predicates
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSet {
    pub conditions: Vec<FieldFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single equality predicate, used for internal lookups such as `category = <id>`
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        let mut set = Self::new();
        set.push(field, FilterValue::Equals(value.into()));
        set
    }

    pub fn push(&mut self, field: impl Into<String>, value: FilterValue) {
        self.conditions.push(FieldFilter {
            field: field.into(),
            value,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Field projection applied to each returned document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Projection {
    /// Return only these fields (plus `_id`)
    Include(BTreeSet<String>),
    /// Return everything except these fields
    Exclude(BTreeSet<String>),
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Exclude(BTreeSet::from([VERSION_FIELD.to_string()]))
    }
}

/// Internal document version field, hidden unless explicitly projected
pub const VERSION_FIELD: &str = "__v";
/// Document identifier field
pub const ID_FIELD: &str = "_id";
/// Creation timestamp field, the default sort key
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Store-native plan produced from the inbound listing parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub filter: FilterSet,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub page: u64,
    pub skip: u64,
    pub limit: u64,
}

impl QueryPlan {
    /// Plan matching every document with default ordering and no paging window
    pub fn all() -> Self {
        Self {
            filter: FilterSet::new(),
            sort: vec![SortKey::desc(CREATED_AT_FIELD)],
            projection: Projection::default(),
            page: 1,
            skip: 0,
            limit: u64::MAX,
        }
    }

    /// Oldest first, the order documents were inserted in
    pub fn insertion_order() -> Self {
        Self {
            sort: vec![SortKey::asc(CREATED_AT_FIELD)],
            ..Self::all()
        }
    }

    pub fn with_filter(mut self, filter: FilterSet) -> Self {
        self.filter = filter;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
