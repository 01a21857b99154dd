use crate::config::QueryConfig;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterSet, Projection, QueryPlan};

/// Translates raw listing parameters into a [`QueryPlan`]
pub struct Filter<'a> {
    config: &'a QueryConfig,
    where_data: FilterSet,
    sort: Option<&'a str>,
    fields: Option<&'a str>,
    page: Option<&'a str>,
    limit: Option<&'a str>,
}

impl<'a> Filter<'a> {
    pub fn new(config: &'a QueryConfig) -> Self {
        Self {
            config,
            where_data: FilterSet::new(),
            sort: None,
            fields: None,
            page: None,
            limit: None,
        }
    }

    /// Partition the parameters into directives (`page`, `sort`, `limit`,
    /// `fields`) and filter predicates. Repeated directives: last one wins.
    pub fn assign(mut self, params: &'a [(String, String)]) -> Result<Self, FilterError> {
        for (key, value) in params {
            match key.as_str() {
                "sort" => self.sort = Some(value.as_str()),
                "fields" => self.fields = Some(value.as_str()),
                "page" => self.page = Some(value.as_str()),
                "limit" => self.limit = Some(value.as_str()),
                _ => self.where_data.conditions.push(FilterWhere::parse_param(key, value)?),
            }
        }
        Ok(self)
    }

    pub fn into_plan(self) -> Result<QueryPlan, FilterError> {
        let sort = FilterOrder::validate_and_parse(self.sort)?;
        let projection = Projection::parse(self.fields)?;

        let page = parse_positive(self.page, self.config.default_page);
        let mut limit = parse_positive(self.limit, self.config.default_limit);
        if let Some(max) = self.config.max_limit {
            if limit > max {
                if self.config.debug_logging {
                    tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max);
                }
                limit = max;
            }
        }
        let skip = (page - 1).saturating_mul(limit);

        Ok(QueryPlan {
            filter: self.where_data,
            sort,
            projection,
            page,
            skip,
            limit,
        })
    }

    /// One-shot translation of a listing request
    pub fn translate(
        params: &'a [(String, String)],
        config: &'a QueryConfig,
    ) -> Result<QueryPlan, FilterError> {
        let plan = Filter::new(config).assign(params)?.into_plan()?;
        if config.debug_logging {
            tracing::debug!(?plan, "translated listing query");
        }
        Ok(plan)
    }
}

/// Absent or non-numeric values use the default; parsed values below 1 clamp to 1
fn parse_positive(raw: Option<&str>, default: u64) -> u64 {
    match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
        Some(n) if n < 1 => 1,
        Some(n) => n as u64,
        None => default.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::filter::types::{CompareOp, FilterValue, SortKey};

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn translate(pairs: &[(&str, &str)]) -> Result<QueryPlan, FilterError> {
        let config = AppConfig::development().query;
        let p = params(pairs);
        Filter::translate(&p, &config)
    }

    #[test]
    fn reserved_keys_never_become_filters() {
        let plan = translate(&[
            ("page", "2"),
            ("sort", "name"),
            ("limit", "5"),
            ("fields", "name"),
            ("name", "Lamp"),
        ])
        .unwrap();
        assert_eq!(plan.filter.conditions.len(), 1);
        assert_eq!(plan.filter.conditions[0].field, "name");
    }

    #[test]
    fn operator_filters_keep_operand() {
        let plan = translate(&[("price[gte]", "10"), ("price[lt]", "99.5")]).unwrap();
        let values: Vec<&FilterValue> = plan.filter.conditions.iter().map(|c| &c.value).collect();
        assert_eq!(
            values,
            vec![
                &FilterValue::Compare(CompareOp::Gte, "10".into()),
                &FilterValue::Compare(CompareOp::Lt, "99.5".into()),
            ]
        );
        assert!(plan
            .filter
            .conditions
            .iter()
            .all(|c| !matches!(c.value, FilterValue::Equals(_))));
    }

    #[test]
    fn operator_words_inside_values_are_untouched() {
        let plan = translate(&[("description", "gt lte great")]).unwrap();
        assert_eq!(
            plan.filter.conditions[0].value,
            FilterValue::Equals("gt lte great".into())
        );
    }

    #[test]
    fn default_sort_is_created_at_desc() {
        let plan = translate(&[]).unwrap();
        assert_eq!(plan.sort, vec![SortKey::desc("createdAt")]);
        assert_eq!(plan.projection, Projection::default());
        assert_eq!((plan.page, plan.skip, plan.limit), (1, 0, 100));
    }

    #[test]
    fn skip_is_derived_from_page_and_limit() {
        let plan = translate(&[("page", "2"), ("limit", "10")]).unwrap();
        assert_eq!(plan.skip, 10);
        assert_eq!(plan.limit, 10);
    }

    #[test]
    fn non_numeric_page_uses_default() {
        let plan = translate(&[("page", "abc"), ("limit", "x")]).unwrap();
        assert_eq!(plan.page, 1);
        assert_eq!(plan.limit, 100);
        assert_eq!(plan.skip, 0);
    }

    #[test]
    fn zero_and_negative_values_clamp_to_one() {
        let plan = translate(&[("page", "-3"), ("limit", "0")]).unwrap();
        assert_eq!(plan.page, 1);
        assert_eq!(plan.limit, 1);
        assert_eq!(plan.skip, 0);
    }

    #[test]
    fn configured_max_limit_caps() {
        let mut config = AppConfig::development().query;
        config.max_limit = Some(50);
        let p = params(&[("limit", "500")]);
        let plan = Filter::translate(&p, &config).unwrap();
        assert_eq!(plan.limit, 50);
    }

    #[test]
    fn unsupported_operator_is_an_error() {
        assert!(translate(&[("price[regex]", ".*")]).is_err());
    }
}
