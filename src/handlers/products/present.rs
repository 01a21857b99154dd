use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::database::models::product::add_virtuals;
use crate::database::Document;
use crate::error::ApiError;
use crate::filter::{Projection, VERSION_FIELD};
use crate::state::AppState;
use crate::types::Collection;

const CATEGORY_FIELD: &str = "category";

/// Shape a product for output without touching the store
pub fn present(mut product: Document) -> Document {
    product.remove(VERSION_FIELD);
    add_virtuals(&mut product);
    product
}

/// Replace each product's category id with the category document and add
/// the product virtuals. Dangling references become `null`.
pub async fn populate(
    state: &AppState,
    products: Vec<Document>,
    projection: &Projection,
) -> Result<Vec<Document>, ApiError> {
    let ids: BTreeSet<String> = if projection.includes(CATEGORY_FIELD) {
        products
            .iter()
            .filter_map(|p| p.get(CATEGORY_FIELD).and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    } else {
        BTreeSet::new()
    };

    let categories: HashMap<String, Document> = if ids.is_empty() {
        HashMap::new()
    } else {
        let ids: Vec<String> = ids.into_iter().collect();
        state
            .store
            .find_by_ids(Collection::Categories, &ids)
            .await?
            .into_iter()
            .filter_map(|mut category| {
                category.remove(VERSION_FIELD);
                let id = category.get("_id").and_then(Value::as_str)?.to_string();
                Some((id, category))
            })
            .collect()
    };

    Ok(products
        .into_iter()
        .map(|mut product| {
            let linked = product
                .get(CATEGORY_FIELD)
                .and_then(Value::as_str)
                .map(|id| categories.get(id).cloned());
            if let Some(category) = linked {
                product.insert(
                    CATEGORY_FIELD.to_string(),
                    category.map(Value::Object).unwrap_or(Value::Null),
                );
            }
            add_virtuals(&mut product);
            product
        })
        .collect())
}
