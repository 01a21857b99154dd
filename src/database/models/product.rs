use serde::Deserialize;
use serde_json::Value;

use super::{trimmed, ValidationError, Violations};
use crate::database::store::Document;

pub const NAME_MAX_CHARS: usize = 100;
pub const DEFAULT_IMAGE_URL: &str = "default-product.jpg";
/// Stock below this is reported as `isLowStock`
pub const LOW_STOCK_THRESHOLD: f64 = 10.0;

/// Product fields accepted from clients; unknown fields are dropped
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub in_stock: Option<bool>,
    pub quantity: Option<i64>,
    pub image_url: Option<String>,
}

impl ProductInput {
    /// Validate a complete product and fill in defaults. Used by create and
    /// full replacement.
    pub fn into_document(self) -> Result<Document, ValidationError> {
        let mut violations = Violations::default();

        let name = trimmed(self.name);
        let description = self.description.filter(|d| !d.trim().is_empty());
        let category = trimmed(self.category);

        violations.check(name.is_some(), "Product name is required");
        violations.check(description.is_some(), "Product description is required");
        violations.check(self.price.is_some(), "Product price is required");
        violations.check(category.is_some(), "Product category is required");
        check_ranges(&mut violations, name.as_deref(), self.price, self.quantity);

        let mut doc = Document::new();
        doc.insert("name".into(), name.map(Value::from).unwrap_or_default());
        doc.insert(
            "description".into(),
            description.map(Value::from).unwrap_or_default(),
        );
        doc.insert("price".into(), self.price.map(Value::from).unwrap_or_default());
        doc.insert("category".into(), category.map(Value::from).unwrap_or_default());
        doc.insert("inStock".into(), Value::from(self.in_stock.unwrap_or(true)));
        doc.insert("quantity".into(), Value::from(self.quantity.unwrap_or(0)));
        doc.insert(
            "imageUrl".into(),
            Value::from(self.image_url.unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string())),
        );
        violations.finish(doc)
    }

    /// Validate only the supplied fields of a partial update
    pub fn into_changes(self) -> Result<Document, ValidationError> {
        let mut violations = Violations::default();
        let mut doc = Document::new();

        if let Some(name) = self.name {
            let name = name.trim().to_string();
            violations.check(!name.is_empty(), "Product name is required");
            check_ranges(&mut violations, Some(&name), None, None);
            doc.insert("name".into(), Value::from(name));
        }
        if let Some(description) = self.description {
            violations.check(
                !description.trim().is_empty(),
                "Product description is required",
            );
            doc.insert("description".into(), Value::from(description));
        }
        if let Some(category) = self.category {
            let category = category.trim().to_string();
            violations.check(!category.is_empty(), "Product category is required");
            doc.insert("category".into(), Value::from(category));
        }
        check_ranges(&mut violations, None, self.price, self.quantity);
        if let Some(price) = self.price {
            doc.insert("price".into(), Value::from(price));
        }
        if let Some(quantity) = self.quantity {
            doc.insert("quantity".into(), Value::from(quantity));
        }
        if let Some(in_stock) = self.in_stock {
            doc.insert("inStock".into(), Value::from(in_stock));
        }
        if let Some(image_url) = self.image_url {
            doc.insert("imageUrl".into(), Value::from(image_url));
        }
        violations.finish(doc)
    }
}

fn check_ranges(
    violations: &mut Violations,
    name: Option<&str>,
    price: Option<f64>,
    quantity: Option<i64>,
) {
    if let Some(name) = name {
        violations.check(
            name.chars().count() <= NAME_MAX_CHARS,
            "Product name cannot exceed 100 characters",
        );
    }
    if let Some(price) = price {
        violations.check(price >= 0.0, "Price cannot be negative");
    }
    if let Some(quantity) = quantity {
        violations.check(quantity >= 0, "Quantity cannot be negative");
    }
}

/// Add the `id` and `isLowStock` virtuals to an outgoing product
pub fn add_virtuals(product: &mut Document) {
    if let Some(id) = product.get("_id").cloned() {
        product.insert("id".into(), id);
    }
    if let Some(quantity) = product.get("quantity").and_then(Value::as_f64) {
        product.insert(
            "isLowStock".into(),
            Value::Bool(quantity < LOW_STOCK_THRESHOLD),
        );
    }
}
