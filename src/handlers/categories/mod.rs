pub mod collection;
pub mod record;

// Re-export handler functions for use in routing
pub use collection::list as categories_list;
pub use collection::post as categories_post;

pub use record::delete as category_delete;
pub use record::get as category_get;
pub use record::products as category_products;
pub use record::put as category_put;

pub const NOT_FOUND: &str = "Category not found";
