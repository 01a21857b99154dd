pub mod collection;
pub mod present;
pub mod record;

// Re-export handler functions for use in routing
pub use collection::list as products_list;
pub use collection::options as products_options;
pub use collection::post as products_post;

pub use record::delete as product_delete;
pub use record::get as product_get;
pub use record::head as product_head;
pub use record::patch as product_patch;
pub use record::put as product_put;

pub const NOT_FOUND: &str = "Product not found";
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS";
