pub mod admin;
pub mod auth;
pub mod me;

// Re-export handler functions for use in routing
pub use auth::login as users_login;
pub use auth::register as users_register;

pub use me::get as me_get;
pub use me::update as me_update;

pub use admin::delete as user_delete;
pub use admin::get as user_get;
pub use admin::list as users_list;
pub use admin::patch as user_patch;

pub const NOT_FOUND: &str = "User not found";
pub const NOT_FOR_PASSWORDS: &str = "This route is not for password updates";
