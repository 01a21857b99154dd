// handlers/mod.rs - one module per resource
//
// Public reads need no token; mutations declare `AdminOnly` or
// `Authenticated` in their signatures and the extractor enforces it.
pub mod categories;
pub mod products;
pub mod system;
pub mod users;
