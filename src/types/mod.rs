// Blogshelf shared type definitions
// Each submodule defines types used across the crate.

pub mod errors;
pub mod post;
pub mod query;
pub mod reading;
pub mod settings;
