//! Bookshelf Types - Pure type definitions
//!
//! Record types, their field descriptor tables and list query
//! parameters. No async runtime or database dependencies.

pub mod book;
pub mod filters;
pub mod fleet;
pub mod record;
pub mod user;

pub use book::*;
pub use filters::*;
pub use fleet::*;
pub use record::*;
pub use user::*;
