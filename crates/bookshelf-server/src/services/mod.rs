//! Business logic services

pub mod books;
pub mod fleet;
pub mod users;

pub use books::BookService;
pub use fleet::FleetService;
pub use users::UserService;
