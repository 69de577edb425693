pub mod handler;
pub mod schema;

pub use handler::MessageHandler;
pub use schema::{Violation, validate};
