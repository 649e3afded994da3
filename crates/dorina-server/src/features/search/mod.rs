pub mod commands;
pub mod routes;

pub use commands::{DispatchSearchCommand, DispatchSearchError, DispatchSearchResponse};
pub use routes::search_routes;
