pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{BedUpload, CreateSessionCommand, CreateSessionError, CreateSessionResponse};
pub use queries::{GetSessionStatusError, GetSessionStatusQuery};
pub use routes::sessions_routes;
