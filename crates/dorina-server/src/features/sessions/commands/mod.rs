pub mod create;

pub use create::{BedUpload, CreateSessionCommand, CreateSessionError, CreateSessionResponse};
