pub mod dispatch;

pub use dispatch::{DispatchSearchCommand, DispatchSearchError, DispatchSearchResponse};
