//! Marker traits separating writes from reads
//!
//! Every command and query struct implements exactly one of these next to
//! its `mediator::Request` impl, so the split is visible in the type system.

/// A request that changes state (sessions, queued jobs, uploaded files)
pub trait Command: Send + 'static {}

/// A request that only reads, apart from refreshing TTLs and caches
pub trait Query: Send + 'static {}
