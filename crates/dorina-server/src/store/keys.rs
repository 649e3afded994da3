//! Key layout shared by the server and the workers

/// Prefix of every cached result list
pub const RESULTS_PREFIX: &str = "results:";

/// Suffix turning a result key into its in-flight marker
pub const PENDING_SUFFIX: &str = "_pending";

/// Prefix of session records
pub const SESSIONS_PREFIX: &str = "sessions:";

/// List holding queued jobs
pub const JOB_QUEUE: &str = "dorina:jobs";

/// In-flight marker guarding a result key
pub fn pending(result_key: &str) -> String {
    format!("{}{}", result_key, PENDING_SUFFIX)
}

pub fn session(session_id: &str) -> String {
    format!("{}{}", SESSIONS_PREFIX, session_id)
}

/// Pointer from a session to the result key it is waiting on
pub fn session_result(session_id: &str) -> String {
    format!("{}{}{}", RESULTS_PREFIX, SESSIONS_PREFIX, session_id)
}

pub fn regulators(assembly: &str) -> String {
    format!("regulators:{}", assembly)
}

pub fn genes(assembly: &str) -> String {
    format!("genes:{}", assembly)
}
