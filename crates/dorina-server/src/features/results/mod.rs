pub mod queries;
pub mod routes;

pub use queries::{
    DownloadFormat, DownloadResultsError, DownloadResultsQuery, GetResultPageError,
    GetResultPageQuery, GetResultPageResponse, PageState, ResultPage,
};
pub use routes::results_routes;
