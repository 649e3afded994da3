pub mod download;
pub mod get_page;

pub use download::{
    DownloadFormat, DownloadResultsError, DownloadResultsQuery, DownloadResultsResponse,
};
pub use get_page::{
    GetResultPageError, GetResultPageQuery, GetResultPageResponse, PageState, ResultPage,
};
