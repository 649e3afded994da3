pub mod queries;
pub mod routes;

pub use queries::{
    CatalogError, DownloadRegulatorQuery, ListAssembliesQuery, ListGenesQuery, ListGenomesQuery,
    ListRegulatorsQuery, ListTissuesQuery,
};
pub use routes::catalog_routes;
