pub mod download_regulator;
pub mod list_assemblies;
pub mod list_genes;
pub mod list_genomes;
pub mod list_regulators;
pub mod list_tissues;

use dorina_common::DorinaError;

use crate::store::StoreError;

pub use download_regulator::{DownloadRegulatorQuery, DownloadRegulatorResponse};
pub use list_assemblies::{ListAssembliesQuery, ListAssembliesResponse};
pub use list_genes::{ListGenesQuery, ListGenesResponse, MAX_GENES};
pub use list_genomes::{ListGenomesQuery, ListGenomesResponse};
pub use list_regulators::{ListRegulatorsQuery, ListRegulatorsResponse};
pub use list_tissues::{ListTissuesQuery, ListTissuesResponse};

/// Errors shared by the catalog queries
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Catalog error: {0}")]
    Data(DorinaError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<DorinaError> for CatalogError {
    fn from(err: DorinaError) -> Self {
        match err {
            DorinaError::GenomeNotFound(name) | DorinaError::RegulatorNotFound(name) => {
                Self::NotFound(name)
            },
            DorinaError::InvalidName(name) => Self::InvalidName(name),
            other => Self::Data(other),
        }
    }
}
