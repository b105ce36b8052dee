//! Harvesting table metadata and lineage from Datafold's GraphQL API.

use thiserror::Error;

pub mod client;
pub mod graphql;
pub mod lineage;
pub mod metadata;
pub mod path;

pub use client::{DatafoldClient, DatafoldConfig};
pub use lineage::DatafoldLineageExtractor;
pub use metadata::DatafoldMetadataExtractor;
pub use path::{PathError, TablePath, unquote_path};

#[derive(Debug, Error)]
pub enum DatafoldError {
    #[error("Both DATAFOLD_URL and DATAFOLD_API_KEY must be configured")]
    MissingCredentials,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("datafold returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("graphql error: {0}")]
    GraphQl(String),
    #[error("graphql response carried no data")]
    MissingData,
    #[error(transparent)]
    Path(#[from] PathError),
}
