use crate::range_index::RangeCategory;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouteError>;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Invalid {category} CIDR {value:?}: {source}")]
    InvalidCidr {
        category: RangeCategory,
        value: String,
        #[source]
        source: ipnetwork::IpNetworkError,
    },

    #[error("Failed to write route snapshot to {}: {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),
}
