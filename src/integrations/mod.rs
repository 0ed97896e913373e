pub mod http;
pub mod metadata_backend;
pub mod subgraph;

pub use http::{ReqwestTransport, TokioBackoff};
pub use metadata_backend::MetadataBackendClient;
pub use subgraph::SubgraphClient;
