// src/models/mod.rs
pub mod identifiers;
pub mod metadata;
pub mod response;

pub use identifiers::{ContractAddress, ContractQuery, MetadataQuery, SpecId};
pub use metadata::{
    ContractRecord, ContractSpecs, Erc7730Document, FunctionRecord, SpecHistory,
    SpecMetadataResponse, SpecRecord,
};
pub use response::{ApiResponse, BatchEntry, BatchResponse, BatchStatus, CombinedMetadata};
