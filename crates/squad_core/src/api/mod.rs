pub mod json_api;

pub use json_api::{
    optimize_json, suggest_transfers_json, OptimizeRequest, OptimizeResponse, TransferRequest,
    TransferResponse, SCHEMA_VERSION,
};
