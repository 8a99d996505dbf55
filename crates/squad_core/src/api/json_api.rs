use serde::{Deserialize, Serialize};

use crate::config::OptimizerConfig;
use crate::error::SquadError;
use crate::models::{Candidate, CandidateId, CandidatePool};
use crate::optimizer::{optimize, OptimizationReport};
use crate::transfers::{suggest_transfers, TransferSuggestion};

pub const SCHEMA_VERSION: u8 = 1;

fn err_code(code: &str, message: impl std::fmt::Display) -> String {
    format!("{code}: {message}")
}

fn squad_err(err: SquadError) -> String {
    err_code(err.code(), err)
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub schema_version: u8,
    pub candidates: Vec<Candidate>,
    /// Falls back to `SQUAD_CONFIG_PATH`, then to defaults.
    #[serde(default)]
    pub config: Option<OptimizerConfig>,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub schema_version: u8,
    #[serde(flatten)]
    pub report: OptimizationReport,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub schema_version: u8,
    pub candidates: Vec<Candidate>,
    pub squad_ids: Vec<CandidateId>,
    #[serde(default)]
    pub bank: f64,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub config: Option<OptimizerConfig>,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub schema_version: u8,
    pub suggestions: Vec<TransferSuggestion>,
}

fn check_schema(version: u8) -> Result<(), String> {
    if version != SCHEMA_VERSION {
        return Err(err_code("E_SCHEMA", format!("Unsupported schema version: {version}")));
    }
    Ok(())
}

fn resolve_config(config: Option<OptimizerConfig>) -> Result<OptimizerConfig, String> {
    match config {
        Some(config) => Ok(config),
        None => Ok(OptimizerConfig::from_env().map_err(squad_err)?.unwrap_or_default()),
    }
}

/// Optimize a candidate pool from a JSON request; returns the ranked report as JSON.
pub fn optimize_json(request_json: &str) -> Result<String, String> {
    let request: OptimizeRequest = serde_json::from_str(request_json)
        .map_err(|e| err_code("E_JSON", format!("Invalid JSON request: {e}")))?;
    check_schema(request.schema_version)?;

    let config = resolve_config(request.config)?;
    let report = optimize(request.candidates, &config).map_err(squad_err)?;

    let response = OptimizeResponse { schema_version: SCHEMA_VERSION, report };
    serde_json::to_string(&response)
        .map_err(|e| err_code("E_JSON", format!("Failed to serialize result: {e}")))
}

/// Transfer plan suggestions for an existing squad, as JSON.
///
/// Excluded ids stay in the pool so a squad may still list them; they are
/// only kept out of the incoming side.
pub fn suggest_transfers_json(request_json: &str) -> Result<String, String> {
    let request: TransferRequest = serde_json::from_str(request_json)
        .map_err(|e| err_code("E_JSON", format!("Invalid JSON request: {e}")))?;
    check_schema(request.schema_version)?;

    let config = resolve_config(request.config)?;
    config.validate().map_err(squad_err)?;
    let pool = CandidatePool::new(request.candidates).map_err(squad_err)?;
    let suggestions =
        suggest_transfers(&pool, &request.squad_ids, request.bank, &config, request.limit)
            .map_err(squad_err)?;

    let response = TransferResponse { schema_version: SCHEMA_VERSION, suggestions };
    serde_json::to_string(&response)
        .map_err(|e| err_code("E_JSON", format!("Failed to serialize result: {e}")))
}
