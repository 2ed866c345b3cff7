use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_loan(input_json: String) -> NapiResult<String> {
    let input: lending_core::schedule::SimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = lending_core::schedule::simulate_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Rate tables
// ---------------------------------------------------------------------------

#[napi]
pub fn validate_rate_table(input_json: String) -> NapiResult<String> {
    let spec: lending_core::rates::RateTableSpec =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let tiers = lending_core::rates::validate_tiers(&spec.tiers).map_err(to_napi_error)?;
    serde_json::to_string(&tiers).map_err(to_napi_error)
}

#[derive(serde::Deserialize)]
struct ResolveRateBindingInput {
    table: lending_core::rates::RateTable,
    installments: u32,
}

#[napi]
pub fn resolve_rate(input_json: String) -> NapiResult<String> {
    let binding_input: ResolveRateBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let rate = binding_input
        .table
        .resolve_rate(binding_input.installments)
        .map_err(to_napi_error)?;
    serde_json::to_string(&rate).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Credit recommendation
// ---------------------------------------------------------------------------

#[napi]
pub fn recommend_credit(input_json: String) -> NapiResult<String> {
    let input: lending_core::recommendation::RecommendationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = lending_core::recommendation::recommend_credit(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[napi]
pub fn suggest_payment(input_json: String) -> NapiResult<String> {
    let input: lending_core::ledger::PaymentQuoteInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = lending_core::ledger::quote_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
