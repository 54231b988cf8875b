use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::core::{
    BudgetCategory, DebtAccounts, DebtKind, FilingStatus, HealthReport, ImportSummary,
    MonteCarloConfig, MonteCarloSummary, PayoffSchedule, RetirementProfile, SimulationYearRecord,
    TaxBreakdown, TaxTable, amortize_account_set, default_categories, evaluate, import_categories,
    payoff_schedule, project_deterministic, run_monte_carlo,
};
use crate::error::{PlannerError, Result};

pub mod cli;

const MAX_SIMULATION_RUNS: u32 = 100_000;
const MAX_RETIREMENT_AGE: u32 = 150;
const DEFAULT_SCHEDULE_MONTHS: u32 = 360;
const MAX_SCHEDULE_MONTHS: u32 = 1_200;

type SharedTable = Arc<TaxTable>;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaxesPayload {
    pub gross_income: Option<f64>,
    pub filing_status: Option<FilingStatus>,
    pub state: Option<String>,
    pub pre_tax_deductions: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxesResponse {
    pub gross_income: f64,
    pub taxable_income: f64,
    #[serde(flatten)]
    pub breakdown: TaxBreakdown,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebtsPayload {
    pub accounts: DebtAccounts,
    pub schedule_months: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayoff {
    pub kind: DebtKind,
    #[serde(flatten)]
    pub schedule: PayoffSchedule,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtsResponse {
    pub next: DebtAccounts,
    pub total_balance: f64,
    pub payoff: Vec<DebtPayoff>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetirementPayload {
    #[serde(flatten)]
    pub profile: RetirementProfile,
    pub runs: Option<u32>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementResponse {
    pub expected_years: Vec<SimulationYearRecord>,
    pub monte_carlo: Option<MonteCarloSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthPayload {
    pub annual_net_income: Option<f64>,
    pub gross_income: Option<f64>,
    pub filing_status: Option<FilingStatus>,
    pub state: Option<String>,
    pub pre_tax_deductions: Option<f64>,
    pub categories: Option<Vec<BudgetCategory>>,
    pub csv: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub annual_net_income: f64,
    pub import: Option<ImportSummary>,
    #[serde(flatten)]
    pub report: HealthReport,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(table: TaxTable) -> Router {
    Router::new()
        .route("/api/taxes", post(taxes_handler))
        .route("/api/debts", post(debts_handler))
        .route("/api/retirement", post(retirement_handler))
        .route("/api/health", post(health_handler))
        .fallback(not_found_handler)
        .with_state(Arc::new(table))
}

pub async fn run_http_server(port: u16, table: TaxTable) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, tax_year = table.tax_year, "finplan HTTP API listening");

    axum::serve(listener, router(table)).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn taxes_handler(
    State(table): State<SharedTable>,
    Json(payload): Json<TaxesPayload>,
) -> Response {
    respond(compute_taxes(&table, payload))
}

async fn debts_handler(Json(payload): Json<DebtsPayload>) -> Response {
    respond(compute_debts(payload))
}

async fn retirement_handler(
    State(table): State<SharedTable>,
    Json(payload): Json<RetirementPayload>,
) -> Response {
    respond(compute_retirement(&table, payload))
}

async fn health_handler(
    State(table): State<SharedTable>,
    Json(payload): Json<HealthPayload>,
) -> Response {
    respond(compute_health(&table, payload))
}

pub fn compute_taxes(table: &TaxTable, payload: TaxesPayload) -> Result<TaxesResponse> {
    let gross_income = payload.gross_income.unwrap_or(0.0);
    let status = payload.filing_status.unwrap_or(FilingStatus::Single);
    let pre_tax = payload.pre_tax_deductions.unwrap_or(0.0);
    require_finite("grossIncome", gross_income)?;
    require_finite("preTaxDeductions", pre_tax)?;

    let state = payload.state.unwrap_or_default();
    let taxable_income = table.taxable_income(gross_income, status, pre_tax);
    let breakdown = table.all_taxes(gross_income, taxable_income, status, &state);
    if !breakdown.state_recognized && !state.trim().is_empty() {
        debug!(state = %state, "unrecognized state code, applying zero state tax");
    }

    Ok(TaxesResponse {
        gross_income,
        taxable_income,
        breakdown,
    })
}

pub fn compute_debts(payload: DebtsPayload) -> Result<DebtsResponse> {
    let months = payload.schedule_months.unwrap_or(DEFAULT_SCHEDULE_MONTHS);
    if months > MAX_SCHEDULE_MONTHS {
        return Err(PlannerError::InvalidInput(format!(
            "scheduleMonths must be <= {MAX_SCHEDULE_MONTHS}"
        )));
    }
    for kind in DebtKind::ALL {
        let account = payload.accounts.get(kind);
        require_finite("balance", account.balance)?;
        require_finite("monthlyPayment", account.monthly_payment)?;
        if !(account.monthly_rate >= 0.0 && account.monthly_rate.is_finite()) {
            return Err(PlannerError::InvalidInput(format!(
                "{kind:?} monthlyRate must be a finite value >= 0"
            )));
        }
    }

    let next = amortize_account_set(&payload.accounts);
    let payoff = DebtKind::ALL
        .iter()
        .map(|kind| DebtPayoff {
            kind: *kind,
            schedule: payoff_schedule(payload.accounts.get(*kind), months),
        })
        .collect();

    Ok(DebtsResponse {
        total_balance: next.total_balance(),
        next,
        payoff,
    })
}

pub fn compute_retirement(
    table: &TaxTable,
    payload: RetirementPayload,
) -> Result<RetirementResponse> {
    let profile = payload.profile;
    if profile.retirement_age < profile.current_age {
        return Err(PlannerError::InvalidInput(
            "retirementAge must be >= currentAge".to_string(),
        ));
    }
    if profile.retirement_age > MAX_RETIREMENT_AGE {
        return Err(PlannerError::InvalidInput(format!(
            "retirementAge must be <= {MAX_RETIREMENT_AGE}"
        )));
    }
    require_finite("salary", profile.salary)?;
    if profile.inflation_rate <= -1.0 || profile.raise_rate <= -1.0 {
        return Err(PlannerError::InvalidInput(
            "raiseRate and inflationRate must be > -1".to_string(),
        ));
    }

    let limits = table.contribution_limits;
    let expected_years = project_deterministic(&profile, &limits);

    let monte_carlo = match payload.runs {
        None => None,
        Some(runs) if runs == 0 || runs > MAX_SIMULATION_RUNS => {
            return Err(PlannerError::InvalidInput(format!(
                "runs must be between 1 and {MAX_SIMULATION_RUNS}"
            )));
        }
        Some(runs) => {
            let config = MonteCarloConfig {
                runs,
                seed: payload.seed.unwrap_or(MonteCarloConfig::default().seed),
            };
            Some(run_monte_carlo(&profile, &limits, &config))
        }
    };

    Ok(RetirementResponse {
        expected_years,
        monte_carlo,
    })
}

pub fn compute_health(table: &TaxTable, payload: HealthPayload) -> Result<HealthResponse> {
    let annual_net_income = match (payload.annual_net_income, payload.gross_income) {
        (Some(net), _) => net,
        (None, Some(gross)) => {
            require_finite("grossIncome", gross)?;
            table
                .take_home(
                    gross,
                    payload.filing_status.unwrap_or(FilingStatus::Single),
                    payload.state.as_deref().unwrap_or_default(),
                    payload.pre_tax_deductions.unwrap_or(0.0),
                )
                .net_income
        }
        (None, None) => {
            return Err(PlannerError::InvalidInput(
                "annualNetIncome or grossIncome is required".to_string(),
            ));
        }
    };
    require_finite("annualNetIncome", annual_net_income)?;

    let mut categories = payload.categories.unwrap_or_else(default_categories);
    let import = match payload.csv.as_deref() {
        Some(csv) => Some(import_categories(csv.as_bytes(), &mut categories)?),
        None => None,
    };

    Ok(HealthResponse {
        annual_net_income,
        import,
        report: evaluate(&categories, annual_net_income),
    })
}

fn require_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PlannerError::InvalidInput(format!("{field} must be finite")))
    }
}

fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
