use std::fs::File;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use super::{
    DebtsPayload, HealthPayload, RetirementPayload, TaxesPayload, compute_debts, compute_health,
    compute_retirement, compute_taxes, run_http_server,
};
use crate::core::{
    AccountSettings, DebtAccount, DebtAccounts, FilingStatus, MonteCarloConfig, RetirementProfile,
    TaxTable, default_categories, import_categories,
};
use crate::error::{PlannerError, Result};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliFilingStatus {
    Single,
    Married,
}

impl From<CliFilingStatus> for FilingStatus {
    fn from(value: CliFilingStatus) -> Self {
        match value {
            CliFilingStatus::Single => FilingStatus::Single,
            CliFilingStatus::Married => FilingStatus::Married,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "finplan",
    about = "Tax, debt, retirement and budget-health calculator"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "JSON rate table to use instead of the embedded 2024 table"
    )]
    pub tax_table: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Federal, state and payroll tax breakdown.
    Taxes {
        #[arg(long)]
        gross: f64,
        #[arg(long, value_enum, default_value_t = CliFilingStatus::Single)]
        status: CliFilingStatus,
        #[arg(long, default_value = "")]
        state: String,
        #[arg(long, default_value_t = 0.0)]
        pre_tax: f64,
    },
    /// One month of amortization plus a payoff schedule for a single debt.
    Debt {
        #[arg(long)]
        balance: f64,
        #[arg(long, help = "Annual interest rate in percent, e.g. 5")]
        annual_rate: f64,
        #[arg(long)]
        payment: f64,
        #[arg(long, default_value_t = 360)]
        months: u32,
    },
    /// Year-by-year retirement projection.
    Retire {
        #[arg(long, default_value_t = 30)]
        current_age: u32,
        #[arg(long, default_value_t = 65)]
        retirement_age: u32,
        #[arg(long, default_value_t = 2024)]
        start_year: i32,
        #[arg(long)]
        salary: f64,
        #[arg(long, default_value_t = 3.0, help = "Annual raise in percent")]
        raise: f64,
        #[arg(long, default_value_t = 2.0, help = "Annual inflation in percent")]
        inflation: f64,
        #[arg(long, default_value_t = 0.0)]
        balance_401k: f64,
        #[arg(long, default_value_t = 6.0, help = "Percent of salary")]
        contribution_401k: f64,
        #[arg(long, default_value_t = 0.0)]
        balance_roth: f64,
        #[arg(long, default_value_t = 5.0, help = "Percent of salary")]
        contribution_roth: f64,
        #[arg(long, default_value_t = 0.0)]
        balance_stock: f64,
        #[arg(long, default_value_t = 0.0, help = "Percent of salary")]
        contribution_stock: f64,
        #[arg(long, default_value_t = 7.0, help = "Expected return in percent for every account")]
        expected_return: f64,
        #[arg(long, default_value_t = 15.0, help = "Return spread in percent for every account")]
        variance: f64,
        #[arg(long)]
        expected_return_401k: Option<f64>,
        #[arg(long)]
        variance_401k: Option<f64>,
        #[arg(long)]
        expected_return_roth: Option<f64>,
        #[arg(long)]
        variance_roth: Option<f64>,
        #[arg(long)]
        expected_return_stock: Option<f64>,
        #[arg(long)]
        variance_stock: Option<f64>,
        #[arg(long, default_value_t = 0.0, help = "Employer 401(k) match, percent of salary")]
        employer_match: f64,
        #[arg(long, default_value_t = 4.0)]
        vesting_years: f64,
        #[arg(long, default_value_t = 0.0)]
        tenure_years: f64,
        #[arg(long, help = "Monte Carlo runs [default: 1000]")]
        runs: Option<u32>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(
            long,
            conflicts_with = "runs",
            help = "Project expected returns only, without Monte Carlo"
        )]
        deterministic: bool,
    },
    /// Budget health score against the standard categories.
    Health {
        #[arg(long)]
        net_income: f64,
        #[arg(long, help = "Category,Subcategory,Monthly Cost,Annual Cost CSV")]
        csv: Option<PathBuf>,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    let table = match &cli.tax_table {
        Some(path) => TaxTable::from_json_file(path)?,
        None => TaxTable::default(),
    };

    match cli.command {
        Command::Serve { port } => run_http_server(port, table).await?,
        command => print_json(&execute(&table, command)?)?,
    }
    Ok(())
}

pub fn execute(table: &TaxTable, command: Command) -> Result<serde_json::Value> {
    let value = match command {
        Command::Serve { .. } => {
            return Err(PlannerError::InvalidInput(
                "serve is not a one-shot command".to_string(),
            ));
        }
        Command::Taxes {
            gross,
            status,
            state,
            pre_tax,
        } => serde_json::to_value(compute_taxes(
            table,
            TaxesPayload {
                gross_income: Some(gross),
                filing_status: Some(status.into()),
                state: Some(state),
                pre_tax_deductions: Some(pre_tax),
            },
        )?)?,
        Command::Debt {
            balance,
            annual_rate,
            payment,
            months,
        } => {
            let accounts = DebtAccounts {
                other: DebtAccount {
                    balance,
                    monthly_rate: annual_rate / 100.0 / 12.0,
                    monthly_payment: payment,
                },
                ..DebtAccounts::default()
            };
            serde_json::to_value(compute_debts(DebtsPayload {
                accounts,
                schedule_months: Some(months),
            })?)?
        }
        Command::Retire {
            current_age,
            retirement_age,
            start_year,
            salary,
            raise,
            inflation,
            balance_401k,
            contribution_401k,
            balance_roth,
            contribution_roth,
            balance_stock,
            contribution_stock,
            expected_return,
            variance,
            expected_return_401k,
            variance_401k,
            expected_return_roth,
            variance_roth,
            expected_return_stock,
            variance_stock,
            employer_match,
            vesting_years,
            tenure_years,
            runs,
            seed,
            deterministic,
        } => {
            let account = |start_balance: f64,
                           contribution_percent: f64,
                           expected: Option<f64>,
                           spread: Option<f64>| AccountSettings {
                start_balance,
                contribution_rate: contribution_percent / 100.0,
                expected_return_percent: expected.unwrap_or(expected_return),
                variance_percent: spread.unwrap_or(variance),
            };
            let profile = RetirementProfile {
                current_age,
                retirement_age,
                start_year,
                salary,
                raise_rate: raise / 100.0,
                inflation_rate: inflation / 100.0,
                traditional_401k: account(
                    balance_401k,
                    contribution_401k,
                    expected_return_401k,
                    variance_401k,
                ),
                roth: account(
                    balance_roth,
                    contribution_roth,
                    expected_return_roth,
                    variance_roth,
                ),
                employer_stock: account(
                    balance_stock,
                    contribution_stock,
                    expected_return_stock,
                    variance_stock,
                ),
                employer_match_rate: employer_match / 100.0,
                vesting_period_years: vesting_years,
                tenure_years,
            };
            serde_json::to_value(compute_retirement(
                table,
                RetirementPayload {
                    profile,
                    runs: (!deterministic)
                        .then(|| runs.unwrap_or(MonteCarloConfig::default().runs)),
                    seed: Some(seed),
                },
            )?)?
        }
        Command::Health { net_income, csv } => {
            let mut categories = default_categories();
            if let Some(path) = csv {
                import_categories(File::open(path)?, &mut categories)?;
            }
            serde_json::to_value(compute_health(
                table,
                HealthPayload {
                    annual_net_income: Some(net_income),
                    categories: Some(categories),
                    ..HealthPayload::default()
                },
            )?)?
        }
    };
    Ok(value)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
