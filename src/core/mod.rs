mod debt;
mod exchange;
mod health;
mod random;
mod simulator;
mod tax;
mod types;

pub use debt::{amortize_account, amortize_account_set, amortize_one_period, payoff_schedule};
pub use exchange::{ImportSummary, export_categories, import_categories};
pub use health::{
    category_score, default_categories, evaluate, percent_of_income, savings_bonus,
};
pub use random::{SeededRng, UniformSource, derive_seed, sample_annual_return};
pub use simulator::{
    project, project_deterministic, run_monte_carlo, vesting_fraction, year_count,
};
pub use tax::{
    BracketTable, PayrollConstants, PerStatus, TaxTable, all_taxes, effective_rate, federal_tax,
    marginal_rate, payroll_taxes, state_tax, taxable_income,
};
pub use types::{
    AccountSettings, AccountYear, BudgetCategory, CategoryReport, ContributionLimits, DebtAccount,
    DebtAccounts, DebtKind, FilingStatus, HealthReport, MeanYear, MonteCarloConfig,
    MonteCarloSummary, PayoffSchedule, PayrollTaxes, RetirementProfile, ReturnMode,
    SimulationYearRecord, SpendStatus, StateRate, TaxBracket, TaxBreakdown,
};
