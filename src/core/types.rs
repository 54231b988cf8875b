use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilingStatus {
    Single,
    Married,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBracket {
    pub lower_bound: f64,
    /// `None` marks the open-ended top bracket.
    pub upper_bound: Option<f64>,
    pub rate: f64,
}

impl TaxBracket {
    pub const fn new(lower_bound: f64, upper_bound: Option<f64>, rate: f64) -> Self {
        Self {
            lower_bound,
            upper_bound,
            rate,
        }
    }

    pub fn upper_or_infinity(&self) -> f64 {
        self.upper_bound.unwrap_or(f64::INFINITY)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StateRate {
    Known(f64),
    Unknown,
}

impl StateRate {
    pub fn rate(self) -> f64 {
        match self {
            StateRate::Known(rate) => rate,
            StateRate::Unknown => 0.0,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, StateRate::Known(_))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollTaxes {
    pub social_security: f64,
    pub medicare: f64,
    pub additional_medicare: f64,
}

impl PayrollTaxes {
    pub fn total(self) -> f64 {
        self.social_security + self.medicare + self.additional_medicare
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub federal: f64,
    pub state: f64,
    pub social_security: f64,
    pub medicare: f64,
    pub additional_medicare: f64,
    pub total_tax: f64,
    pub net_income: f64,
    /// Percent of gross income.
    pub effective_rate: f64,
    /// Federal marginal bracket rate, in percent.
    pub marginal_rate: f64,
    pub state_recognized: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebtAccount {
    pub balance: f64,
    pub monthly_rate: f64,
    pub monthly_payment: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DebtKind {
    Mortgage,
    Auto,
    CreditCard,
    StudentLoan,
    Other,
}

impl DebtKind {
    pub const ALL: [DebtKind; 5] = [
        DebtKind::Mortgage,
        DebtKind::Auto,
        DebtKind::CreditCard,
        DebtKind::StudentLoan,
        DebtKind::Other,
    ];
}

#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebtAccounts {
    pub mortgage: DebtAccount,
    pub auto: DebtAccount,
    pub credit_card: DebtAccount,
    pub student_loan: DebtAccount,
    pub other: DebtAccount,
}

impl DebtAccounts {
    pub fn get(&self, kind: DebtKind) -> &DebtAccount {
        match kind {
            DebtKind::Mortgage => &self.mortgage,
            DebtKind::Auto => &self.auto,
            DebtKind::CreditCard => &self.credit_card,
            DebtKind::StudentLoan => &self.student_loan,
            DebtKind::Other => &self.other,
        }
    }

    pub fn get_mut(&mut self, kind: DebtKind) -> &mut DebtAccount {
        match kind {
            DebtKind::Mortgage => &mut self.mortgage,
            DebtKind::Auto => &mut self.auto,
            DebtKind::CreditCard => &mut self.credit_card,
            DebtKind::StudentLoan => &mut self.student_loan,
            DebtKind::Other => &mut self.other,
        }
    }

    pub fn total_balance(&self) -> f64 {
        DebtKind::ALL.iter().map(|k| self.get(*k).balance).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffSchedule {
    pub periods_to_payoff: Option<u32>,
    pub total_interest: f64,
    pub balances: Vec<f64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountSettings {
    pub start_balance: f64,
    /// Fraction of salary contributed each year.
    pub contribution_rate: f64,
    pub expected_return_percent: f64,
    pub variance_percent: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetirementProfile {
    pub current_age: u32,
    pub retirement_age: u32,
    pub start_year: i32,
    pub salary: f64,
    pub raise_rate: f64,
    pub inflation_rate: f64,
    pub traditional_401k: AccountSettings,
    pub roth: AccountSettings,
    pub employer_stock: AccountSettings,
    pub employer_match_rate: f64,
    pub vesting_period_years: f64,
    pub tenure_years: f64,
}

impl Default for RetirementProfile {
    fn default() -> Self {
        Self {
            current_age: 30,
            retirement_age: 65,
            start_year: 2024,
            salary: 75_000.0,
            raise_rate: 0.03,
            inflation_rate: 0.02,
            traditional_401k: AccountSettings {
                start_balance: 0.0,
                contribution_rate: 0.06,
                expected_return_percent: 7.0,
                variance_percent: 15.0,
            },
            roth: AccountSettings {
                start_balance: 0.0,
                contribution_rate: 0.05,
                expected_return_percent: 7.0,
                variance_percent: 15.0,
            },
            employer_stock: AccountSettings {
                start_balance: 0.0,
                contribution_rate: 0.0,
                expected_return_percent: 8.0,
                variance_percent: 25.0,
            },
            employer_match_rate: 0.0,
            vesting_period_years: 4.0,
            tenure_years: 0.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionLimits {
    pub traditional_401k: f64,
    pub ira: f64,
    /// `None` leaves stock purchases uncapped.
    pub employer_stock: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReturnMode {
    Deterministic,
    Stochastic,
}

#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountYear {
    pub contribution: f64,
    pub appreciation: f64,
    pub balance: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationYearRecord {
    pub age: u32,
    pub year: i32,
    pub salary: f64,
    pub traditional_401k: AccountYear,
    pub roth: AccountYear,
    pub employer_stock: AccountYear,
    pub vested_stock_balance: f64,
    pub total_retirement_balance: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonteCarloConfig {
    pub runs: u32,
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            runs: 1_000,
            seed: 42,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeanYear {
    pub age: u32,
    pub year: i32,
    pub mean_total_balance: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloSummary {
    pub runs: u32,
    pub mean_trajectory: Vec<MeanYear>,
    pub final_p10: f64,
    pub final_median: f64,
    pub final_p90: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategory {
    pub label: String,
    pub recommended_share: f64,
    #[serde(default)]
    pub is_savings: bool,
    #[serde(default)]
    pub subcategories: BTreeMap<String, f64>,
}

impl BudgetCategory {
    pub fn new(label: &str, recommended_share: f64, is_savings: bool) -> Self {
        Self {
            label: label.to_string(),
            recommended_share,
            is_savings,
            subcategories: BTreeMap::new(),
        }
    }

    pub fn with_item(mut self, name: &str, monthly: f64) -> Self {
        self.subcategories.insert(name.to_string(), monthly);
        self
    }

    pub fn monthly_total(&self) -> f64 {
        self.subcategories.values().sum()
    }

    pub fn annual_total(&self) -> f64 {
        self.monthly_total() * 12.0
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendStatus {
    Over,
    Under,
    Zero,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReport {
    pub label: String,
    pub monthly_total: f64,
    pub annual_total: f64,
    pub actual_percent: f64,
    pub recommended_percent: f64,
    pub status: SpendStatus,
    /// `None` for savings categories, which are never penalised.
    pub score: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub categories: Vec<CategoryReport>,
    pub unallocated_surplus: f64,
    pub savings_rate: f64,
    pub score: u8,
}
