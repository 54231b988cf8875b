use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::types::{
    ContributionLimits, FilingStatus, PayrollTaxes, StateRate, TaxBracket, TaxBreakdown,
};
use crate::error::{PlannerError, Result};

const SINGLE_BRACKETS_2024: [TaxBracket; 7] = [
    TaxBracket::new(0.0, Some(11_600.0), 0.10),
    TaxBracket::new(11_600.0, Some(47_150.0), 0.12),
    TaxBracket::new(47_150.0, Some(100_525.0), 0.22),
    TaxBracket::new(100_525.0, Some(191_950.0), 0.24),
    TaxBracket::new(191_950.0, Some(243_725.0), 0.32),
    TaxBracket::new(243_725.0, Some(609_350.0), 0.35),
    TaxBracket::new(609_350.0, None, 0.37),
];

const MARRIED_BRACKETS_2024: [TaxBracket; 7] = [
    TaxBracket::new(0.0, Some(23_200.0), 0.10),
    TaxBracket::new(23_200.0, Some(94_300.0), 0.12),
    TaxBracket::new(94_300.0, Some(201_050.0), 0.22),
    TaxBracket::new(201_050.0, Some(383_900.0), 0.24),
    TaxBracket::new(383_900.0, Some(487_450.0), 0.32),
    TaxBracket::new(487_450.0, Some(731_200.0), 0.35),
    TaxBracket::new(731_200.0, None, 0.37),
];

const STATE_RATES_2024: [(&str, f64); 51] = [
    ("AK", 0.0),
    ("AL", 0.05),
    ("AR", 0.044),
    ("AZ", 0.025),
    ("CA", 0.093),
    ("CO", 0.044),
    ("CT", 0.05),
    ("DC", 0.065),
    ("DE", 0.055),
    ("FL", 0.0),
    ("GA", 0.0549),
    ("HI", 0.0725),
    ("IA", 0.057),
    ("ID", 0.058),
    ("IL", 0.0495),
    ("IN", 0.0305),
    ("KS", 0.057),
    ("KY", 0.04),
    ("LA", 0.0425),
    ("MA", 0.05),
    ("MD", 0.0475),
    ("ME", 0.0675),
    ("MI", 0.0425),
    ("MN", 0.068),
    ("MO", 0.048),
    ("MS", 0.047),
    ("MT", 0.059),
    ("NC", 0.045),
    ("ND", 0.0195),
    ("NE", 0.0584),
    ("NH", 0.0),
    ("NJ", 0.0637),
    ("NM", 0.049),
    ("NV", 0.0),
    ("NY", 0.0685),
    ("OH", 0.035),
    ("OK", 0.0475),
    ("OR", 0.0875),
    ("PA", 0.0307),
    ("RI", 0.0475),
    ("SC", 0.064),
    ("SD", 0.0),
    ("TN", 0.0),
    ("TX", 0.0),
    ("UT", 0.0465),
    ("VA", 0.0575),
    ("VT", 0.066),
    ("WA", 0.0),
    ("WI", 0.053),
    ("WV", 0.0512),
    ("WY", 0.0),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketTable {
    pub single: Vec<TaxBracket>,
    pub married: Vec<TaxBracket>,
}

impl BracketTable {
    pub fn for_status(&self, status: FilingStatus) -> &[TaxBracket] {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::Married => &self.married,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerStatus {
    pub single: f64,
    pub married: f64,
}

impl PerStatus {
    pub fn get(self, status: FilingStatus) -> f64 {
        match status {
            FilingStatus::Single => self.single,
            FilingStatus::Married => self.married,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollConstants {
    pub social_security_rate: f64,
    pub social_security_wage_base: f64,
    pub medicare_rate: f64,
    pub additional_medicare_rate: f64,
    pub additional_medicare_threshold: PerStatus,
}

/// A complete, swappable set of rates for one tax year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxTable {
    pub tax_year: i32,
    pub brackets: BracketTable,
    pub standard_deduction: PerStatus,
    pub payroll: PayrollConstants,
    pub state_rates: BTreeMap<String, f64>,
    pub contribution_limits: ContributionLimits,
}

impl Default for TaxTable {
    fn default() -> Self {
        Self::tax_year_2024()
    }
}

impl TaxTable {
    pub fn tax_year_2024() -> Self {
        Self {
            tax_year: 2024,
            brackets: BracketTable {
                single: SINGLE_BRACKETS_2024.to_vec(),
                married: MARRIED_BRACKETS_2024.to_vec(),
            },
            standard_deduction: PerStatus {
                single: 14_600.0,
                married: 29_200.0,
            },
            payroll: PayrollConstants {
                social_security_rate: 0.062,
                social_security_wage_base: 168_600.0,
                medicare_rate: 0.0145,
                additional_medicare_rate: 0.009,
                additional_medicare_threshold: PerStatus {
                    single: 200_000.0,
                    married: 250_000.0,
                },
            },
            state_rates: STATE_RATES_2024
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
            contribution_limits: ContributionLimits {
                traditional_401k: 23_000.0,
                ira: 7_000.0,
                employer_stock: None,
            },
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let table: TaxTable = serde_json::from_str(&raw)?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        for status in [FilingStatus::Single, FilingStatus::Married] {
            validate_brackets(self.brackets.for_status(status))
                .map_err(|msg| PlannerError::InvalidTaxTable(format!("{status:?}: {msg}")))?;
        }
        if self.state_rates.values().any(|r| !(0.0..=1.0).contains(r)) {
            return Err(PlannerError::InvalidTaxTable(
                "state rates must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    pub fn federal_tax(&self, taxable_income: f64, status: FilingStatus) -> f64 {
        if taxable_income <= 0.0 {
            return 0.0;
        }

        let mut tax = 0.0;
        for bracket in self.brackets.for_status(status) {
            if bracket.lower_bound >= taxable_income {
                break;
            }
            let taxed_to = taxable_income.min(bracket.upper_or_infinity());
            tax += bracket.rate * (taxed_to - bracket.lower_bound).max(0.0);
        }
        tax
    }

    pub fn marginal_rate(&self, taxable_income: f64, status: FilingStatus) -> f64 {
        let brackets = self.brackets.for_status(status);
        let lowest = brackets.first().map(|b| b.rate).unwrap_or(0.0);
        if taxable_income <= 0.0 {
            return lowest;
        }

        brackets
            .iter()
            .take_while(|b| b.lower_bound < taxable_income)
            .last()
            .map(|b| b.rate)
            .unwrap_or(lowest)
    }

    pub fn state_rate(&self, state_code: &str) -> StateRate {
        let code = state_code.trim().to_ascii_uppercase();
        if code.is_empty() {
            return StateRate::Unknown;
        }
        match self.state_rates.get(&code) {
            Some(rate) => StateRate::Known(*rate),
            None => StateRate::Unknown,
        }
    }

    pub fn state_tax(&self, taxable_income: f64, state_code: &str) -> f64 {
        taxable_income.max(0.0) * self.state_rate(state_code).rate()
    }

    pub fn payroll_taxes(&self, gross_income: f64, status: FilingStatus) -> PayrollTaxes {
        let gross = gross_income.max(0.0);
        let payroll = &self.payroll;

        let social_security =
            gross.min(payroll.social_security_wage_base) * payroll.social_security_rate;
        let medicare = gross * payroll.medicare_rate;
        let threshold = payroll.additional_medicare_threshold.get(status);
        let additional_medicare = if gross > threshold {
            (gross - threshold) * payroll.additional_medicare_rate
        } else {
            0.0
        };

        PayrollTaxes {
            social_security,
            medicare,
            additional_medicare,
        }
    }

    pub fn standard_deduction(&self, status: FilingStatus) -> f64 {
        self.standard_deduction.get(status)
    }

    pub fn taxable_income(
        &self,
        gross_income: f64,
        status: FilingStatus,
        pre_tax_deductions: f64,
    ) -> f64 {
        (gross_income - self.standard_deduction(status) - pre_tax_deductions).max(0.0)
    }

    pub fn all_taxes(
        &self,
        gross_income: f64,
        taxable_income: f64,
        status: FilingStatus,
        state_code: &str,
    ) -> TaxBreakdown {
        let federal = self.federal_tax(taxable_income, status);
        let state_rate = self.state_rate(state_code);
        let state = taxable_income.max(0.0) * state_rate.rate();
        let payroll = self.payroll_taxes(gross_income, status);
        let total_tax = federal + state + payroll.total();

        TaxBreakdown {
            federal,
            state,
            social_security: payroll.social_security,
            medicare: payroll.medicare,
            additional_medicare: payroll.additional_medicare,
            total_tax,
            net_income: gross_income - total_tax,
            effective_rate: effective_rate(total_tax, gross_income),
            marginal_rate: self.marginal_rate(taxable_income, status) * 100.0,
            state_recognized: state_rate.is_known(),
        }
    }

    pub fn take_home(
        &self,
        gross_income: f64,
        status: FilingStatus,
        state_code: &str,
        pre_tax_deductions: f64,
    ) -> TaxBreakdown {
        let taxable = self.taxable_income(gross_income, status, pre_tax_deductions);
        self.all_taxes(gross_income, taxable, status, state_code)
    }
}

pub fn effective_rate(tax: f64, gross_income: f64) -> f64 {
    if gross_income > 0.0 {
        tax / gross_income * 100.0
    } else {
        0.0
    }
}

// Backs the free functions below; built once on first use.
static TAX_YEAR_2024: LazyLock<TaxTable> = LazyLock::new(TaxTable::tax_year_2024);

pub fn federal_tax(taxable_income: f64, status: FilingStatus) -> f64 {
    TAX_YEAR_2024.federal_tax(taxable_income, status)
}

pub fn marginal_rate(taxable_income: f64, status: FilingStatus) -> f64 {
    TAX_YEAR_2024.marginal_rate(taxable_income, status)
}

pub fn state_tax(taxable_income: f64, state_code: &str) -> f64 {
    TAX_YEAR_2024.state_tax(taxable_income, state_code)
}

pub fn payroll_taxes(gross_income: f64, status: FilingStatus) -> PayrollTaxes {
    TAX_YEAR_2024.payroll_taxes(gross_income, status)
}

pub fn taxable_income(gross_income: f64, status: FilingStatus, pre_tax_deductions: f64) -> f64 {
    TAX_YEAR_2024.taxable_income(gross_income, status, pre_tax_deductions)
}

pub fn all_taxes(
    gross_income: f64,
    taxable_income: f64,
    status: FilingStatus,
    state_code: &str,
) -> TaxBreakdown {
    TAX_YEAR_2024.all_taxes(gross_income, taxable_income, status, state_code)
}

fn validate_brackets(brackets: &[TaxBracket]) -> std::result::Result<(), String> {
    let Some(first) = brackets.first() else {
        return Err("no brackets".to_string());
    };
    if first.lower_bound != 0.0 {
        return Err("first bracket must start at 0".to_string());
    }

    for pair in brackets.windows(2) {
        match pair[0].upper_bound {
            Some(upper) if upper == pair[1].lower_bound && upper > pair[0].lower_bound => {}
            Some(_) => return Err("brackets must be contiguous and ascending".to_string()),
            None => return Err("only the last bracket may be unbounded".to_string()),
        }
    }

    if brackets.last().and_then(|b| b.upper_bound).is_some() {
        return Err("last bracket must be unbounded".to_string());
    }
    if brackets.iter().any(|b| !(0.0..=1.0).contains(&b.rate)) {
        return Err("rates must be within [0, 1]".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn federal_tax_single_fifty_thousand_walks_three_brackets() {
        // 1,160 + 4,266 + 627
        assert_approx(federal_tax(50_000.0, FilingStatus::Single), 6_053.0);
    }

    #[test]
    fn federal_tax_is_zero_at_and_below_zero_income() {
        for status in [FilingStatus::Single, FilingStatus::Married] {
            assert_approx(federal_tax(0.0, status), 0.0);
            assert_approx(federal_tax(-25_000.0, status), 0.0);
        }
    }

    #[test]
    fn federal_tax_married_uses_wider_brackets() {
        // 2,320 + (50,000 - 23,200) * 0.12
        assert_approx(federal_tax(50_000.0, FilingStatus::Married), 5_536.0);
    }

    #[test]
    fn federal_tax_top_bracket_is_unbounded() {
        let table = TaxTable::default();
        let at_top = table.federal_tax(609_350.0, FilingStatus::Single);
        let above = table.federal_tax(709_350.0, FilingStatus::Single);
        assert_approx(above - at_top, 37_000.0);
    }

    #[test]
    fn marginal_rate_uses_strict_lower_bound() {
        assert_approx(marginal_rate(0.0, FilingStatus::Single), 0.10);
        assert_approx(marginal_rate(-1.0, FilingStatus::Married), 0.10);
        assert_approx(marginal_rate(11_600.0, FilingStatus::Single), 0.10);
        assert_approx(marginal_rate(11_600.01, FilingStatus::Single), 0.12);
        assert_approx(marginal_rate(50_000.0, FilingStatus::Single), 0.22);
        assert_approx(marginal_rate(1_000_000.0, FilingStatus::Married), 0.37);
    }

    #[test]
    fn effective_rate_guards_zero_gross_and_keeps_negative_tax() {
        assert_approx(effective_rate(1_000.0, 0.0), 0.0);
        assert_approx(effective_rate(1_000.0, -5.0), 0.0);
        assert_approx(effective_rate(1_000.0, 10_000.0), 10.0);
        assert_approx(effective_rate(-500.0, 10_000.0), -5.0);
    }

    #[test]
    fn state_rate_distinguishes_unknown_from_zero() {
        let table = TaxTable::default();
        assert_eq!(table.state_rate("TX"), StateRate::Known(0.0));
        assert_eq!(table.state_rate(" ca "), StateRate::Known(0.093));
        assert_eq!(table.state_rate("ZZ"), StateRate::Unknown);
        assert_eq!(table.state_rate(""), StateRate::Unknown);
        assert_approx(table.state_tax(100_000.0, "ZZ"), 0.0);
        assert_approx(table.state_tax(100_000.0, "ny"), 6_850.0);
    }

    #[test]
    fn social_security_is_capped_at_wage_base() {
        let payroll = payroll_taxes(200_000.0, FilingStatus::Single);
        assert_approx(payroll.social_security, 10_453.2);
        assert_approx(payroll.additional_medicare, 0.0);
    }

    #[test]
    fn additional_medicare_applies_only_above_status_threshold() {
        let single = payroll_taxes(250_000.0, FilingStatus::Single);
        assert_approx(single.medicare, 3_625.0);
        assert_approx(single.additional_medicare, 450.0);

        let married = payroll_taxes(250_000.0, FilingStatus::Married);
        assert_approx(married.additional_medicare, 0.0);
    }

    #[test]
    fn payroll_taxes_on_negative_income_are_zero() {
        let payroll = payroll_taxes(-10.0, FilingStatus::Single);
        assert_approx(payroll.total(), 0.0);
    }

    #[test]
    fn taxable_income_subtracts_deductions_and_floors_at_zero() {
        assert_approx(taxable_income(80_000.0, FilingStatus::Single, 5_000.0), 60_400.0);
        assert_approx(taxable_income(20_000.0, FilingStatus::Married, 0.0), 0.0);
    }

    #[test]
    fn all_taxes_composes_breakdown() {
        let table = TaxTable::default();
        let gross = 80_000.0;
        let taxable = table.taxable_income(gross, FilingStatus::Single, 0.0);
        let breakdown = table.all_taxes(gross, taxable, FilingStatus::Single, "CA");

        let federal = table.federal_tax(taxable, FilingStatus::Single);
        assert_approx(breakdown.federal, federal);
        assert_approx(breakdown.state, taxable * 0.093);
        assert_approx(breakdown.social_security, gross * 0.062);
        assert_approx(breakdown.medicare, gross * 0.0145);
        assert_approx(
            breakdown.total_tax,
            breakdown.federal
                + breakdown.state
                + breakdown.social_security
                + breakdown.medicare
                + breakdown.additional_medicare,
        );
        assert_approx(breakdown.net_income, gross - breakdown.total_tax);
        assert_approx(breakdown.effective_rate, breakdown.total_tax / gross * 100.0);
        assert_approx(breakdown.marginal_rate, 22.0);
        assert!(breakdown.state_recognized);
    }

    #[test]
    fn all_taxes_with_unknown_state_flags_it() {
        let breakdown = all_taxes(60_000.0, 45_400.0, FilingStatus::Single, "??");
        assert_approx(breakdown.state, 0.0);
        assert!(!breakdown.state_recognized);
    }

    #[test]
    fn take_home_on_zero_income_is_zero() {
        let breakdown = TaxTable::default().take_home(0.0, FilingStatus::Married, "OR", 0.0);
        assert_approx(breakdown.total_tax, 0.0);
        assert_approx(breakdown.net_income, 0.0);
        assert_approx(breakdown.effective_rate, 0.0);
    }

    #[test]
    fn free_functions_share_one_2024_table() {
        let first: *const TaxTable = &*TAX_YEAR_2024;
        let second: *const TaxTable = &*TAX_YEAR_2024;
        assert!(std::ptr::eq(first, second));

        let table = TaxTable::tax_year_2024();
        let status = FilingStatus::Married;
        assert_approx(federal_tax(150_000.0, status), table.federal_tax(150_000.0, status));
        assert_approx(state_tax(80_000.0, "CO"), table.state_tax(80_000.0, "CO"));
        assert_approx(
            taxable_income(120_000.0, status, 5_000.0),
            table.taxable_income(120_000.0, status, 5_000.0),
        );
    }

    #[test]
    fn default_table_validates() {
        TaxTable::default().validate().expect("embedded table is valid");
    }

    #[test]
    fn validate_rejects_gapped_brackets() {
        let mut table = TaxTable::default();
        table.brackets.single[1].lower_bound = 12_000.0;
        let err = table.validate().expect_err("gap must be rejected");
        assert!(err.to_string().contains("contiguous"));
    }

    #[test]
    fn validate_rejects_bounded_top_bracket() {
        let mut table = TaxTable::default();
        if let Some(last) = table.brackets.married.last_mut() {
            last.upper_bound = Some(1_000_000.0);
        }
        assert!(table.validate().is_err());
    }

    #[test]
    fn table_round_trips_through_json() {
        let table = TaxTable::default();
        let json = serde_json::to_string(&table).expect("serialize");
        let parsed: TaxTable = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, table);
    }

    #[test]
    fn from_json_file_loads_and_validates() {
        let dir = std::env::temp_dir().join(format!("finplan-tax-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");

        let good = dir.join("good.json");
        let mut table = TaxTable::default();
        table.tax_year = 2025;
        std::fs::write(&good, serde_json::to_string(&table).expect("serialize")).expect("write");
        let loaded = TaxTable::from_json_file(&good).expect("load");
        assert_eq!(loaded.tax_year, 2025);

        let bad = dir.join("bad.json");
        table.brackets.single.clear();
        std::fs::write(&bad, serde_json::to_string(&table).expect("serialize")).expect("write");
        assert!(matches!(
            TaxTable::from_json_file(&bad),
            Err(PlannerError::InvalidTaxTable(_))
        ));

        assert!(matches!(
            TaxTable::from_json_file(&dir.join("missing.json")),
            Err(PlannerError::Io(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn swapped_table_changes_results() {
        let mut table = TaxTable::default();
        for bracket in &mut table.brackets.single {
            bracket.rate = 0.10;
        }
        assert_approx_tol(table.federal_tax(50_000.0, FilingStatus::Single), 5_000.0, 1e-9);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_federal_tax_is_monotone_non_decreasing(
            low in 0u32..1_000_000,
            delta in 0u32..200_000,
            married in proptest::bool::ANY
        ) {
            let status = if married { FilingStatus::Married } else { FilingStatus::Single };
            let a = federal_tax(low as f64, status);
            let b = federal_tax((low + delta) as f64, status);
            prop_assert!(b + 1e-9 >= a);
        }

        #[test]
        fn prop_marginal_rate_is_monotone_and_from_table(
            low in 0u32..1_000_000,
            delta in 0u32..200_000,
            married in proptest::bool::ANY
        ) {
            let status = if married { FilingStatus::Married } else { FilingStatus::Single };
            let table = TaxTable::default();
            let a = table.marginal_rate(low as f64, status);
            let b = table.marginal_rate((low + delta) as f64, status);
            prop_assert!(b >= a);
            prop_assert!(table.brackets.for_status(status).iter().any(|br| br.rate == b));
        }

        #[test]
        fn prop_federal_tax_never_exceeds_top_rate(income in 0u32..5_000_000) {
            let tax = federal_tax(income as f64, FilingStatus::Single);
            prop_assert!(tax >= 0.0);
            prop_assert!(tax <= income as f64 * 0.37 + 1e-6);
        }
    }
}
