use rayon::prelude::*;
use tracing::debug;

use super::random::{SeededRng, UniformSource, derive_seed, sample_annual_return};
use super::types::{
    AccountSettings, AccountYear, ContributionLimits, MeanYear, MonteCarloConfig,
    MonteCarloSummary, RetirementProfile, ReturnMode, SimulationYearRecord,
};

#[derive(Debug, Clone, Copy)]
struct Balances {
    traditional_401k: f64,
    roth: f64,
    employer_stock: f64,
}

#[derive(Debug, Clone, Copy)]
struct ContributionFlow {
    traditional_401k: f64,
    roth: f64,
    employer_stock: f64,
}

pub fn project<R: UniformSource + ?Sized>(
    profile: &RetirementProfile,
    limits: &ContributionLimits,
    mode: ReturnMode,
    source: &mut R,
) -> Vec<SimulationYearRecord> {
    let mut records = Vec::with_capacity(year_count(profile));
    let mut balances = Balances {
        traditional_401k: profile.traditional_401k.start_balance,
        roth: profile.roth.start_balance,
        employer_stock: profile.employer_stock.start_balance,
    };
    let mut salary = profile.salary.max(0.0);
    let mut tenure = profile.tenure_years.max(0.0);
    let mut year = profile.start_year;

    for age in profile.current_age..=profile.retirement_age {
        let contributions = yearly_contributions(profile, limits, salary);

        let traditional_401k = apply_year(
            &mut balances.traditional_401k,
            &profile.traditional_401k,
            contributions.traditional_401k,
            mode,
            source,
        );
        let roth = apply_year(
            &mut balances.roth,
            &profile.roth,
            contributions.roth,
            mode,
            source,
        );
        let employer_stock = apply_year(
            &mut balances.employer_stock,
            &profile.employer_stock,
            contributions.employer_stock,
            mode,
            source,
        );

        let vested_stock_balance =
            balances.employer_stock * vesting_fraction(tenure, profile.vesting_period_years);

        records.push(SimulationYearRecord {
            age,
            year,
            salary,
            traditional_401k,
            roth,
            employer_stock,
            vested_stock_balance,
            total_retirement_balance: balances.traditional_401k
                + balances.roth
                + vested_stock_balance,
        });

        salary *= (1.0 + profile.raise_rate) * (1.0 + profile.inflation_rate);
        tenure += 1.0;
        year = year.saturating_add(1);
    }

    records
}

pub fn project_deterministic(
    profile: &RetirementProfile,
    limits: &ContributionLimits,
) -> Vec<SimulationYearRecord> {
    // Deterministic mode never draws; any seed will do.
    let mut rng = SeededRng::new(0);
    project(profile, limits, ReturnMode::Deterministic, &mut rng)
}

pub fn run_monte_carlo(
    profile: &RetirementProfile,
    limits: &ContributionLimits,
    config: &MonteCarloConfig,
) -> MonteCarloSummary {
    debug!(
        runs = config.runs,
        seed = config.seed,
        "starting monte carlo projection"
    );

    let totals: Vec<Vec<f64>> = (0..config.runs)
        .into_par_iter()
        .map(|run_id| {
            let mut rng = SeededRng::new(derive_seed(config.seed, run_id));
            project(profile, limits, ReturnMode::Stochastic, &mut rng)
                .iter()
                .map(|record| record.total_retirement_balance)
                .collect()
        })
        .collect();

    let mut sums = vec![0.0; year_count(profile)];
    for run in &totals {
        for (sum, value) in sums.iter_mut().zip(run) {
            *sum += value;
        }
    }

    let mean_trajectory = sums
        .iter()
        .enumerate()
        .map(|(idx, sum)| MeanYear {
            age: profile.current_age.saturating_add(idx as u32),
            year: profile.start_year.saturating_add(idx as i32),
            mean_total_balance: if totals.is_empty() {
                0.0
            } else {
                sum / totals.len() as f64
            },
        })
        .collect::<Vec<_>>();

    let mut finals = totals
        .iter()
        .filter_map(|run| run.last().copied())
        .collect::<Vec<_>>();

    let summary = MonteCarloSummary {
        runs: config.runs,
        mean_trajectory,
        final_p10: percentile(&mut finals, 10.0),
        final_median: percentile(&mut finals, 50.0),
        final_p90: percentile(&mut finals, 90.0),
    };
    debug!(
        final_median = summary.final_median,
        "finished monte carlo projection"
    );
    summary
}

/// Rows produced for `current_age..=retirement_age`; zero when already past retirement.
pub fn year_count(profile: &RetirementProfile) -> usize {
    if profile.current_age > profile.retirement_age {
        return 0;
    }
    ((profile.retirement_age - profile.current_age) as usize).saturating_add(1)
}

pub fn vesting_fraction(tenure_years: f64, vesting_period_years: f64) -> f64 {
    if vesting_period_years <= 0.0 {
        return 1.0;
    }
    (tenure_years.max(0.0) / vesting_period_years).min(1.0)
}

fn yearly_contributions(
    profile: &RetirementProfile,
    limits: &ContributionLimits,
    salary: f64,
) -> ContributionFlow {
    let employee_401k =
        capped(salary * profile.traditional_401k.contribution_rate, limits.traditional_401k);
    let employer_match = (salary * profile.employer_match_rate).max(0.0);
    let stock_requested = salary * profile.employer_stock.contribution_rate;

    ContributionFlow {
        traditional_401k: employee_401k + employer_match,
        roth: capped(salary * profile.roth.contribution_rate, limits.ira),
        employer_stock: match limits.employer_stock {
            Some(limit) => capped(stock_requested, limit),
            None => stock_requested.max(0.0),
        },
    }
}

fn capped(requested: f64, limit: f64) -> f64 {
    requested.min(limit).max(0.0)
}

fn apply_year<R: UniformSource + ?Sized>(
    balance: &mut f64,
    settings: &AccountSettings,
    contribution: f64,
    mode: ReturnMode,
    source: &mut R,
) -> AccountYear {
    let rate = match mode {
        ReturnMode::Deterministic => settings.expected_return_percent / 100.0,
        ReturnMode::Stochastic => sample_annual_return(
            source,
            settings.expected_return_percent,
            settings.variance_percent,
        ),
    };

    let appreciation = *balance * rate;
    *balance += appreciation + contribution;

    AccountYear {
        contribution,
        appreciation,
        balance: *balance,
    }
}

fn percentile(values: &mut [f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}
