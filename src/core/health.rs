use super::types::{BudgetCategory, CategoryReport, HealthReport, SpendStatus};

const OVERAGE_PENALTY_PER_POINT: f64 = 3.0;
const UNDERUSE_SCORE: f64 = 90.0;

pub fn default_categories() -> Vec<BudgetCategory> {
    vec![
        BudgetCategory::new("Housing", 0.30, false),
        BudgetCategory::new("Transportation", 0.15, false),
        BudgetCategory::new("Food", 0.12, false),
        BudgetCategory::new("Utilities", 0.10, false),
        BudgetCategory::new("Insurance", 0.10, false),
        BudgetCategory::new("Healthcare", 0.05, false),
        BudgetCategory::new("Personal", 0.05, false),
        BudgetCategory::new("Entertainment", 0.05, false),
        BudgetCategory::new("Debt Payments", 0.05, false),
        BudgetCategory::new("Savings", 0.20, true),
    ]
}

pub fn percent_of_income(annual_amount: f64, annual_net_income: f64) -> f64 {
    if annual_net_income <= 0.0 {
        return 0.0;
    }
    annual_amount / annual_net_income * 100.0
}

pub fn category_score(actual_percent: f64, recommended_percent: f64) -> f64 {
    if actual_percent <= recommended_percent {
        if actual_percent < recommended_percent / 2.0 {
            UNDERUSE_SCORE
        } else {
            100.0
        }
    } else {
        let overage = actual_percent - recommended_percent;
        (100.0 - overage * OVERAGE_PENALTY_PER_POINT).max(0.0)
    }
}

pub fn savings_bonus(savings_rate_percent: f64) -> f64 {
    if savings_rate_percent >= 20.0 {
        10.0
    } else if savings_rate_percent >= 15.0 {
        5.0
    } else {
        0.0
    }
}

pub fn evaluate(categories: &[BudgetCategory], annual_net_income: f64) -> HealthReport {
    let mut reports = Vec::with_capacity(categories.len());
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut planned_savings = 0.0;
    let mut total_spend = 0.0;

    for category in categories {
        let monthly_total = category.monthly_total();
        let annual_total = monthly_total * 12.0;
        let actual_percent = percent_of_income(annual_total, annual_net_income);
        let recommended_percent = category.recommended_share * 100.0;
        total_spend += annual_total;

        let score = if category.is_savings {
            planned_savings += annual_total;
            None
        } else {
            let score = category_score(actual_percent, recommended_percent);
            weighted_sum += score * recommended_percent;
            weight_total += recommended_percent;
            Some(score)
        };

        reports.push(CategoryReport {
            label: category.label.clone(),
            monthly_total,
            annual_total,
            actual_percent,
            recommended_percent,
            status: spend_status(annual_total, actual_percent, recommended_percent),
            score,
        });
    }

    let unallocated_surplus = (annual_net_income - total_spend).max(0.0);
    let savings_rate = percent_of_income(planned_savings + unallocated_surplus, annual_net_income);

    let base = if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        0.0
    };
    let score = (base + savings_bonus(savings_rate)).clamp(0.0, 100.0).round() as u8;

    HealthReport {
        categories: reports,
        unallocated_surplus,
        savings_rate,
        score,
    }
}

fn spend_status(annual_total: f64, actual_percent: f64, recommended_percent: f64) -> SpendStatus {
    if annual_total == 0.0 {
        SpendStatus::Zero
    } else if actual_percent > recommended_percent {
        SpendStatus::Over
    } else {
        SpendStatus::Under
    }
}
