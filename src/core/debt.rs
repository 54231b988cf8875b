use super::types::{DebtAccount, DebtAccounts, DebtKind, PayoffSchedule};

pub fn amortize_one_period(balance: f64, period_rate: f64, payment: f64) -> f64 {
    if balance <= 0.0 {
        return balance;
    }

    let interest = balance * period_rate;
    let principal = payment - interest;
    if principal < 0.0 {
        return balance - principal;
    }

    (balance - principal.min(balance)).max(0.0)
}

pub fn amortize_account(account: &DebtAccount) -> DebtAccount {
    DebtAccount {
        balance: amortize_one_period(
            account.balance,
            account.monthly_rate,
            account.monthly_payment,
        ),
        ..*account
    }
}

pub fn amortize_account_set(accounts: &DebtAccounts) -> DebtAccounts {
    let mut next = *accounts;
    for kind in DebtKind::ALL {
        *next.get_mut(kind) = amortize_account(accounts.get(kind));
    }
    next
}

pub fn payoff_schedule(account: &DebtAccount, max_periods: u32) -> PayoffSchedule {
    let mut balance = account.balance;
    let mut total_interest = 0.0;
    let mut balances = Vec::new();

    if balance <= 0.0 {
        return PayoffSchedule {
            periods_to_payoff: Some(0),
            total_interest,
            balances,
        };
    }

    for period in 1..=max_periods {
        total_interest += balance * account.monthly_rate;
        let next = amortize_one_period(balance, account.monthly_rate, account.monthly_payment);
        balances.push(next);

        if next <= 0.0 {
            return PayoffSchedule {
                periods_to_payoff: Some(period),
                total_interest,
                balances,
            };
        }
        if next >= balance {
            // Payment no longer covers interest; the balance can never reach zero.
            break;
        }
        balance = next;
    }

    PayoffSchedule {
        periods_to_payoff: None,
        total_interest,
        balances,
    }
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

    #[test]
    fn one_period_matches_hand_calculation() {
        let next = amortize_one_period(10_000.0, 0.05 / 12.0, 500.0);
        assert!((next - 9_541.67).abs() < 0.01, "got {next}");
    }

    #[test]
    fn zero_or_negative_balance_is_returned_unchanged() {
        assert_approx(amortize_one_period(0.0, 0.02, 100.0), 0.0);
        assert_approx(amortize_one_period(-50.0, 0.02, 100.0), -50.0);
    }

    #[test]
    fn zero_rate_reduces_dollar_for_dollar() {
        assert_approx(amortize_one_period(1_000.0, 0.0, 250.0), 750.0);
    }

    #[test]
    fn zero_payment_grows_by_interest() {
        assert_approx(amortize_one_period(1_000.0, 0.01, 0.0), 1_010.0);
    }

    #[test]
    fn interest_only_payment_holds_balance() {
        assert_approx(amortize_one_period(1_000.0, 0.01, 10.0), 1_000.0);
    }

    #[test]
    fn shortfall_is_added_to_balance() {
        assert_approx(amortize_one_period(1_000.0, 0.02, 5.0), 1_015.0);
    }

    #[test]
    fn overpayment_clears_to_zero_without_refund() {
        assert_approx(amortize_one_period(100.0, 0.01, 5_000.0), 0.0);
    }

    #[test]
    fn account_set_updates_each_account_independently() {
        let accounts = DebtAccounts {
            mortgage: DebtAccount {
                balance: 200_000.0,
                monthly_rate: 0.06 / 12.0,
                monthly_payment: 1_200.0,
            },
            auto: DebtAccount {
                balance: 15_000.0,
                monthly_rate: 0.0,
                monthly_payment: 300.0,
            },
            credit_card: DebtAccount {
                balance: 4_000.0,
                monthly_rate: 0.02,
                monthly_payment: 0.0,
            },
            student_loan: DebtAccount::default(),
            other: DebtAccount {
                balance: 50.0,
                monthly_rate: 0.01,
                monthly_payment: 100.0,
            },
        };

        let next = amortize_account_set(&accounts);
        assert_approx(next.mortgage.balance, 200_000.0 - (1_200.0 - 1_000.0));
        assert_approx(next.auto.balance, 14_700.0);
        assert_approx(next.credit_card.balance, 4_080.0);
        assert_approx(next.student_loan.balance, 0.0);
        assert_approx(next.other.balance, 0.0);
        assert_approx(next.credit_card.monthly_rate, 0.02);
        assert_approx(accounts.credit_card.balance, 4_000.0);
    }

    #[test]
    fn payoff_schedule_counts_periods_and_interest() {
        let account = DebtAccount {
            balance: 1_000.0,
            monthly_rate: 0.0,
            monthly_payment: 300.0,
        };
        let schedule = payoff_schedule(&account, 120);
        assert_eq!(schedule.periods_to_payoff, Some(4));
        assert_approx(schedule.total_interest, 0.0);
        assert_eq!(schedule.balances.len(), 4);
        assert_approx(schedule.balances[2], 100.0);
    }

    #[test]
    fn payoff_schedule_accrues_interest() {
        let account = DebtAccount {
            balance: 1_000.0,
            monthly_rate: 0.01,
            monthly_payment: 510.0,
        };
        let schedule = payoff_schedule(&account, 120);
        assert_eq!(schedule.periods_to_payoff, Some(2));
        // 10.00 in period one, 5.00 on the 500.00 remaining in period two.
        assert_approx(schedule.total_interest, 15.0);
    }

    #[test]
    fn payoff_schedule_reports_never_when_payment_is_too_small() {
        let account = DebtAccount {
            balance: 1_000.0,
            monthly_rate: 0.02,
            monthly_payment: 20.0,
        };
        let schedule = payoff_schedule(&account, 600);
        assert_eq!(schedule.periods_to_payoff, None);
        assert_eq!(schedule.balances.len(), 1);
    }

    #[test]
    fn payoff_schedule_for_cleared_account_is_immediate() {
        let schedule = payoff_schedule(&DebtAccount::default(), 12);
        assert_eq!(schedule.periods_to_payoff, Some(0));
        assert!(schedule.balances.is_empty());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_result_is_never_negative(
            balance in 0u32..1_000_000,
            rate_bp in 0u32..300,
            payment in 0u32..50_000
        ) {
            let next = amortize_one_period(balance as f64, rate_bp as f64 / 10_000.0, payment as f64);
            prop_assert!(next >= 0.0);
        }

        #[test]
        fn prop_identities_hold(balance in 1u32..1_000_000, rate_bp in 0u32..300, payment in 0u32..50_000) {
            let balance = balance as f64;
            let rate = rate_bp as f64 / 10_000.0;
            let interest_only = amortize_one_period(balance, rate, balance * rate);
            prop_assert!((interest_only - balance).abs() <= 1e-6);

            let no_payment = amortize_one_period(balance, rate, 0.0);
            prop_assert!((no_payment - balance * (1.0 + rate)).abs() <= 1e-6);

            let no_rate = amortize_one_period(balance, 0.0, payment as f64);
            prop_assert!((no_rate - (balance - payment as f64).max(0.0)).abs() <= 1e-6);
        }
    }
}
