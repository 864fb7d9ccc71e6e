//! Financial summary for a reporting period

use crate::db::finance::{Budget, FinancialGoal, Transaction};
use crate::llm::TextGenerator;
use chrono::{DateTime, Duration, Utc};
use lico_common::time::{start_of_month, start_of_year};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Narrative used when the LLM is unavailable
pub const NARRATIVE_FALLBACK: &str = "AI insights temporarily unavailable.";

/// Transactions included in `recentTransactions`
const RECENT_LIMIT: usize = 10;

/// Reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Year,
}

impl Period {
    /// Unknown or missing values select the month
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("week") => Period::Week,
            Some("year") => Period::Year,
            _ => Period::Month,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    /// Start of the period ending at `now`
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::Week => now - Duration::days(7),
            Period::Month => start_of_month(now),
            Period::Year => start_of_year(now),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_income: f64,
    /// Net as a percentage of income; 0 without income
    pub savings_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    #[serde(flatten)]
    pub budget: Budget,
    pub spent: f64,
    pub remaining: f64,
    pub progress: f64,
    pub is_over_budget: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    #[serde(flatten)]
    pub goal: FinancialGoal,
    pub progress: f64,
    pub remaining: f64,
    pub days_remaining: Option<i64>,
    pub is_on_track: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
    pub period: Period,
    pub date_range: DateRange,
    pub overview: Overview,
    pub expenses_by_category: BTreeMap<String, f64>,
    pub budget_progress: Vec<BudgetProgress>,
    pub goal_progress: Vec<GoalProgress>,
    pub recent_transactions: Vec<Transaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_insights: Option<String>,
}

/// Whole days until `deadline`, rounded up
fn days_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (deadline - now).num_seconds() as f64;
    (seconds / 86_400.0).ceil() as i64
}

/// Budget spending against the period's expenses
pub fn budget_progress(budget: &Budget, expenses_by_category: &BTreeMap<String, f64>) -> BudgetProgress {
    let spent = expenses_by_category.get(&budget.category).copied().unwrap_or(0.0);
    BudgetProgress {
        spent,
        remaining: budget.amount - spent,
        progress: spent / budget.amount * 100.0,
        is_over_budget: spent > budget.amount,
        budget: budget.clone(),
    }
}

/// Goal progress; on track means the progress so far is at least the
/// remaining time's share of a year
pub fn goal_progress(goal: &FinancialGoal, now: DateTime<Utc>) -> GoalProgress {
    let progress = goal.current_amount / goal.target_amount * 100.0;
    let days_remaining = goal.deadline.map(|d| days_until(d, now));
    let is_on_track = days_remaining
        .is_some_and(|days| days > 0 && progress >= days as f64 / 365.0 * 100.0);

    GoalProgress {
        progress,
        remaining: goal.target_amount - goal.current_amount,
        days_remaining,
        is_on_track,
        goal: goal.clone(),
    }
}

/// Reduce the period's rows to a summary (without narrative)
///
/// `transactions` should be newest first; rows dated after `now` are ignored.
pub fn compute_summary(
    period: Period,
    now: DateTime<Utc>,
    transactions: Vec<Transaction>,
    budgets: &[Budget],
    goals: &[FinancialGoal],
) -> FinanceSummary {
    let start = period.start(now);
    let transactions: Vec<Transaction> = transactions
        .into_iter()
        .filter(|t| t.date >= start && t.date <= now)
        .collect();

    let mut total_income = 0.0;
    let mut total_expenses = 0.0;
    let mut expenses_by_category: BTreeMap<String, f64> = BTreeMap::new();
    for tx in &transactions {
        match tx.kind.as_str() {
            "income" => total_income += tx.amount,
            "expense" => {
                total_expenses += tx.amount;
                *expenses_by_category.entry(tx.category.clone()).or_insert(0.0) += tx.amount;
            }
            _ => {}
        }
    }
    let net_income = total_income - total_expenses;

    FinanceSummary {
        period,
        date_range: DateRange { start, end: now },
        overview: Overview {
            total_income,
            total_expenses,
            net_income,
            savings_rate: if total_income > 0.0 {
                net_income / total_income * 100.0
            } else {
                0.0
            },
        },
        budget_progress: budgets
            .iter()
            .map(|b| budget_progress(b, &expenses_by_category))
            .collect(),
        goal_progress: goals.iter().map(|g| goal_progress(g, now)).collect(),
        expenses_by_category,
        recent_transactions: transactions.into_iter().take(RECENT_LIMIT).collect(),
        ai_insights: None,
    }
}

fn narrative_prompt(summary: &FinanceSummary) -> String {
    let mut categories: Vec<(&String, &f64)> = summary.expenses_by_category.iter().collect();
    categories.sort_by(|a, b| b.1.total_cmp(a.1));
    let top = categories
        .iter()
        .take(5)
        .map(|(category, amount)| format!("- {}: ${:.2}", category, amount))
        .collect::<Vec<_>>()
        .join("\n");
    let budgets = summary
        .budget_progress
        .iter()
        .map(|b| {
            format!(
                "- {} ({}): {:.1}% used, {}",
                b.budget.name,
                b.budget.category,
                b.progress,
                if b.is_over_budget { "OVER BUDGET" } else { "on track" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let goals = summary
        .goal_progress
        .iter()
        .map(|g| {
            let days = g
                .days_remaining
                .map(|d| format!("{} days remaining", d))
                .unwrap_or_else(|| "no deadline".to_string());
            format!("- {}: {:.1}% complete, {}", g.goal.title, g.progress, days)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze this financial data and provide personalized insights and actionable advice:\n\n\
         Financial Summary for {}:\n\
         - Total Income: ${:.2}\n\
         - Total Expenses: ${:.2}\n\
         - Net Income: ${:.2}\n\n\
         Top Expense Categories:\n{}\n\n\
         Budget Status:\n{}\n\n\
         Financial Goals:\n{}\n\n\
         Please provide:\n\
         1. 2-3 key insights about spending patterns\n\
         2. 2-3 actionable recommendations for improvement\n\
         3. Specific advice for achieving financial goals\n\
         4. Any concerning trends to watch\n\n\
         Keep the response concise and practical.",
        summary.period.as_str(),
        summary.overview.total_income,
        summary.overview.total_expenses,
        summary.overview.net_income,
        top,
        budgets,
        goals,
    )
}

/// LLM commentary on a summary, or the fixed fallback
pub async fn narrate(llm: &dyn TextGenerator, summary: &FinanceSummary) -> String {
    match llm.generate(&narrative_prompt(summary)).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => NARRATIVE_FALLBACK.to_string(),
        Err(e) => {
            warn!("Finance narrative failed: {}", e);
            NARRATIVE_FALLBACK.to_string()
        }
    }
}
