//! Finance endpoints: transactions, budgets, goals and the period summary

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use lico_common::events::AutomationEvent;
use lico_common::time::start_of_month;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::auth::AuthSession;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::validate::{
    one_of, optional_text, optional_timestamp, positive_amount, required_text, timestamp,
};
use crate::db::finance::{
    self, Budget, FinancialGoal, GoalUpdate, NewGoal, NewTransaction, Transaction,
    TransactionFilter,
};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{PageQuery, Pagination};
use crate::services::finance_summary::{compute_summary, narrate, FinanceSummary, Period};
use crate::AppState;

const TRANSACTION_KINDS: &[&str] = &["income", "expense"];
const BUDGET_PERIODS: &[&str] = &["weekly", "monthly", "yearly"];

// ========================================
// Transactions
// ========================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<Transaction>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    /// Defaults to now
    pub date: Option<String>,
    pub notes: Option<String>,
}

/// Inclusive upper bound: a bare YYYY-MM-DD covers the whole day
fn end_bound(value: Option<&str>) -> ApiResult<Option<DateTime<Utc>>> {
    let end = optional_timestamp("endDate", value)?;
    let date_only = value.map(|v| v.trim().len() == 10).unwrap_or(false);
    Ok(end.map(|e| {
        if date_only {
            e + Duration::days(1) - Duration::milliseconds(1)
        } else {
            e
        }
    }))
}

/// Budgets whose limit lies in `[before, after)`, i.e. that this expense pushed over
pub fn crossed_budgets(budgets: &[Budget], before: f64, after: f64) -> Vec<&Budget> {
    budgets
        .iter()
        .filter(|b| before <= b.amount && b.amount < after)
        .collect()
}

/// GET /api/finance/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiQuery(query): ApiQuery<TransactionListQuery>,
) -> ApiResult<Json<TransactionListResponse>> {
    let filter = TransactionFilter {
        kind: query
            .kind
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(|k| one_of("type", k, TRANSACTION_KINDS))
            .transpose()?,
        category: query.category.filter(|c| !c.trim().is_empty()),
        start: optional_timestamp("startDate", query.start_date.as_deref())?,
        end: end_bound(query.end_date.as_deref())?,
    };
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };

    let total = finance::count_transactions(&state.db, session.user.id, &filter).await?;
    let pagination = page.paginate(total);
    let transactions = finance::list_transactions(
        &state.db,
        session.user.id,
        &filter,
        pagination.limit,
        pagination.offset,
    )
    .await?;

    Ok(Json(TransactionListResponse {
        transactions,
        pagination,
    }))
}

/// POST /api/finance/transactions
///
/// Emits `transaction.created`; an expense that pushes this month's category
/// total over a budget also emits `budget.exceeded`.
pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<CreateTransactionRequest>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let now = Utc::now();
    let new = NewTransaction {
        description: required_text("description", &req.description, 200)?,
        amount: positive_amount("amount", req.amount)?,
        kind: one_of("type", &req.kind, TRANSACTION_KINDS)?,
        category: required_text("category", &req.category, 100)?,
        date: match req.date.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(d) => timestamp("date", d)?,
            None => now,
        },
        notes: optional_text("notes", req.notes, 1000)?,
    };

    let tx = finance::insert_transaction(&state.db, session.user.id, &new).await?;

    state.event_bus.emit_lossy(AutomationEvent::TransactionCreated {
        user_id: tx.user_id,
        transaction_id: tx.id,
        description: tx.description.clone(),
        amount: tx.amount,
        kind: tx.kind.clone(),
        category: tx.category.clone(),
        timestamp: tx.created_at,
    });

    let month_start = start_of_month(now);
    if tx.kind == "expense" && tx.date >= month_start && tx.date <= now {
        let budgets = finance::budgets_for_category(&state.db, tx.user_id, &tx.category).await?;
        if !budgets.is_empty() {
            let after =
                finance::expense_total(&state.db, tx.user_id, &tx.category, month_start, now).await?;
            let before = after - tx.amount;
            for budget in crossed_budgets(&budgets, before, after) {
                info!(user_id = %tx.user_id, budget = %budget.name, spent = after, "Budget exceeded");
                state.event_bus.emit_lossy(AutomationEvent::BudgetExceeded {
                    user_id: tx.user_id,
                    budget_id: budget.id,
                    budget_name: budget.name.clone(),
                    category: budget.category.clone(),
                    spent: after,
                    limit: budget.amount,
                    timestamp: now,
                });
            }
        }
    }

    Ok((StatusCode::CREATED, Json(tx)))
}

// ========================================
// Budgets
// ========================================

#[derive(Debug, Serialize)]
pub struct BudgetListResponse {
    pub budgets: Vec<Budget>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    pub name: String,
    pub category: String,
    pub amount: f64,
    pub period: Option<String>,
}

/// GET /api/finance/budgets
pub async fn list_budgets(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<BudgetListResponse>> {
    let budgets = finance::list_budgets(&state.db, session.user.id).await?;
    Ok(Json(BudgetListResponse { budgets }))
}

/// POST /api/finance/budgets
pub async fn create_budget(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<CreateBudgetRequest>,
) -> ApiResult<(StatusCode, Json<Budget>)> {
    let name = required_text("name", &req.name, 100)?;
    let category = required_text("category", &req.category, 100)?;
    let amount = positive_amount("amount", req.amount)?;
    let period = one_of("period", req.period.as_deref().unwrap_or("monthly"), BUDGET_PERIODS)?;

    let budget =
        finance::insert_budget(&state.db, session.user.id, &name, &category, amount, &period).await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

// ========================================
// Goals
// ========================================

#[derive(Debug, Serialize)]
pub struct GoalListResponse {
    pub goals: Vec<FinancialGoal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    pub deadline: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub deadline: Option<String>,
}

fn non_negative(field: &str, value: f64) -> ApiResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::BadRequest(format!("{} cannot be negative", field)));
    }
    Ok(value)
}

/// GET /api/finance/goals
pub async fn list_goals(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<GoalListResponse>> {
    let goals = finance::list_goals(&state.db, session.user.id).await?;
    Ok(Json(GoalListResponse { goals }))
}

/// POST /api/finance/goals
pub async fn create_goal(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<CreateGoalRequest>,
) -> ApiResult<(StatusCode, Json<FinancialGoal>)> {
    let new = NewGoal {
        title: required_text("title", &req.title, 200)?,
        description: optional_text("description", req.description, 1000)?,
        category: optional_text("category", req.category, 100)?,
        target_amount: positive_amount("targetAmount", req.target_amount)?,
        current_amount: non_negative("currentAmount", req.current_amount)?,
        deadline: optional_timestamp("deadline", req.deadline.as_deref())?,
    };

    let goal = finance::insert_goal(&state.db, session.user.id, &new).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

/// PUT /api/finance/goals/:id
///
/// Emits `goal.completed` when this update reaches the target.
pub async fn update_goal(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateGoalRequest>,
) -> ApiResult<Json<FinancialGoal>> {
    let update = GoalUpdate {
        title: req
            .title
            .map(|t| required_text("title", &t, 200))
            .transpose()?,
        description: optional_text("description", req.description, 1000)?,
        target_amount: req
            .target_amount
            .map(|a| positive_amount("targetAmount", a))
            .transpose()?,
        current_amount: req
            .current_amount
            .map(|a| non_negative("currentAmount", a))
            .transpose()?,
        deadline: optional_timestamp("deadline", req.deadline.as_deref())?,
    };

    let (before, after) = finance::update_goal(&state.db, session.user.id, id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Goal not found".to_string()))?;

    if !before.completed && after.completed {
        info!(user_id = %after.user_id, goal_id = %after.id, "Goal completed");
        state.event_bus.emit_lossy(AutomationEvent::GoalCompleted {
            user_id: after.user_id,
            goal_id: after.id,
            title: after.title.clone(),
            category: after.category.clone(),
            timestamp: after.updated_at,
        });
    }

    Ok(Json(after))
}

// ========================================
// Summary
// ========================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub period: Option<String>,
    /// Ask the LLM for a short narrative
    #[serde(default)]
    pub ai_insights: bool,
}

/// GET /api/finance/summary
pub async fn get_summary(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> ApiResult<Json<FinanceSummary>> {
    let now = Utc::now();
    let period = Period::parse(query.period.as_deref());
    let user_id = session.user.id;

    let (transactions, budgets, goals) = tokio::try_join!(
        finance::transactions_since(&state.db, user_id, period.start(now)),
        finance::list_budgets(&state.db, user_id),
        finance::list_goals(&state.db, user_id),
    )?;

    let mut summary = compute_summary(period, now, transactions, &budgets, &goals);
    if query.ai_insights {
        summary.ai_insights = Some(narrate(state.llm.as_ref(), &summary).await);
    }

    Ok(Json(summary))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/finance/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/api/finance/budgets", get(list_budgets).post(create_budget))
        .route("/api/finance/goals", get(list_goals).post(create_goal))
        .route("/api/finance/goals/:id", put(update_goal))
        .route("/api/finance/summary", get(get_summary))
}
