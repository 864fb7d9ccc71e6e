//! Transactions, budgets and financial goals

use super::get_guid;
use chrono::{DateTime, Utc};
use lico_common::Result;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub amount: f64,
    /// income or expense
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    pub kind: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<String>,
    pub category: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category: String,
    pub amount: f64,
    pub period: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub target_amount: f64,
    pub current_amount: f64,
    pub deadline: Option<DateTime<Utc>>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub target_amount: f64,
    pub current_amount: f64,
    pub deadline: Option<DateTime<Utc>>,
}

/// Partial goal update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
}

const TRANSACTION_COLUMNS: &str =
    "guid, user_id, description, amount, kind, category, date, notes, created_at";
const GOAL_COLUMNS: &str = "guid, user_id, title, description, category, target_amount, current_amount, deadline, completed, created_at, updated_at";

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction> {
    Ok(Transaction {
        id: get_guid(row, "guid")?,
        user_id: get_guid(row, "user_id")?,
        description: row.try_get("description")?,
        amount: row.try_get("amount")?,
        kind: row.try_get("kind")?,
        category: row.try_get("category")?,
        date: row.try_get("date")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
    })
}

fn budget_from_row(row: &SqliteRow) -> Result<Budget> {
    Ok(Budget {
        id: get_guid(row, "guid")?,
        user_id: get_guid(row, "user_id")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        amount: row.try_get("amount")?,
        period: row.try_get("period")?,
        created_at: row.try_get("created_at")?,
    })
}

fn goal_from_row(row: &SqliteRow) -> Result<FinancialGoal> {
    Ok(FinancialGoal {
        id: get_guid(row, "guid")?,
        user_id: get_guid(row, "user_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        target_amount: row.try_get("target_amount")?,
        current_amount: row.try_get("current_amount")?,
        deadline: row.try_get("deadline")?,
        completed: row.try_get("completed")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn push_transaction_filter(
    qb: &mut QueryBuilder<'_, Sqlite>,
    user_id: Uuid,
    filter: &TransactionFilter,
) {
    qb.push(" WHERE user_id = ").push_bind(user_id.to_string());
    if let Some(kind) = &filter.kind {
        qb.push(" AND kind = ").push_bind(kind.clone());
    }
    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(start) = filter.start {
        qb.push(" AND date >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        qb.push(" AND date <= ").push_bind(end);
    }
}

// ========================================
// Transactions
// ========================================

pub async fn insert_transaction(
    pool: &SqlitePool,
    user_id: Uuid,
    new: &NewTransaction,
) -> Result<Transaction> {
    let tx = Transaction {
        id: Uuid::new_v4(),
        user_id,
        description: new.description.clone(),
        amount: new.amount,
        kind: new.kind.clone(),
        category: new.category.clone(),
        date: new.date,
        notes: new.notes.clone(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO transactions (guid, user_id, description, amount, kind, category, date, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(tx.id.to_string())
    .bind(user_id.to_string())
    .bind(&tx.description)
    .bind(tx.amount)
    .bind(&tx.kind)
    .bind(&tx.category)
    .bind(tx.date)
    .bind(&tx.notes)
    .bind(tx.created_at)
    .execute(pool)
    .await?;

    Ok(tx)
}

pub async fn count_transactions(
    pool: &SqlitePool,
    user_id: Uuid,
    filter: &TransactionFilter,
) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM transactions");
    push_transaction_filter(&mut qb, user_id, filter);
    let count: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

/// Page of transactions, most recent date first
pub async fn list_transactions(
    pool: &SqlitePool,
    user_id: Uuid,
    filter: &TransactionFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Transaction>> {
    let mut qb =
        QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM transactions", TRANSACTION_COLUMNS));
    push_transaction_filter(&mut qb, user_id, filter);
    qb.push(" ORDER BY date DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(transaction_from_row).collect()
}

/// All transactions dated on or after `since`
pub async fn transactions_since(
    pool: &SqlitePool,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> Result<Vec<Transaction>> {
    let filter = TransactionFilter {
        start: Some(since),
        ..Default::default()
    };
    let mut qb =
        QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM transactions", TRANSACTION_COLUMNS));
    push_transaction_filter(&mut qb, user_id, &filter);
    qb.push(" ORDER BY date DESC");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(transaction_from_row).collect()
}

/// Sum of expenses in a category dated within `since..=until`
pub async fn expense_total(
    pool: &SqlitePool,
    user_id: Uuid,
    category: &str,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<f64> {
    let total: f64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(amount), 0.0)
        FROM transactions
        WHERE user_id = ? AND kind = 'expense' AND category = ? AND date >= ? AND date <= ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(category)
    .bind(since)
    .bind(until)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

// ========================================
// Budgets
// ========================================

pub async fn insert_budget(
    pool: &SqlitePool,
    user_id: Uuid,
    name: &str,
    category: &str,
    amount: f64,
    period: &str,
) -> Result<Budget> {
    let budget = Budget {
        id: Uuid::new_v4(),
        user_id,
        name: name.to_string(),
        category: category.to_string(),
        amount,
        period: period.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO budgets (guid, user_id, name, category, amount, period, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(budget.id.to_string())
    .bind(user_id.to_string())
    .bind(&budget.name)
    .bind(&budget.category)
    .bind(budget.amount)
    .bind(&budget.period)
    .bind(budget.created_at)
    .execute(pool)
    .await?;

    Ok(budget)
}

pub async fn list_budgets(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Budget>> {
    let rows = sqlx::query(
        "SELECT guid, user_id, name, category, amount, period, created_at FROM budgets WHERE user_id = ? ORDER BY name ASC",
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(budget_from_row).collect()
}

pub async fn budgets_for_category(
    pool: &SqlitePool,
    user_id: Uuid,
    category: &str,
) -> Result<Vec<Budget>> {
    let rows = sqlx::query(
        "SELECT guid, user_id, name, category, amount, period, created_at FROM budgets WHERE user_id = ? AND category = ?",
    )
    .bind(user_id.to_string())
    .bind(category)
    .fetch_all(pool)
    .await?;

    rows.iter().map(budget_from_row).collect()
}

// ========================================
// Goals
// ========================================

pub async fn insert_goal(pool: &SqlitePool, user_id: Uuid, new: &NewGoal) -> Result<FinancialGoal> {
    let now = Utc::now();
    let goal = FinancialGoal {
        id: Uuid::new_v4(),
        user_id,
        title: new.title.clone(),
        description: new.description.clone(),
        category: new.category.clone(),
        target_amount: new.target_amount,
        current_amount: new.current_amount,
        deadline: new.deadline,
        completed: new.current_amount >= new.target_amount,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(&format!(
        "INSERT INTO financial_goals ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        GOAL_COLUMNS
    ))
    .bind(goal.id.to_string())
    .bind(user_id.to_string())
    .bind(&goal.title)
    .bind(&goal.description)
    .bind(&goal.category)
    .bind(goal.target_amount)
    .bind(goal.current_amount)
    .bind(goal.deadline)
    .bind(goal.completed)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(goal)
}

pub async fn list_goals(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<FinancialGoal>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM financial_goals WHERE user_id = ? ORDER BY created_at DESC",
        GOAL_COLUMNS
    ))
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(goal_from_row).collect()
}

pub async fn get_goal(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<Option<FinancialGoal>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM financial_goals WHERE guid = ? AND user_id = ?",
        GOAL_COLUMNS
    ))
    .bind(id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(goal_from_row).transpose()
}

/// Apply a partial update and recompute `completed`
///
/// Returns the goal before and after the update so callers can detect the
/// transition to completed.
pub async fn update_goal(
    pool: &SqlitePool,
    user_id: Uuid,
    id: Uuid,
    update: &GoalUpdate,
) -> Result<Option<(FinancialGoal, FinancialGoal)>> {
    let Some(before) = get_goal(pool, user_id, id).await? else {
        return Ok(None);
    };

    let mut after = before.clone();
    if let Some(title) = &update.title {
        after.title = title.clone();
    }
    if let Some(description) = &update.description {
        after.description = Some(description.clone());
    }
    if let Some(target) = update.target_amount {
        after.target_amount = target;
    }
    if let Some(current) = update.current_amount {
        after.current_amount = current;
    }
    if let Some(deadline) = update.deadline {
        after.deadline = Some(deadline);
    }
    after.completed = after.current_amount >= after.target_amount;
    after.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE financial_goals
        SET title = ?, description = ?, target_amount = ?, current_amount = ?,
            deadline = ?, completed = ?, updated_at = ?
        WHERE guid = ? AND user_id = ?
        "#,
    )
    .bind(&after.title)
    .bind(&after.description)
    .bind(after.target_amount)
    .bind(after.current_amount)
    .bind(after.deadline)
    .bind(after.completed)
    .bind(after.updated_at)
    .bind(id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    Ok(Some((before, after)))
}
