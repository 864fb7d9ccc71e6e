//! Proactive wellness insight aggregator
//!
//! Samples a user's recent mood, finance, habit, social and journal activity,
//! reduces it to a [`WellnessSnapshot`], renders the snapshot into a fixed
//! text template and asks the LLM for one categorized insight.
//!
//! Generation never fails from the caller's point of view: an unparseable
//! reply or an unreachable LLM yields a fixed fallback insight.

use crate::db::finance::{self, Transaction};
use crate::db::habits::{self, Habit};
use crate::db::insights::{self, Insight, InsightCategory, InsightPriority};
use crate::db::moods::{self, MoodEntry};
use crate::db::{journal, social, users};
use crate::llm::{extract_json_object, ChatMessage, TextGenerator};
use chrono::{DateTime, Duration, Utc};
use lico_common::config::InsightConfig;
use lico_common::events::{AutomationEvent, EventBus};
use lico_common::time::{whole_days_between, window_start};
use lico_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Content used when the reply JSON has no `content` field
pub const DEFAULT_INSIGHT_CONTENT: &str =
    "I noticed some patterns in your recent activity that might be worth exploring.";

/// Insight stored when the reply contains no parseable JSON object
pub const PARSE_FALLBACK_CONTENT: &str = "I noticed some interesting patterns in your recent activity. Consider taking a moment to reflect on your wellness journey.";

/// Insight stored when the LLM could not be reached
pub const LLM_FALLBACK_CONTENT: &str =
    "Your wellness journey is unique and valuable. Keep up the great work!";

/// Direction of mood over the sampled window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodTrend {
    Improving,
    Declining,
    Stable,
    #[serde(rename = "insufficient data")]
    InsufficientData,
}

impl MoodTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoodTrend::Improving => "improving",
            MoodTrend::Declining => "declining",
            MoodTrend::Stable => "stable",
            MoodTrend::InsufficientData => "insufficient data",
        }
    }
}

/// Reduced statistics over the trailing window
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WellnessSnapshot {
    pub avg_mood: f64,
    pub mood_entries: usize,
    pub mood_trend: MoodTrend,
    pub total_spending: f64,
    /// At most three (category, amount) pairs, largest first
    pub top_categories: Vec<(String, f64)>,
    pub social_posts: i64,
    pub habits_completed: usize,
    pub habits_total: usize,
    /// Percentage with one decimal, or "0" when no habits were sampled
    pub habit_completion_rate: String,
    pub journal_entries: i64,
    pub days_since_last_mood: Option<i64>,
}

/// Reduce raw window rows to a snapshot
///
/// `moods` must be ordered newest first.
pub fn compute_snapshot(
    moods: &[MoodEntry],
    transactions: &[Transaction],
    social_posts: i64,
    habits: &[Habit],
    journal_entries: i64,
    now: DateTime<Utc>,
) -> WellnessSnapshot {
    let avg_mood = if moods.is_empty() {
        0.0
    } else {
        moods.iter().map(|m| m.mood as f64).sum::<f64>() / moods.len() as f64
    };

    let mood_trend = match (moods.first(), moods.last()) {
        (Some(newest), Some(oldest)) if moods.len() >= 2 => {
            if newest.mood < oldest.mood {
                MoodTrend::Declining
            } else if newest.mood > oldest.mood {
                MoodTrend::Improving
            } else {
                MoodTrend::Stable
            }
        }
        _ => MoodTrend::InsufficientData,
    };

    let mut by_category: HashMap<&str, f64> = HashMap::new();
    let mut total_spending = 0.0;
    for tx in transactions.iter().filter(|t| t.kind == "expense") {
        total_spending += tx.amount;
        *by_category.entry(tx.category.as_str()).or_insert(0.0) += tx.amount;
    }
    let mut top_categories: Vec<(String, f64)> = by_category
        .into_iter()
        .map(|(category, amount)| (category.to_string(), amount))
        .collect();
    top_categories.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_categories.truncate(3);

    let habits_total = habits.len();
    let habits_completed = habits.iter().filter(|h| h.streak > 0).count();
    let habit_completion_rate = if habits_total > 0 {
        format!("{:.1}", habits_completed as f64 / habits_total as f64 * 100.0)
    } else {
        "0".to_string()
    };

    WellnessSnapshot {
        avg_mood,
        mood_entries: moods.len(),
        mood_trend,
        total_spending,
        top_categories,
        social_posts,
        habits_completed,
        habits_total,
        habit_completion_rate,
        journal_entries,
        days_since_last_mood: moods.first().map(|m| whole_days_between(m.created_at, now)),
    }
}

impl WellnessSnapshot {
    /// Render the fixed multi-line text embedded in the analyst prompt
    pub fn render(&self) -> String {
        let categories = self
            .top_categories
            .iter()
            .map(|(category, amount)| format!("{} (${:.2})", category, amount))
            .collect::<Vec<_>>()
            .join(", ");
        let last_active = self
            .days_since_last_mood
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        format!(
            "Data Snapshot:\n\
             - Mood Trend: {} (Avg: {:.1}/10, {} entries)\n\
             - Financials: Total spending ${:.2} this week. Top categories: {}\n\
             - Social: {} community posts this week\n\
             - Growth: Habit completion rate: {}% ({}/{})\n\
             - Journal: {} entries this week\n\
             - Recent Activity: Last active {} days ago",
            self.mood_trend.as_str(),
            self.avg_mood,
            self.mood_entries,
            self.total_spending,
            categories,
            self.social_posts,
            self.habit_completion_rate,
            self.habits_completed,
            self.habits_total,
            self.journal_entries,
            last_active,
        )
    }
}

/// Read the window rows for one user and reduce them
pub async fn build_snapshot(
    pool: &SqlitePool,
    user_id: Uuid,
    window_days: i64,
    now: DateTime<Utc>,
) -> Result<WellnessSnapshot> {
    let since = window_start(now, window_days);

    let (moods, transactions, posts, habits, journal) = tokio::try_join!(
        moods::moods_since(pool, user_id, since),
        finance::transactions_since(pool, user_id, since),
        social::count_posts_by_user_since(pool, user_id, since),
        habits::habits_updated_since(pool, user_id, since),
        journal::count_since(pool, user_id, since),
    )?;

    Ok(compute_snapshot(&moods, &transactions, posts, &habits, journal, now))
}

/// Analyst prompt wrapping a rendered snapshot
pub fn insight_prompt(snapshot: &str) -> String {
    format!(
        r#"You are a proactive wellness analyst for a personal life companion. Analyze the user's weekly data snapshot and identify potential risks or positive opportunities. Generate a single, concise, empathetic and actionable insight. Do not be alarming. Focus on gentle suggestions. Categorize the insight as WELLNESS, FINANCE, SOCIAL or GROWTH, and set a priority.

{}

Return ONLY a JSON object with the fields: "content", "category", "priority".

Guidelines:
- Content should be 1-2 sentences, friendly and actionable
- Category: WELLNESS (mood, health), FINANCE (spending, savings), SOCIAL (connections), GROWTH (habits, learning)
- Priority: LOW (gentle reminder), MEDIUM (notable pattern), HIGH (important trend)
- Be encouraging and supportive, never judgmental
- Focus on patterns and opportunities, not problems"#,
        snapshot
    )
}

/// Insight fields decided by the LLM (or the fallbacks)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedInsight {
    pub content: String,
    pub category: InsightCategory,
    pub priority: InsightPriority,
}

impl GeneratedInsight {
    fn fallback(content: &str) -> Self {
        Self {
            content: content.to_string(),
            category: InsightCategory::Wellness,
            priority: InsightPriority::Low,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InsightReply {
    content: Option<String>,
    category: Option<String>,
    priority: Option<String>,
}

/// Interpret an LLM reply
///
/// Missing or empty fields take their defaults; unknown category and
/// priority labels normalize to WELLNESS / LOW.
pub fn parse_insight_reply(reply: &str) -> GeneratedInsight {
    let parsed = extract_json_object(reply).and_then(|json| serde_json::from_str::<InsightReply>(json).ok());

    let Some(parsed) = parsed else {
        debug!("Insight reply had no usable JSON object");
        return GeneratedInsight::fallback(PARSE_FALLBACK_CONTENT);
    };

    GeneratedInsight {
        content: parsed
            .content
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_INSIGHT_CONTENT.to_string()),
        category: parsed
            .category
            .as_deref()
            .and_then(InsightCategory::parse)
            .unwrap_or_default(),
        priority: parsed
            .priority
            .as_deref()
            .and_then(InsightPriority::parse)
            .unwrap_or_default(),
    }
}

/// Ask the LLM for an insight about a snapshot (one try, no retry)
pub async fn generate_insight(llm: &dyn TextGenerator, snapshot: &WellnessSnapshot) -> GeneratedInsight {
    let prompt = insight_prompt(&snapshot.render());
    match llm.chat(&[ChatMessage::user(prompt)]).await {
        Ok(reply) => parse_insight_reply(&reply),
        Err(e) => {
            warn!("Insight generation failed: {}", e);
            GeneratedInsight::fallback(LLM_FALLBACK_CONTENT)
        }
    }
}

/// Store an insight and announce it on the bus
pub async fn record_insight(
    pool: &SqlitePool,
    bus: &EventBus,
    user_id: Uuid,
    insight: &GeneratedInsight,
) -> Result<Insight> {
    let stored = insights::insert_insight(pool, user_id, &insight.content, insight.category, insight.priority).await?;

    bus.emit_lossy(AutomationEvent::InsightCreated {
        user_id,
        insight_id: stored.id,
        category: stored.category.as_str().to_string(),
        priority: stored.priority.as_str().to_string(),
        timestamp: stored.created_at,
    });

    Ok(stored)
}

/// Counters returned by a wellness check run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WellnessRunSummary {
    pub processed: usize,
    pub insights: usize,
    pub skipped: usize,
}

/// Generate insights for every recently active user
///
/// Users who already received an insight within the cooldown are skipped.
/// A failure for one user is logged and the run continues.
pub async fn run_wellness_check(
    pool: &SqlitePool,
    llm: &dyn TextGenerator,
    bus: &EventBus,
    config: &InsightConfig,
    now: DateTime<Utc>,
) -> Result<WellnessRunSummary> {
    let user_ids = users::active_user_ids(pool, window_start(now, config.window_days)).await?;
    let cooldown_start = now - Duration::hours(config.cooldown_hours);

    let mut summary = WellnessRunSummary {
        processed: user_ids.len(),
        ..Default::default()
    };

    for user_id in user_ids {
        match check_user(pool, llm, bus, config, user_id, cooldown_start, now).await {
            Ok(true) => summary.insights += 1,
            Ok(false) => summary.skipped += 1,
            Err(e) => warn!(user_id = %user_id, "Wellness check failed: {}", e),
        }
    }

    info!(
        processed = summary.processed,
        insights = summary.insights,
        skipped = summary.skipped,
        "Wellness check completed"
    );
    Ok(summary)
}

/// Returns false when the user is still within the cooldown
async fn check_user(
    pool: &SqlitePool,
    llm: &dyn TextGenerator,
    bus: &EventBus,
    config: &InsightConfig,
    user_id: Uuid,
    cooldown_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<bool> {
    if let Some(latest) = insights::latest_insight_at(pool, user_id).await? {
        if latest >= cooldown_start {
            debug!(user_id = %user_id, "Insight cooldown active, skipping");
            return Ok(false);
        }
    }

    let snapshot = build_snapshot(pool, user_id, config.window_days, now).await?;
    let insight = generate_insight(llm, &snapshot).await;
    record_insight(pool, bus, user_id, &insight).await?;
    Ok(true)
}
