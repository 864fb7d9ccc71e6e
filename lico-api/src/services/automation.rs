//! Automation engine
//!
//! Runs user routines in reaction to [`AutomationEvent`]s from the bus and,
//! on the cron pass, for routines with a SCHEDULED_TIME trigger.
//!
//! A routine fires at most once per event even when several of its triggers
//! match. Actions run in order; each one writes an `automation_logs` row and
//! a failed action does not stop the ones after it. Actions write records
//! directly and never emit further events.

use crate::db::automations::{self, LogStatus, Routine, RoutineStep};
use crate::db::finance::{self, NewGoal, NewTransaction};
use crate::db::insights::{self, InsightCategory, InsightPriority};
use crate::db::notifications;
use crate::llm::{extract_json_object, ChatMessage, TextGenerator};
use crate::services::schedule::CronSchedule;
use chrono::{DateTime, Duration, DurationRound, Timelike, Utc};
use lico_common::events::{AutomationEvent, EventBus, MOOD_ALERT_THRESHOLD};
use lico_common::time::parse_timestamp;
use lico_common::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Trigger types accepted in routine definitions
pub const TRIGGER_TYPES: &[&str] = &[
    "MOOD_BELOW_THRESHOLD",
    "HABIT_COMPLETED",
    "HABIT_MISSED",
    "TRANSACTION_CREATED",
    "BUDGET_EXCEEDED",
    "GOAL_COMPLETED",
    "JOURNAL_CREATED",
    "ASSESSMENT_COMPLETED",
    "SCHEDULED_TIME",
];

/// Action types the engine executes; anything else is logged as skipped
pub const ACTION_TYPES: &[&str] = &[
    "SEND_NOTIFICATION",
    "CREATE_JOURNAL_PROMPT",
    "CREATE_MOOD_CHECK_IN",
    "CREATE_HABIT_REMINDER",
    "SUGGEST_COPING_STRATEGY",
    "SUGGEST_ACTIVITY",
    "GENERATE_AI_INSIGHT",
    "ANALYZE_SPENDING_PATTERN",
    "CREATE_GOAL",
    "CREATE_TRANSACTION",
];

/// `event_type` recorded in logs for scheduled runs
pub const SCHEDULED_EVENT_TYPE: &str = "scheduled";

/// Insight stored when GENERATE_AI_INSIGHT cannot reach the LLM
pub const AI_INSIGHT_FALLBACK: &str =
    "Take a moment today to notice what is going well and what you would like to change.";

/// Check routine triggers before storing them
///
/// Unknown trigger types and unparseable SCHEDULED_TIME expressions are
/// rejected with a message suitable for a 400 response.
pub fn validate_triggers(triggers: &[RoutineStep]) -> std::result::Result<(), String> {
    if triggers.is_empty() {
        return Err("At least one trigger is required".to_string());
    }
    for trigger in triggers {
        if !TRIGGER_TYPES.contains(&trigger.step_type.as_str()) {
            return Err(format!("Unknown trigger type: {}", trigger.step_type));
        }
        if trigger.step_type == "SCHEDULED_TIME" {
            let cron = trigger
                .param_str("cron")
                .ok_or_else(|| "SCHEDULED_TIME requires a cron parameter".to_string())?;
            CronSchedule::parse(cron).map_err(|e| format!("Invalid cron expression: {}", e))?;
        }
    }
    Ok(())
}

fn same_name(filter: Option<&str>, value: &str) -> bool {
    filter.map_or(true, |f| f.trim().eq_ignore_ascii_case(value.trim()))
}

/// Whether a trigger fires for an event
pub fn trigger_matches(trigger: &RoutineStep, event: &AutomationEvent) -> bool {
    match (trigger.step_type.as_str(), event) {
        ("MOOD_BELOW_THRESHOLD", AutomationEvent::MoodCreated { mood_score, .. }) => {
            let threshold = trigger
                .param_f64("threshold")
                .unwrap_or(MOOD_ALERT_THRESHOLD as f64);
            (*mood_score as f64) <= threshold
        }
        ("HABIT_COMPLETED", AutomationEvent::HabitCompleted { habit_name, .. })
        | ("HABIT_MISSED", AutomationEvent::HabitMissed { habit_name, .. }) => {
            same_name(trigger.param_str("habitName"), habit_name)
        }
        ("TRANSACTION_CREATED", AutomationEvent::TransactionCreated { amount, category, .. }) => {
            same_name(trigger.param_str("category"), category)
                && trigger.param_f64("minAmount").map_or(true, |min| *amount >= min)
                && trigger.param_f64("maxAmount").map_or(true, |max| *amount <= max)
        }
        ("BUDGET_EXCEEDED", AutomationEvent::BudgetExceeded { budget_name, .. }) => {
            same_name(trigger.param_str("budgetName"), budget_name)
        }
        ("GOAL_COMPLETED", AutomationEvent::GoalCompleted { category, .. }) => {
            match trigger.param_str("category") {
                Some(wanted) => category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(wanted.trim())),
                None => true,
            }
        }
        ("JOURNAL_CREATED", AutomationEvent::JournalCreated { .. }) => true,
        ("ASSESSMENT_COMPLETED", AutomationEvent::AssessmentCompleted { assessment_type, .. }) => {
            same_name(trigger.param_str("assessmentType"), assessment_type)
        }
        _ => false,
    }
}

/// Coping strategy text for a category; unknown categories get breathing
pub fn coping_strategy(category: &str) -> &'static str {
    match category.trim().to_ascii_lowercase().as_str() {
        "stress" => "Mindful Observation: name 5 things you can see, 4 things you can touch, 3 things you can hear, 2 things you can smell, and 1 thing you can taste.",
        "tension" => "Progressive Muscle Relaxation: tense and then relax each muscle group in your body, starting from your toes and working up to your head.",
        "sadness" => "Reach Out: send a short message to someone you trust, or write down three small things that went okay today.",
        "anger" => "Pause and Move: step away for ten minutes, walk briskly, and come back once your breathing has slowed.",
        _ => "Deep Breathing Exercise: take 5 deep breaths, inhaling for 4 counts, holding for 4, and exhaling for 6 counts.",
    }
}

/// Part of the day used by SUGGEST_ACTIVITY
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(TimeOfDay::Morning),
            "afternoon" => Some(TimeOfDay::Afternoon),
            "evening" | "night" => Some(TimeOfDay::Evening),
            _ => None,
        }
    }

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }
}

/// Activity suggestion for a mood score (1-10) and time of day
pub fn suggest_activity(mood: i64, time_of_day: TimeOfDay) -> &'static str {
    match (mood, time_of_day) {
        (i64::MIN..=4, TimeOfDay::Morning) => "Start gently: open the curtains, drink a glass of water and take a five minute walk outside.",
        (i64::MIN..=4, TimeOfDay::Afternoon) => "Step away for a short walk in daylight or call a friend for ten minutes.",
        (i64::MIN..=4, TimeOfDay::Evening) => "Wind down with a warm shower, a calming playlist and an early night.",
        (5..=7, TimeOfDay::Morning) => "Pick one small task you have been putting off and finish it before lunch.",
        (5..=7, TimeOfDay::Afternoon) => "Take a stretch break and spend fifteen minutes on a hobby you enjoy.",
        (5..=7, TimeOfDay::Evening) => "Write down three things that went well today.",
        (_, TimeOfDay::Morning) => "Use the energy: plan something ambitious for today or try a new workout.",
        (_, TimeOfDay::Afternoon) => "Share the good mood: reach out to someone and make plans together.",
        (_, TimeOfDay::Evening) => "Celebrate the day: cook something you love or spend time on a creative project.",
    }
}

fn failed(detail: &str) -> Result<(LogStatus, Option<String>)> {
    Ok((LogStatus::Failed, Some(detail.to_string())))
}

/// Mood score carried by an event, if any
fn event_mood(event: Option<&AutomationEvent>) -> Option<i64> {
    match event? {
        AutomationEvent::MoodCreated { mood_score, .. }
        | AutomationEvent::MoodBelowThreshold { mood_score, .. } => Some(*mood_score),
        _ => None,
    }
}

/// Routine runner shared by the bus subscriber and the cron pass
#[derive(Clone)]
pub struct AutomationEngine {
    db: SqlitePool,
    llm: Arc<dyn TextGenerator>,
}

impl AutomationEngine {
    pub fn new(db: SqlitePool, llm: Arc<dyn TextGenerator>) -> Self {
        Self { db, llm }
    }

    /// Subscribe to the bus and handle events until the bus is dropped
    ///
    /// Events are processed one at a time; a lagging receiver logs how many
    /// events it lost and carries on.
    pub fn spawn(self, bus: &EventBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            info!("Automation engine listening for events");
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Err(e) = self.handle_event(&event).await {
                            warn!(event_type = event.event_type(), "Automation handling failed: {}", e);
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Automation engine lagged, events dropped");
                    }
                    Err(RecvError::Closed) => {
                        info!("Event bus closed, automation engine stopping");
                        break;
                    }
                }
            }
        })
    }

    /// Run every enabled routine of the event's user that has a matching trigger
    ///
    /// Returns the number of routines run.
    pub async fn handle_event(&self, event: &AutomationEvent) -> Result<usize> {
        let routines = automations::enabled_routines_for_user(&self.db, event.user_id()).await?;

        let mut ran = 0;
        for routine in routines {
            if routine.triggers.iter().any(|t| trigger_matches(t, event)) {
                debug!(routine_id = %routine.id, event_type = event.event_type(), "Routine triggered");
                self.run_routine(&routine, event.event_type(), Some(event)).await?;
                ran += 1;
            }
        }
        Ok(ran)
    }

    /// Run routines whose SCHEDULED_TIME trigger matches the minute of `now`
    ///
    /// A routine that already ran within the same minute is not run again.
    pub async fn process_scheduled(&self, now: DateTime<Utc>) -> Result<usize> {
        let minute = now.duration_trunc(Duration::minutes(1)).unwrap_or(now);
        let routines = automations::enabled_routines(&self.db).await?;

        let mut ran = 0;
        for routine in routines {
            if !self.is_due(&routine, now) {
                continue;
            }
            if let Some(last) = routine.last_run_at {
                if last >= minute {
                    debug!(routine_id = %routine.id, "Scheduled routine already ran this minute");
                    continue;
                }
            }

            self.run_routine(&routine, SCHEDULED_EVENT_TYPE, None).await?;
            automations::set_last_run(&self.db, routine.id, now).await?;
            ran += 1;
        }

        if ran > 0 {
            info!(ran, "Scheduled automation routines processed");
        }
        Ok(ran)
    }

    fn is_due(&self, routine: &Routine, now: DateTime<Utc>) -> bool {
        routine
            .triggers
            .iter()
            .filter(|t| t.step_type == "SCHEDULED_TIME")
            .filter_map(|t| t.param_str("cron"))
            .any(|cron| match CronSchedule::parse(cron) {
                Ok(schedule) => schedule.matches(now),
                Err(e) => {
                    warn!(routine_id = %routine.id, "Ignoring bad cron '{}': {}", cron, e);
                    false
                }
            })
    }

    async fn run_routine(
        &self,
        routine: &Routine,
        event_type: &str,
        event: Option<&AutomationEvent>,
    ) -> Result<()> {
        for action in &routine.actions {
            let (status, detail) = match self.execute_action(routine.user_id, action, event).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(routine_id = %routine.id, action = %action.step_type, "Action failed: {}", e);
                    (LogStatus::Failed, Some(e.to_string()))
                }
            };
            automations::insert_log(&self.db, routine, event_type, &action.step_type, status, detail).await?;
        }

        if event.is_some() {
            automations::set_last_run(&self.db, routine.id, Utc::now()).await?;
        }
        Ok(())
    }

    async fn execute_action(
        &self,
        user_id: Uuid,
        action: &RoutineStep,
        event: Option<&AutomationEvent>,
    ) -> Result<(LogStatus, Option<String>)> {
        match action.step_type.as_str() {
            "SEND_NOTIFICATION" => {
                let Some(message) = action.param_str("message") else {
                    return failed("Missing message");
                };
                let priority = action.param_str("priority").unwrap_or("normal").to_ascii_lowercase();
                self.notify(user_id, message, &priority, "automation").await
            }
            "CREATE_JOURNAL_PROMPT" => {
                let prompt = action
                    .param_str("prompt")
                    .unwrap_or("Take a few minutes to write about your day.");
                self.notify(user_id, prompt, "normal", "journal_prompt").await
            }
            "CREATE_MOOD_CHECK_IN" => {
                let prompt = action.param_str("prompt").unwrap_or("How are you feeling right now?");
                self.notify(user_id, prompt, "normal", "mood_check_in").await
            }
            "CREATE_HABIT_REMINDER" => {
                let Some(habit_name) = action.param_str("habitName") else {
                    return failed("Missing habitName");
                };
                let message = action
                    .param_str("message")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Don't forget: {}", habit_name));
                self.notify(user_id, &message, "normal", "habit_reminder").await
            }
            "SUGGEST_COPING_STRATEGY" => {
                let strategy = coping_strategy(action.param_str("category").unwrap_or(""));
                self.notify(user_id, strategy, "normal", "coping_strategy").await
            }
            "SUGGEST_ACTIVITY" => {
                let mood = action
                    .param_f64("mood")
                    .map(|m| m.round() as i64)
                    .or_else(|| event_mood(event))
                    .unwrap_or(6);
                let time_of_day = action
                    .param_str("timeOfDay")
                    .and_then(TimeOfDay::parse)
                    .unwrap_or_else(|| TimeOfDay::from_hour(Utc::now().hour()));
                self.notify(user_id, suggest_activity(mood, time_of_day), "normal", "activity_suggestion")
                    .await
            }
            "GENERATE_AI_INSIGHT" => self.generate_ai_insight(user_id, action, event).await,
            "ANALYZE_SPENDING_PATTERN" => self.analyze_spending(user_id).await,
            "CREATE_GOAL" => {
                let Some(title) = action.param_str("title") else {
                    return failed("Missing title");
                };
                let Some(target_amount) = action.param_f64("targetAmount").filter(|a| *a > 0.0) else {
                    return failed("targetAmount must be a positive number");
                };
                let goal = finance::insert_goal(
                    &self.db,
                    user_id,
                    &NewGoal {
                        title: title.to_string(),
                        description: action.param_str("description").map(str::to_string),
                        category: action.param_str("category").map(str::to_string),
                        target_amount,
                        current_amount: 0.0,
                        deadline: action.param_str("targetDate").and_then(parse_timestamp),
                    },
                )
                .await?;
                Ok((LogStatus::Success, Some(format!("Created goal {}", goal.id))))
            }
            "CREATE_TRANSACTION" => {
                let (Some(description), Some(category)) =
                    (action.param_str("description"), action.param_str("category"))
                else {
                    return failed("Missing description or category");
                };
                let Some(amount) = action.param_f64("amount").filter(|a| *a > 0.0) else {
                    return failed("amount must be a positive number");
                };
                let kind = action.param_str("type").unwrap_or("expense").to_ascii_lowercase();
                if kind != "income" && kind != "expense" {
                    return failed("type must be income or expense");
                }
                let tx = finance::insert_transaction(
                    &self.db,
                    user_id,
                    &NewTransaction {
                        description: description.to_string(),
                        amount,
                        kind,
                        category: category.to_string(),
                        date: Utc::now(),
                        notes: Some("Created by automation".to_string()),
                    },
                )
                .await?;
                Ok((LogStatus::Success, Some(format!("Created transaction {}", tx.id))))
            }
            other => Ok((LogStatus::Skipped, Some(format!("Unknown action type: {}", other)))),
        }
    }

    async fn notify(
        &self,
        user_id: Uuid,
        message: &str,
        priority: &str,
        source: &str,
    ) -> Result<(LogStatus, Option<String>)> {
        notifications::insert_notification(&self.db, user_id, message, priority, source).await?;
        Ok((LogStatus::Success, None))
    }

    async fn generate_ai_insight(
        &self,
        user_id: Uuid,
        action: &RoutineStep,
        event: Option<&AutomationEvent>,
    ) -> Result<(LogStatus, Option<String>)> {
        let prompt = action
            .param_str("prompt")
            .unwrap_or("Offer one short, supportive and practical suggestion for the user.");
        let context = match (action.param_str("context"), event) {
            (Some(context), _) => context.to_string(),
            (None, Some(event)) => serde_json::to_string(event)?,
            (None, None) => String::new(),
        };

        let message = if context.is_empty() {
            prompt.to_string()
        } else {
            format!("{}\n\nContext: {}", prompt, context)
        };

        let (content, detail) = match self.llm.chat(&[ChatMessage::user(message)]).await {
            Ok(reply) if !reply.trim().is_empty() => (reply.trim().to_string(), None),
            Ok(_) => (AI_INSIGHT_FALLBACK.to_string(), Some("Empty LLM reply, fallback stored".to_string())),
            Err(e) => (AI_INSIGHT_FALLBACK.to_string(), Some(format!("LLM unavailable, fallback stored: {}", e))),
        };

        insights::insert_insight(&self.db, user_id, &content, InsightCategory::Wellness, InsightPriority::Low)
            .await?;
        Ok((LogStatus::Success, detail))
    }

    async fn analyze_spending(&self, user_id: Uuid) -> Result<(LogStatus, Option<String>)> {
        let since = Utc::now() - Duration::days(30);
        let transactions = finance::transactions_since(&self.db, user_id, since).await?;

        let mut by_category: BTreeMap<&str, f64> = BTreeMap::new();
        for tx in transactions.iter().filter(|t| t.kind == "expense") {
            *by_category.entry(tx.category.as_str()).or_insert(0.0) += tx.amount;
        }
        let total: f64 = by_category.values().sum();

        let content = if by_category.is_empty() {
            "No expenses recorded in the last 30 days.".to_string()
        } else {
            let mut categories: Vec<_> = by_category.into_iter().collect();
            categories.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            let breakdown = categories
                .iter()
                .map(|(category, amount)| {
                    format!("{} ${:.2} ({:.0}%)", category, amount, amount / total * 100.0)
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "You spent ${:.2} over the last 30 days. Breakdown: {}.",
                total, breakdown
            )
        };

        insights::insert_insight(&self.db, user_id, &content, InsightCategory::Finance, InsightPriority::Medium)
            .await?;
        Ok((LogStatus::Success, None))
    }
}

/// Routine proposed by the LLM for a user goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineSuggestion {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub triggers: Vec<RoutineStep>,
    pub actions: Vec<RoutineStep>,
}

impl RoutineSuggestion {
    /// Weekly reminder used when the LLM gives nothing usable
    pub fn fallback(goal: &str) -> Self {
        Self {
            name: format!("Automation for: {}", goal),
            description: format!("An automation routine to help with: {}", goal),
            triggers: vec![RoutineStep::new("SCHEDULED_TIME", json!({ "cron": "0 9 * * 1" }))],
            actions: vec![RoutineStep::new(
                "SEND_NOTIFICATION",
                json!({
                    "message": format!("Time to work on your goal: {}", goal),
                    "priority": "MEDIUM",
                }),
            )],
        }
    }
}

fn suggestion_prompt(goal: &str) -> String {
    let triggers = TRIGGER_TYPES.join(", ");
    let actions = ACTION_TYPES.join(", ");
    format!(
        r#"Based on this goal: "{goal}", suggest an automation routine that could help achieve it.

Respond with a JSON object in this exact format:
{{
  "name": "Descriptive name for the automation",
  "description": "Brief description of what this automation does",
  "triggers": [{{ "type": "TRIGGER_TYPE", "params": {{}} }}],
  "actions": [{{ "type": "ACTION_TYPE", "params": {{}} }}]
}}

Available trigger types: {triggers}
Trigger params: MOOD_BELOW_THRESHOLD {{"threshold": number}}, HABIT_COMPLETED/HABIT_MISSED {{"habitName": string}}, TRANSACTION_CREATED {{"category": string, "minAmount": number, "maxAmount": number}}, BUDGET_EXCEEDED {{"budgetName": string}}, GOAL_COMPLETED {{"category": string}}, SCHEDULED_TIME {{"cron": "minute hour day month weekday"}}

Available action types: {actions}
Action params: SEND_NOTIFICATION {{"message": string, "priority": string}}, CREATE_JOURNAL_PROMPT {{"prompt": string}}, CREATE_MOOD_CHECK_IN {{"prompt": string}}, CREATE_HABIT_REMINDER {{"habitName": string, "message": string}}, SUGGEST_COPING_STRATEGY {{"category": string}}, SUGGEST_ACTIVITY {{"mood": number, "timeOfDay": "morning|afternoon|evening"}}, GENERATE_AI_INSIGHT {{"prompt": string, "context": string}}, CREATE_GOAL {{"title": string, "description": string, "targetAmount": number, "targetDate": string}}, CREATE_TRANSACTION {{"description": string, "amount": number, "category": string, "type": "income|expense"}}

Make the suggestion practical and specific to the goal. Only respond with valid JSON."#
    )
}

/// Parse a suggestion reply; None unless it names triggers and actions
pub fn parse_suggestion(reply: &str) -> Option<RoutineSuggestion> {
    let suggestion: RoutineSuggestion = serde_json::from_str(extract_json_object(reply)?).ok()?;
    if suggestion.name.trim().is_empty() || suggestion.actions.is_empty() {
        return None;
    }
    validate_triggers(&suggestion.triggers).ok()?;
    Some(suggestion)
}

/// Ask the LLM for a routine serving `goal`, falling back to a weekly reminder
pub async fn suggest_routine(llm: &dyn TextGenerator, goal: &str) -> RoutineSuggestion {
    match llm.generate(&suggestion_prompt(goal)).await {
        Ok(reply) => parse_suggestion(&reply).unwrap_or_else(|| {
            debug!("Routine suggestion reply unusable, using fallback");
            RoutineSuggestion::fallback(goal)
        }),
        Err(e) => {
            warn!("Routine suggestion failed: {}", e);
            RoutineSuggestion::fallback(goal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(kind: &str, params: Value) -> RoutineStep {
        RoutineStep::new(kind, params)
    }

    fn mood_event(score: i64) -> AutomationEvent {
        AutomationEvent::MoodCreated {
            user_id: Uuid::nil(),
            entry_id: Uuid::nil(),
            mood_score: score,
            notes: None,
            tags: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    fn habit_event(name: &str, completed: bool) -> AutomationEvent {
        if completed {
            AutomationEvent::HabitCompleted {
                user_id: Uuid::nil(),
                habit_id: Uuid::nil(),
                habit_name: name.to_string(),
                date: "2026-03-09".to_string(),
                timestamp: Utc::now(),
            }
        } else {
            AutomationEvent::HabitMissed {
                user_id: Uuid::nil(),
                habit_id: Uuid::nil(),
                habit_name: name.to_string(),
                date: "2026-03-09".to_string(),
                timestamp: Utc::now(),
            }
        }
    }

    fn tx_event(amount: f64, category: &str) -> AutomationEvent {
        AutomationEvent::TransactionCreated {
            user_id: Uuid::nil(),
            transaction_id: Uuid::nil(),
            description: "coffee".to_string(),
            amount,
            kind: "expense".to_string(),
            category: category.to_string(),
            timestamp: Utc::now(),
        }
    }

    fn goal_event(category: Option<&str>) -> AutomationEvent {
        AutomationEvent::GoalCompleted {
            user_id: Uuid::nil(),
            goal_id: Uuid::nil(),
            title: "Emergency fund".to_string(),
            category: category.map(str::to_string),
            timestamp: Utc::now(),
        }
    }

    fn assessment_event(kind: &str) -> AutomationEvent {
        AutomationEvent::AssessmentCompleted {
            user_id: Uuid::nil(),
            assessment_id: Uuid::nil(),
            assessment_type: kind.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_trigger_matching_table() {
        let cases = [
            (step("MOOD_BELOW_THRESHOLD", json!({})), mood_event(5), true),
            (step("MOOD_BELOW_THRESHOLD", json!({})), mood_event(6), false),
            (step("MOOD_BELOW_THRESHOLD", json!({"threshold": 3})), mood_event(4), false),
            (step("MOOD_BELOW_THRESHOLD", json!({"threshold": "7"})), mood_event(7), true),
            (step("HABIT_COMPLETED", json!({})), habit_event("Run", true), true),
            (step("HABIT_COMPLETED", json!({"habitName": "run"})), habit_event("Run", true), true),
            (step("HABIT_COMPLETED", json!({"habitName": "Read"})), habit_event("Run", true), false),
            (step("HABIT_COMPLETED", json!({})), habit_event("Run", false), false),
            (step("HABIT_MISSED", json!({"habitName": "RUN"})), habit_event("Run", false), true),
            (step("TRANSACTION_CREATED", json!({})), tx_event(12.0, "food"), true),
            (step("TRANSACTION_CREATED", json!({"category": "Food"})), tx_event(12.0, "food"), true),
            (step("TRANSACTION_CREATED", json!({"category": "rent"})), tx_event(12.0, "food"), false),
            (step("TRANSACTION_CREATED", json!({"minAmount": 20})), tx_event(12.0, "food"), false),
            (step("TRANSACTION_CREATED", json!({"minAmount": 10, "maxAmount": 12})), tx_event(12.0, "food"), true),
            (step("TRANSACTION_CREATED", json!({"maxAmount": 11.99})), tx_event(12.0, "food"), false),
            (step("GOAL_COMPLETED", json!({})), goal_event(None), true),
            (step("GOAL_COMPLETED", json!({"category": "savings"})), goal_event(Some("Savings")), true),
            (step("GOAL_COMPLETED", json!({"category": "savings"})), goal_event(None), false),
            (step("JOURNAL_CREATED", json!({})), mood_event(2), false),
            (step("SCHEDULED_TIME", json!({"cron": "* * * * *"})), mood_event(2), false),
            (step("ASSESSMENT_COMPLETED", json!({})), mood_event(2), false),
            (step("ASSESSMENT_COMPLETED", json!({})), assessment_event("GAD-7"), true),
            (step("ASSESSMENT_COMPLETED", json!({"assessmentType": "gad-7"})), assessment_event("GAD-7"), true),
            (step("ASSESSMENT_COMPLETED", json!({"assessmentType": "PHQ-9"})), assessment_event("GAD-7"), false),
            (step("NOT_A_TRIGGER", json!({})), mood_event(2), false),
        ];

        for (i, (trigger, event, expected)) in cases.iter().enumerate() {
            assert_eq!(
                trigger_matches(trigger, event),
                *expected,
                "case {}: {} vs {}",
                i,
                trigger.step_type,
                event.event_type()
            );
        }
    }

    #[test]
    fn test_below_threshold_event_does_not_double_fire() {
        let event = AutomationEvent::MoodBelowThreshold {
            user_id: Uuid::nil(),
            entry_id: Uuid::nil(),
            mood_score: 2,
            timestamp: Utc::now(),
        };
        assert!(!trigger_matches(&step("MOOD_BELOW_THRESHOLD", json!({})), &event));
    }

    #[test]
    fn test_validate_triggers() {
        assert!(validate_triggers(&[]).is_err());
        assert!(validate_triggers(&[step("JOURNAL_CREATED", json!({}))]).is_ok());
        assert!(validate_triggers(&[step("MOON_PHASE", json!({}))]).is_err());
        assert!(validate_triggers(&[step("SCHEDULED_TIME", json!({}))]).is_err());
        assert!(validate_triggers(&[step("SCHEDULED_TIME", json!({"cron": "61 * * * *"}))]).is_err());
        assert!(validate_triggers(&[step("SCHEDULED_TIME", json!({"cron": "0 9 * * 1"}))]).is_ok());
    }

    #[test]
    fn test_fixed_tables() {
        assert!(coping_strategy("STRESS").starts_with("Mindful Observation"));
        assert!(coping_strategy("unknown").starts_with("Deep Breathing"));
        assert_eq!(TimeOfDay::from_hour(9), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Evening);
        assert_ne!(
            suggest_activity(2, TimeOfDay::Evening),
            suggest_activity(9, TimeOfDay::Evening)
        );
        assert_eq!(
            suggest_activity(6, TimeOfDay::Evening),
            "Write down three things that went well today."
        );
    }

    #[test]
    fn test_parse_suggestion() {
        let reply = r#"Sure:
{"name": "Hydrate", "description": "Drink water", "triggers": [{"type": "SCHEDULED_TIME", "params": {"cron": "0 10 * * *"}}], "actions": [{"type": "SEND_NOTIFICATION", "params": {"message": "Drink water"}}]}"#;
        let suggestion = parse_suggestion(reply).unwrap();
        assert_eq!(suggestion.name, "Hydrate");
        assert_eq!(suggestion.triggers[0].param_str("cron"), Some("0 10 * * *"));

        assert!(parse_suggestion("no json").is_none());
        assert!(parse_suggestion(r#"{"name": "x", "triggers": [], "actions": []}"#).is_none());
        assert!(parse_suggestion(
            r#"{"name": "x", "triggers": [{"type": "BOGUS"}], "actions": [{"type": "SEND_NOTIFICATION"}]}"#
        )
        .is_none());
    }

    #[test]
    fn test_fallback_suggestion_is_valid() {
        let fallback = RoutineSuggestion::fallback("save money");
        assert_eq!(fallback.name, "Automation for: save money");
        assert!(validate_triggers(&fallback.triggers).is_ok());
        assert_eq!(
            fallback.actions[0].param_str("message"),
            Some("Time to work on your goal: save money")
        );
    }
}
