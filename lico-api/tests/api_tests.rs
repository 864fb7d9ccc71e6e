//! Integration tests for lico-api HTTP endpoints
//!
//! Each test runs the full router against a fresh temp-file database and a
//! scripted text generator.

mod common;

use chrono::{Datelike, Duration, Utc};
use common::{drain_event_types, ScriptedGenerator, TestApp, CRON_SECRET};
use serde_json::{json, Value};

// =============================================================================
// Health and authentication
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = TestApp::new(ScriptedGenerator::replying("ok")).await;

    let (status, body) = app.call("GET", "/health", None, None).await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "lico-api");
    assert!(body["version"].is_string());
    assert!(body["lastWellnessCheckAt"].is_null());
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = TestApp::new(ScriptedGenerator::replying("ok")).await;

    for (method, uri) in [
        ("GET", "/api/journal"),
        ("GET", "/api/mood"),
        ("GET", "/api/habits"),
        ("GET", "/api/finance/summary"),
        ("GET", "/api/insights"),
        ("GET", "/api/automations"),
        ("GET", "/api/auth/me"),
    ] {
        let (status, body) = app.call(method, uri, None, None).await;
        assert_eq!(status, 401, "{} {}", method, uri);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    let (status, _) = app.call("GET", "/api/journal", Some("not-a-token"), None).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_register_login_logout() {
    let app = TestApp::new(ScriptedGenerator::replying("ok")).await;
    let token = app.register("Alice@Example.com").await;

    let (status, me) = app.call("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, 200);
    assert_eq!(me["email"], "alice@example.com");

    // Duplicate email, any case
    let (status, body) = app
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "ALICE@example.com", "password": "password123", "name": "A" })),
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, 401);

    let (status, login) = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, 200);
    let second = login["token"].as_str().unwrap().to_string();

    let (status, _) = app.call("POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, 204);
    let (status, _) = app.call("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, 401);

    // Other sessions survive
    let (status, _) = app.call("GET", "/api/auth/me", Some(&second), None).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new(ScriptedGenerator::replying("ok")).await;

    for body in [
        json!({ "email": "not-an-email", "password": "password123", "name": "A" }),
        json!({ "email": "a@example.com", "password": "short", "name": "A" }),
        json!({ "email": "a@example.com", "password": "password123", "name": "  " }),
    ] {
        let (status, resp) = app.call("POST", "/api/auth/register", None, Some(body)).await;
        assert_eq!(status, 400);
        assert_eq!(resp["error"]["code"], "BAD_REQUEST");
    }
}

// =============================================================================
// Journal
// =============================================================================

#[tokio::test]
async fn test_journal_crud_and_ownership() {
    let app = TestApp::new(ScriptedGenerator::replying("ok")).await;
    let alice = app.register("alice@example.com").await;
    let bob = app.register("bob@example.com").await;

    let (status, entry) = app
        .call(
            "POST",
            "/api/journal",
            Some(&alice),
            Some(json!({
                "title": "Morning pages",
                "content": "Slept well, feeling focused",
                "mood": 7,
                "tags": ["morning", " ", "focus"],
            })),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(entry["tags"], json!(["morning", "focus"]));
    let id = entry["id"].as_str().unwrap().to_string();
    let uri = format!("/api/journal/{}", id);

    let (status, _) = app.call("GET", &uri, Some(&bob), None).await;
    assert_eq!(status, 404, "foreign entries are reported as missing");

    let (status, updated) = app
        .call("PUT", &uri, Some(&alice), Some(json!({ "title": "Evening pages" })))
        .await;
    assert_eq!(status, 200);
    assert_eq!(updated["title"], "Evening pages");
    assert_eq!(updated["content"], "Slept well, feeling focused");

    let (status, list) = app
        .call("GET", "/api/journal?search=focused", Some(&alice), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(list["entries"].as_array().unwrap().len(), 1);
    assert_eq!(list["pagination"]["total"], 1);

    let (status, list) = app.call("GET", "/api/journal", Some(&bob), None).await;
    assert_eq!(status, 200);
    assert!(list["entries"].as_array().unwrap().is_empty());

    let (status, _) = app.call("DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, 404);
    let (status, _) = app.call("DELETE", &uri, Some(&alice), None).await;
    assert_eq!(status, 204);
    let (status, _) = app.call("GET", &uri, Some(&alice), None).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_journal_validation() {
    let app = TestApp::new(ScriptedGenerator::replying("ok")).await;
    let token = app.register("alice@example.com").await;

    let long_title = "x".repeat(201);
    for body in [
        json!({ "title": "", "content": "text" }),
        json!({ "title": long_title, "content": "text" }),
        json!({ "title": "t", "content": "text", "mood": 11 }),
        json!({ "content": "missing title" }),
    ] {
        let (status, _) = app.call("POST", "/api/journal", Some(&token), Some(body)).await;
        assert_eq!(status, 400);
    }

    let (status, _) = app.call("GET", "/api/journal/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, 400);
}

// =============================================================================
// Moods
// =============================================================================

#[tokio::test]
async fn test_mood_with_notes_gets_ai_insight() {
    let app = TestApp::new(ScriptedGenerator::replying("  Be gentle with yourself today.  ")).await;
    let token = app.register("alice@example.com").await;

    let (status, mood) = app
        .call(
            "POST",
            "/api/mood",
            Some(&token),
            Some(json!({ "mood": 4, "notes": "Long day at work" })),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(mood["aiInsight"], "Be gentle with yourself today.");

    let (status, _) = app
        .call("POST", "/api/mood", Some(&token), Some(json!({ "mood": 0 })))
        .await;
    assert_eq!(status, 400);

    let (_, list) = app.call("GET", "/api/mood", Some(&token), None).await;
    assert_eq!(list["moods"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_mood_survives_llm_failure() {
    let app = TestApp::new(ScriptedGenerator::failing()).await;
    let token = app.register("alice@example.com").await;

    let (status, mood) = app
        .call(
            "POST",
            "/api/mood",
            Some(&token),
            Some(json!({ "mood": 8, "notes": "Great run" })),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(mood["mood"], 8);
}

#[tokio::test]
async fn test_low_mood_emits_below_threshold() {
    let app = TestApp::new(ScriptedGenerator::replying("ok")).await;
    let token = app.register("alice@example.com").await;
    let mut rx = app.state.event_bus.subscribe();

    let (status, _) = app
        .call("POST", "/api/mood", Some(&token), Some(json!({ "mood": 5 })))
        .await;
    assert_eq!(status, 201);
    assert_eq!(
        drain_event_types(&mut rx),
        vec!["mood.created", "mood.below_threshold"]
    );

    let (status, _) = app
        .call("POST", "/api/mood", Some(&token), Some(json!({ "mood": 6 })))
        .await;
    assert_eq!(status, 201);
    assert_eq!(drain_event_types(&mut rx), vec!["mood.created"]);
}

// =============================================================================
// Mental health assessments
// =============================================================================

#[tokio::test]
async fn test_assessment_summary_and_listing() {
    let app = TestApp::new(ScriptedGenerator::replying(&"x".repeat(600))).await;
    let token = app.register("alice@example.com").await;
    let mut rx = app.state.event_bus.subscribe();

    let (status, created) = app
        .call(
            "POST",
            "/api/mental-health/assessment",
            Some(&token),
            Some(json!({ "type": "PHQ-9", "scores": { "total": 12, "items": [1, 2, 1] } })),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(created["type"], "PHQ-9");
    assert_eq!(created["scores"]["total"], 12);
    assert_eq!(created["summary"].as_str().unwrap().chars().count(), 500);
    assert_eq!(drain_event_types(&mut rx), vec!["assessment.completed"]);

    let (status, _) = app
        .call(
            "POST",
            "/api/mental-health/assessment",
            Some(&token),
            Some(json!({ "type": "GAD-7", "scores": [0, 1, 3] })),
        )
        .await;
    assert_eq!(status, 201);

    for body in [
        json!({ "type": "PHQ-9" }),
        json!({ "type": "  ", "scores": { "total": 1 } }),
        json!({ "scores": { "total": 1 } }),
    ] {
        let (status, _) = app
            .call("POST", "/api/mental-health/assessment", Some(&token), Some(body))
            .await;
        assert_eq!(status, 400);
    }

    let (status, all) = app
        .call("GET", "/api/mental-health/assessment", Some(&token), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(all["pagination"]["total"], 2);
    assert_eq!(all["assessments"][0]["type"], "GAD-7");

    let (_, filtered) = app
        .call("GET", "/api/mental-health/assessment?type=PHQ-9", Some(&token), None)
        .await;
    let filtered = filtered["assessments"].as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["id"], created["id"]);

    let other = app.register("bob@example.com").await;
    let (_, theirs) = app
        .call("GET", "/api/mental-health/assessment", Some(&other), None)
        .await;
    assert_eq!(theirs["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_assessment_summary_fallback_when_llm_down() {
    let app = TestApp::new(ScriptedGenerator::failing()).await;
    let token = app.register("alice@example.com").await;

    let (status, created) = app
        .call(
            "POST",
            "/api/mental-health/assessment",
            Some(&token),
            Some(json!({ "type": "GAD-7", "scores": { "total": 9 } })),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(
        created["summary"],
        lico_api::api::assessments::ASSESSMENT_SUMMARY_FALLBACK
    );
}

// =============================================================================
// Habits
// =============================================================================

#[tokio::test]
async fn test_habit_logging_one_entry_per_day() {
    let app = TestApp::new(ScriptedGenerator::replying("ok")).await;
    let token = app.register("alice@example.com").await;

    let (status, habit) = app
        .call(
            "POST",
            "/api/habits",
            Some(&token),
            Some(json!({ "name": "Meditate", "frequency": "Daily" })),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(habit["frequency"], "daily");
    let logs_uri = format!("/api/habits/{}/logs", habit["id"].as_str().unwrap());

    let (status, first) = app.call("POST", &logs_uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, 200);
    assert_eq!(first["stats"]["currentStreak"], 1);
    assert_eq!(first["stats"]["completedToday"], true);

    // Same day again replaces the log
    let (status, second) = app
        .call("POST", &logs_uri, Some(&token), Some(json!({ "completed": false })))
        .await;
    assert_eq!(status, 200);
    assert_eq!(second["log"]["id"], first["log"]["id"]);
    assert_eq!(second["stats"]["currentStreak"], 0);
    assert_eq!(second["stats"]["completedToday"], false);

    let (status, _) = app
        .call("POST", &logs_uri, Some(&token), Some(json!({ "date": "2999-01-01" })))
        .await;
    assert_eq!(status, 400);

    let (status, _) = app
        .call(
            "POST",
            "/api/habits",
            Some(&token),
            Some(json!({ "name": "Read", "frequency": "hourly" })),
        )
        .await;
    assert_eq!(status, 400);
}

// =============================================================================
// Finance
// =============================================================================

#[tokio::test]
async fn test_finance_summary_totals() {
    let app = TestApp::new(ScriptedGenerator::replying("ok")).await;
    let token = app.register("alice@example.com").await;

    for (description, amount, kind, category) in [
        ("Salary", 3000.0, "income", "salary"),
        ("Groceries", 120.5, "expense", "food"),
        ("Rent", 1000.0, "expense", "housing"),
    ] {
        let (status, _) = app
            .call(
                "POST",
                "/api/finance/transactions",
                Some(&token),
                Some(json!({
                    "description": description,
                    "amount": amount,
                    "type": kind,
                    "category": category,
                })),
            )
            .await;
        assert_eq!(status, 201);
    }

    let (status, _) = app
        .call(
            "POST",
            "/api/finance/transactions",
            Some(&token),
            Some(json!({ "description": "Bad", "amount": -5, "type": "expense", "category": "x" })),
        )
        .await;
    assert_eq!(status, 400);

    let (status, list) = app
        .call("GET", "/api/finance/transactions?type=expense", Some(&token), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(list["transactions"].as_array().unwrap().len(), 2);

    let (status, summary) = app
        .call("GET", "/api/finance/summary?period=month", Some(&token), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(summary["period"], "month");
    assert_eq!(summary["overview"]["totalIncome"], 3000.0);
    assert_eq!(summary["overview"]["totalExpenses"], 1120.5);
    assert_eq!(summary["expensesByCategory"]["food"], 120.5);
    assert!(summary.get("aiInsights").is_none());
}

async fn post_expense(app: &TestApp, token: &str, amount: f64, date: Option<String>) {
    let mut body = json!({
        "description": "Groceries",
        "amount": amount,
        "type": "expense",
        "category": "food",
    });
    if let Some(date) = date {
        body["date"] = Value::String(date);
    }
    let (status, tx) = app
        .call("POST", "/api/finance/transactions", Some(token), Some(body))
        .await;
    assert_eq!(status, 201, "expense failed: {}", tx);
}

#[tokio::test]
async fn test_budget_exceeded_emitted_once_per_crossing() {
    let app = TestApp::new(ScriptedGenerator::replying("ok")).await;
    let token = app.register("alice@example.com").await;

    let (status, _) = app
        .call(
            "POST",
            "/api/finance/budgets",
            Some(&token),
            Some(json!({ "name": "Food", "category": "food", "amount": 100 })),
        )
        .await;
    assert_eq!(status, 201);
    let mut rx = app.state.event_bus.subscribe();

    post_expense(&app, &token, 60.0, None).await;
    assert_eq!(drain_event_types(&mut rx), vec!["transaction.created"]);

    // Dated outside the current month: neither counts toward the budget
    post_expense(&app, &token, 150.0, Some("2099-01-05".to_string())).await;
    let first_of_month = Utc::now().date_naive().with_day(1).unwrap();
    let last_month = first_of_month - Duration::days(1);
    post_expense(&app, &token, 500.0, Some(last_month.to_string())).await;
    assert_eq!(
        drain_event_types(&mut rx),
        vec!["transaction.created", "transaction.created"]
    );

    post_expense(&app, &token, 50.0, None).await;
    assert_eq!(
        drain_event_types(&mut rx),
        vec!["transaction.created", "budget.exceeded"]
    );

    post_expense(&app, &token, 20.0, None).await;
    assert_eq!(drain_event_types(&mut rx), vec!["transaction.created"]);
}

#[tokio::test]
async fn test_goal_progress_update() {
    let app = TestApp::new(ScriptedGenerator::replying("ok")).await;
    let token = app.register("alice@example.com").await;

    let (status, goal) = app
        .call(
            "POST",
            "/api/finance/goals",
            Some(&token),
            Some(json!({ "title": "Emergency fund", "targetAmount": 1000 })),
        )
        .await;
    assert_eq!(status, 201);
    let uri = format!("/api/finance/goals/{}", goal["id"].as_str().unwrap());
    let mut rx = app.state.event_bus.subscribe();

    let (status, updated) = app
        .call("PUT", &uri, Some(&token), Some(json!({ "currentAmount": 400 })))
        .await;
    assert_eq!(status, 200);
    assert_eq!(updated["completed"], false);
    assert!(drain_event_types(&mut rx).is_empty());

    let (status, updated) = app
        .call("PUT", &uri, Some(&token), Some(json!({ "currentAmount": 1000 })))
        .await;
    assert_eq!(status, 200);
    assert_eq!(updated["completed"], true);
    assert_eq!(drain_event_types(&mut rx), vec!["goal.completed"]);

    // Already completed
    let (status, _) = app
        .call("PUT", &uri, Some(&token), Some(json!({ "currentAmount": 1200 })))
        .await;
    assert_eq!(status, 200);
    assert!(drain_event_types(&mut rx).is_empty());

    let (status, _) = app
        .call("PUT", &uri, Some(&token), Some(json!({ "currentAmount": -1 })))
        .await;
    assert_eq!(status, 400);
}

// =============================================================================
// Social
// =============================================================================

#[tokio::test]
async fn test_community_membership_rules() {
    let app = TestApp::new(ScriptedGenerator::replying("ok")).await;
    let owner = app.register("owner@example.com").await;
    let guest = app.register("guest@example.com").await;

    let (status, community) = app
        .call(
            "POST",
            "/api/social/communities",
            Some(&owner),
            Some(json!({ "name": "Runners", "category": "fitness" })),
        )
        .await;
    assert_eq!(status, 201);
    let id = community["id"].as_str().unwrap().to_string();
    let membership = format!("/api/social/communities/{}/membership", id);
    let posts = format!("/api/social/communities/{}/posts", id);

    let (status, _) = app
        .call(
            "POST",
            "/api/social/communities",
            Some(&guest),
            Some(json!({ "name": "Runners" })),
        )
        .await;
    assert_eq!(status, 409);

    let (status, _) = app
        .call("POST", &posts, Some(&guest), Some(json!({ "content": "Hello!" })))
        .await;
    assert_eq!(status, 403);

    let (status, _) = app.call("POST", &membership, Some(&guest), None).await;
    assert_eq!(status, 201);
    let (status, body) = app.call("POST", &membership, Some(&guest), None).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = app
        .call("POST", &posts, Some(&guest), Some(json!({ "content": "Hello!" })))
        .await;
    assert_eq!(status, 201);

    let (status, _) = app.call("DELETE", &membership, Some(&owner), None).await;
    assert_eq!(status, 400);
    let (status, _) = app.call("DELETE", &membership, Some(&guest), None).await;
    assert_eq!(status, 204);
    let (status, _) = app.call("DELETE", &membership, Some(&guest), None).await;
    assert_eq!(status, 404);

    let missing = format!(
        "/api/social/communities/{}/membership",
        "00000000-0000-0000-0000-000000000000"
    );
    let (status, _) = app.call("POST", &missing, Some(&guest), None).await;
    assert_eq!(status, 404);
}

// =============================================================================
// Creative
// =============================================================================

#[tokio::test]
async fn test_asset_generation_failure_stores_nothing() {
    let app = TestApp::new(ScriptedGenerator::failing()).await;
    let token = app.register("alice@example.com").await;

    let (status, project) = app
        .call(
            "POST",
            "/api/creative/projects",
            Some(&token),
            Some(json!({ "title": "Poems", "type": "Writing" })),
        )
        .await;
    assert_eq!(status, 201);
    let assets = format!("/api/creative/projects/{}/assets", project["id"].as_str().unwrap());

    let (status, _) = app
        .call("POST", &assets, Some(&token), Some(json!({ "prompt": "A haiku about rain" })))
        .await;
    assert_eq!(status, 500);

    let (status, list) = app.call("GET", &assets, Some(&token), None).await;
    assert_eq!(status, 200);
    assert!(list["assets"].as_array().unwrap().is_empty());
}

// =============================================================================
// Insights and cron
// =============================================================================

#[tokio::test]
async fn test_cron_routes_require_secret() {
    let app = TestApp::new(ScriptedGenerator::replying("ok")).await;
    let user = app.register("alice@example.com").await;

    let (status, _) = app.call("POST", "/api/cron/wellness-check", None, None).await;
    assert_eq!(status, 401);
    let (status, _) = app.call("POST", "/api/cron/wellness-check", Some(&user), None).await;
    assert_eq!(status, 401);
    let (status, _) = app.call("GET", "/api/cron/system-health", Some("wrong"), None).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_wellness_check_creates_insight_then_cools_down() {
    let reply = r#"Here you go: {"content": "Your mood is trending up, keep it going!", "category": "growth", "priority": "MEDIUM"}"#;
    let app = TestApp::new(ScriptedGenerator::replying(reply)).await;
    let token = app.register("alice@example.com").await;

    let (status, _) = app
        .call("POST", "/api/mood", Some(&token), Some(json!({ "mood": 7 })))
        .await;
    assert_eq!(status, 201);

    let (status, run) = app
        .call("POST", "/api/cron/wellness-check", Some(CRON_SECRET), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(run["success"], true);
    assert_eq!(run["wellness"]["processed"], 1);
    assert_eq!(run["wellness"]["insights"], 1);

    let (status, list) = app.call("GET", "/api/insights", Some(&token), None).await;
    assert_eq!(status, 200);
    assert_eq!(list["unreadCount"], 1);
    let insight = &list["insights"][0];
    assert_eq!(insight["category"], "GROWTH");
    assert_eq!(insight["priority"], "MEDIUM");

    // Within the cooldown the user is skipped
    let (_, run) = app
        .call("GET", "/api/cron/wellness-check", Some(CRON_SECRET), None)
        .await;
    assert_eq!(run["wellness"]["insights"], 0);
    assert_eq!(run["wellness"]["skipped"], 1);

    let (_, health) = app.call("GET", "/health", None, None).await;
    assert!(health["lastWellnessCheckAt"].is_string());
}

#[tokio::test]
async fn test_mark_insights_read() {
    let reply = r#"{"content": "Nice streak", "category": "WELLNESS", "priority": "LOW"}"#;
    let app = TestApp::new(ScriptedGenerator::replying(reply)).await;
    let token = app.register("alice@example.com").await;
    app.call("POST", "/api/mood", Some(&token), Some(json!({ "mood": 6 })))
        .await;
    app.call("POST", "/api/cron/wellness-check", Some(CRON_SECRET), None)
        .await;

    let (status, _) = app
        .call("PATCH", "/api/insights", Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, 400);

    let (status, _) = app
        .call("GET", "/api/insights?category=bogus", Some(&token), None)
        .await;
    assert_eq!(status, 400);

    let (status, body) = app
        .call(
            "PATCH",
            "/api/insights",
            Some(&token),
            Some(json!({ "markAllAsRead": true })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["updated"], 1);

    let (_, list) = app
        .call("GET", "/api/insights?unreadOnly=true", Some(&token), None)
        .await;
    assert_eq!(list["unreadCount"], 0);
    assert!(list["insights"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_system_health_cron_records_metrics() {
    let app = TestApp::new(ScriptedGenerator::replying("All systems nominal.")).await;

    let (status, report) = app
        .call("GET", "/api/cron/system-health", Some(CRON_SECRET), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(report["metrics"].as_array().unwrap().len(), 2);

    let (_, health) = app.call("GET", "/health", None, None).await;
    assert!(health["lastSystemHealthAt"].is_string());
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_falls_back_when_llm_down() {
    let app = TestApp::new(ScriptedGenerator::failing()).await;
    let token = app.register("alice@example.com").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/ai/chat",
            Some(&token),
            Some(json!({ "prompt": "How do I start journaling?" })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["model"], "scripted");
}
