//! Automation event types and EventBus
//!
//! Write handlers emit an [`AutomationEvent`] after a record is stored; the
//! automation engine subscribes and runs any matching user routines.
//!
//! Delivery is in-process only. There is no persistence, ordering guarantee
//! across emitters, or retry: an event emitted while nobody is subscribed is
//! dropped, and a receiver that lags behind the channel capacity loses the
//! oldest events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted on data writes
///
/// Serialized with a `type` tag holding the dotted event name
/// (e.g. `"mood.created"`), which is also what [`AutomationEvent::event_type`]
/// returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AutomationEvent {
    /// A mood entry was logged
    #[serde(rename = "mood.created")]
    MoodCreated {
        user_id: Uuid,
        entry_id: Uuid,
        /// Score on the 1-10 scale
        mood_score: i64,
        notes: Option<String>,
        tags: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// A mood entry at or below [`MOOD_ALERT_THRESHOLD`] was logged
    #[serde(rename = "mood.below_threshold")]
    MoodBelowThreshold {
        user_id: Uuid,
        entry_id: Uuid,
        mood_score: i64,
        timestamp: DateTime<Utc>,
    },

    #[serde(rename = "journal.created")]
    JournalCreated {
        user_id: Uuid,
        entry_id: Uuid,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// A habit was logged as completed for a day
    #[serde(rename = "habit.completed")]
    HabitCompleted {
        user_id: Uuid,
        habit_id: Uuid,
        habit_name: String,
        /// Calendar day (YYYY-MM-DD)
        date: String,
        timestamp: DateTime<Utc>,
    },

    /// A habit was logged as not completed for a day
    #[serde(rename = "habit.missed")]
    HabitMissed {
        user_id: Uuid,
        habit_id: Uuid,
        habit_name: String,
        date: String,
        timestamp: DateTime<Utc>,
    },

    #[serde(rename = "transaction.created")]
    TransactionCreated {
        user_id: Uuid,
        transaction_id: Uuid,
        description: String,
        amount: f64,
        /// "income" or "expense"
        kind: String,
        category: String,
        timestamp: DateTime<Utc>,
    },

    /// Monthly expenses in a category went over a budget's amount
    #[serde(rename = "budget.exceeded")]
    BudgetExceeded {
        user_id: Uuid,
        budget_id: Uuid,
        budget_name: String,
        category: String,
        spent: f64,
        limit: f64,
        timestamp: DateTime<Utc>,
    },

    /// A financial goal reached its target amount
    #[serde(rename = "goal.completed")]
    GoalCompleted {
        user_id: Uuid,
        goal_id: Uuid,
        title: String,
        category: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// A self-assessment (e.g. PHQ-9, GAD-7) was stored
    #[serde(rename = "assessment.completed")]
    AssessmentCompleted {
        user_id: Uuid,
        assessment_id: Uuid,
        assessment_type: String,
        timestamp: DateTime<Utc>,
    },

    #[serde(rename = "insight.created")]
    InsightCreated {
        user_id: Uuid,
        insight_id: Uuid,
        category: String,
        priority: String,
        timestamp: DateTime<Utc>,
    },
}

/// Mood scores at or below this value also emit `mood.below_threshold`
pub const MOOD_ALERT_THRESHOLD: i64 = 5;

impl AutomationEvent {
    /// Dotted event name, used for filtering and automation logs
    pub fn event_type(&self) -> &'static str {
        match self {
            AutomationEvent::MoodCreated { .. } => "mood.created",
            AutomationEvent::MoodBelowThreshold { .. } => "mood.below_threshold",
            AutomationEvent::JournalCreated { .. } => "journal.created",
            AutomationEvent::HabitCompleted { .. } => "habit.completed",
            AutomationEvent::HabitMissed { .. } => "habit.missed",
            AutomationEvent::TransactionCreated { .. } => "transaction.created",
            AutomationEvent::BudgetExceeded { .. } => "budget.exceeded",
            AutomationEvent::GoalCompleted { .. } => "goal.completed",
            AutomationEvent::AssessmentCompleted { .. } => "assessment.completed",
            AutomationEvent::InsightCreated { .. } => "insight.created",
        }
    }

    /// User whose routines may react to this event
    pub fn user_id(&self) -> Uuid {
        match self {
            AutomationEvent::MoodCreated { user_id, .. }
            | AutomationEvent::MoodBelowThreshold { user_id, .. }
            | AutomationEvent::JournalCreated { user_id, .. }
            | AutomationEvent::HabitCompleted { user_id, .. }
            | AutomationEvent::HabitMissed { user_id, .. }
            | AutomationEvent::TransactionCreated { user_id, .. }
            | AutomationEvent::BudgetExceeded { user_id, .. }
            | AutomationEvent::GoalCompleted { user_id, .. }
            | AutomationEvent::AssessmentCompleted { user_id, .. }
            | AutomationEvent::InsightCreated { user_id, .. } => *user_id,
        }
    }
}

/// Central distribution bus for automation events
///
/// Wraps `tokio::sync::broadcast`:
/// - publishing never blocks on slow subscribers
/// - any number of subscribers, cleaned up when dropped
/// - slow subscribers observe `RecvError::Lagged` and lose the oldest events
///
/// # Examples
///
/// ```
/// use lico_common::events::{AutomationEvent, EventBus};
/// use uuid::Uuid;
///
/// let bus = EventBus::new(64);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(AutomationEvent::JournalCreated {
///     user_id: Uuid::new_v4(),
///     entry_id: Uuid::new_v4(),
///     title: "Morning pages".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// let received = rx.try_recv().unwrap();
/// assert_eq!(received.event_type(), "journal.created");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AutomationEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per receiver
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<AutomationEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` with the unsent event otherwise.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: AutomationEvent,
    ) -> Result<usize, broadcast::error::SendError<AutomationEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: AutomationEvent) {
        let event_type = event.event_type();
        if self.tx.send(event).is_err() {
            tracing::debug!(event_type, "No automation subscribers, event dropped");
        }
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal_event(user_id: Uuid) -> AutomationEvent {
        AutomationEvent::JournalCreated {
            user_id,
            entry_id: Uuid::new_v4(),
            title: "Evening reflection".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let bus = EventBus::new(0);
        assert_eq!(bus.capacity(), 1);
        let mut rx = bus.subscribe();
        bus.emit(journal_event(Uuid::new_v4())).unwrap();
        assert_eq!(rx.try_recv().unwrap().event_type(), "journal.created");
    }

    #[test]
    fn test_eventbus_subscribe() {
        let bus = EventBus::new(10);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_emit_without_subscribers_is_error() {
        let bus = EventBus::new(10);
        assert!(bus.emit(journal_event(Uuid::new_v4())).is_err());
    }

    #[test]
    fn test_emit_lossy_without_subscribers_does_not_panic() {
        let bus = EventBus::new(2);
        for _ in 0..10 {
            bus.emit_lossy(journal_event(Uuid::new_v4()));
        }
        assert_eq!(bus.capacity(), 2);
    }

    #[test]
    fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        let user = Uuid::new_v4();

        assert_eq!(bus.emit(journal_event(user)).unwrap(), 2);

        assert_eq!(rx1.try_recv().unwrap().user_id(), user);
        assert_eq!(rx2.try_recv().unwrap().user_id(), user);
    }

    #[test]
    fn test_lagging_receiver_loses_oldest_events() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();

        for _ in 0..5 {
            bus.emit_lossy(journal_event(Uuid::new_v4()));
        }

        match rx.try_recv() {
            Err(broadcast::error::TryRecvError::Lagged(missed)) => assert_eq!(missed, 3),
            other => panic!("expected lag, got {:?}", other),
        }
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_serializes_with_dotted_type_tag() {
        let event = AutomationEvent::MoodCreated {
            user_id: Uuid::new_v4(),
            entry_id: Uuid::new_v4(),
            mood_score: 3,
            notes: None,
            tags: vec!["work".to_string()],
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "mood.created");
        assert_eq!(json["mood_score"], 3);
        assert_eq!(json["type"], event.event_type());
    }

    #[test]
    fn test_event_type_names() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let cases = vec![
            (
                AutomationEvent::HabitMissed {
                    user_id,
                    habit_id: Uuid::new_v4(),
                    habit_name: "Run".to_string(),
                    date: "2026-01-01".to_string(),
                    timestamp: now,
                },
                "habit.missed",
            ),
            (
                AutomationEvent::BudgetExceeded {
                    user_id,
                    budget_id: Uuid::new_v4(),
                    budget_name: "Food".to_string(),
                    category: "food".to_string(),
                    spent: 120.0,
                    limit: 100.0,
                    timestamp: now,
                },
                "budget.exceeded",
            ),
            (
                AutomationEvent::GoalCompleted {
                    user_id,
                    goal_id: Uuid::new_v4(),
                    title: "Emergency fund".to_string(),
                    category: None,
                    timestamp: now,
                },
                "goal.completed",
            ),
            (
                AutomationEvent::AssessmentCompleted {
                    user_id,
                    assessment_id: Uuid::new_v4(),
                    assessment_type: "PHQ-9".to_string(),
                    timestamp: now,
                },
                "assessment.completed",
            ),
        ];

        for (event, expected) in cases {
            assert_eq!(event.event_type(), expected);
            assert_eq!(event.user_id(), user_id);
        }
    }
}
