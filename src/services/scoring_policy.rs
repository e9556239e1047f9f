use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub const TASK1_MIN_WORDS: u32 = 150;
pub const TASK2_MIN_WORDS: u32 = 250;

pub const TASK1_TIME_LIMIT_MINUTES: u32 = 20;
pub const TASK2_TIME_LIMIT_MINUTES: u32 = 40;

/// Half a band per this many missing words, prorated for partial blocks.
pub const WORDS_PER_PENALTY_STEP: f64 = 25.0;
pub const WORD_PENALTY_PER_STEP: f64 = 0.5;
pub const MAX_WORD_COUNT_PENALTY: f64 = 2.0;

pub const DEFAULT_TIME_PENALTY_PER_MINUTE: f64 = 0.1;
pub const DEFAULT_TIME_PENALTY_CAP: f64 = 1.0;

pub const TASK1_WEIGHT: f64 = 1.0 / 3.0;
pub const TASK2_WEIGHT: f64 = 2.0 / 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Task1,
    Task2,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Task1 => "task1",
            TaskType::Task2 => "task2",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "task1" | "task_1" | "1" => Some(TaskType::Task1),
            "task2" | "task_2" | "2" => Some(TaskType::Task2),
            _ => None,
        }
    }

    /// Derives the task from a practice exercise id. VSTEP letters and IELTS
    /// report tasks are Task 1; anything essay-like falls back to Task 2.
    pub fn from_exercise_id(exercise_id: &str) -> Self {
        if exercise_id.contains("vstep_task1") {
            return TaskType::Task1;
        }
        if exercise_id.contains("vstep_task2") {
            return TaskType::Task2;
        }
        if exercise_id.contains("_task1") {
            return TaskType::Task1;
        }
        if exercise_id.contains("_task2") {
            return TaskType::Task2;
        }
        if exercise_id.contains("ielts_academic") || exercise_id.contains("ielts_general") {
            return TaskType::Task1;
        }
        TaskType::Task2
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduction for going over the task's time limit.
pub trait TimePenaltyRule: fmt::Debug + Send + Sync {
    /// `seconds_over` is strictly positive; the caller handles the in-time case.
    fn penalty(&self, seconds_over: u32, task: TaskType) -> f64;
}

/// Over-time essays are only flagged, never penalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTimePenalty;

impl TimePenaltyRule for NoTimePenalty {
    fn penalty(&self, _seconds_over: u32, _task: TaskType) -> f64 {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerMinuteOverrun {
    pub points_per_minute: f64,
    pub cap: f64,
}

impl Default for PerMinuteOverrun {
    fn default() -> Self {
        Self { points_per_minute: DEFAULT_TIME_PENALTY_PER_MINUTE, cap: DEFAULT_TIME_PENALTY_CAP }
    }
}

impl TimePenaltyRule for PerMinuteOverrun {
    fn penalty(&self, seconds_over: u32, _task: TaskType) -> f64 {
        let minutes_over = f64::from(seconds_over) / 60.0;
        (minutes_over * self.points_per_minute).min(self.cap).max(0.0)
    }
}

/// Configuration-level description of the time penalty rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimePenaltyMode {
    PerMinute { points_per_minute: f64, cap: f64 },
    Disabled,
}

impl TimePenaltyMode {
    pub fn into_rule(self) -> Arc<dyn TimePenaltyRule> {
        match self {
            TimePenaltyMode::PerMinute { points_per_minute, cap } => {
                Arc::new(PerMinuteOverrun { points_per_minute, cap })
            }
            TimePenaltyMode::Disabled => Arc::new(NoTimePenalty),
        }
    }
}

/// Immutable set of exam rules shared by every scoring call.
#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    task1_time_limit_minutes: u32,
    task2_time_limit_minutes: u32,
    time_penalty: Arc<dyn TimePenaltyRule>,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            task1_time_limit_minutes: TASK1_TIME_LIMIT_MINUTES,
            task2_time_limit_minutes: TASK2_TIME_LIMIT_MINUTES,
            time_penalty: Arc::new(PerMinuteOverrun::default()),
        }
    }
}

impl ScoringPolicy {
    pub fn with_time_limits(mut self, task1_minutes: u32, task2_minutes: u32) -> Self {
        self.task1_time_limit_minutes = task1_minutes;
        self.task2_time_limit_minutes = task2_minutes;
        self
    }

    pub fn with_time_penalty(mut self, rule: Arc<dyn TimePenaltyRule>) -> Self {
        self.time_penalty = rule;
        self
    }

    pub fn min_words(&self, task: TaskType) -> u32 {
        match task {
            TaskType::Task1 => TASK1_MIN_WORDS,
            TaskType::Task2 => TASK2_MIN_WORDS,
        }
    }

    pub fn time_limit_minutes(&self, task: TaskType) -> u32 {
        match task {
            TaskType::Task1 => self.task1_time_limit_minutes,
            TaskType::Task2 => self.task2_time_limit_minutes,
        }
    }

    pub fn time_limit_seconds(&self, task: TaskType) -> u32 {
        self.time_limit_minutes(task).saturating_mul(60)
    }

    /// Seconds past the limit; zero when within the limit or not tracked.
    pub fn seconds_over_limit(&self, seconds_spent: u32, task: TaskType) -> u32 {
        seconds_spent.saturating_sub(self.time_limit_seconds(task))
    }

    pub fn is_over_time_limit(&self, seconds_spent: u32, task: TaskType) -> bool {
        self.seconds_over_limit(seconds_spent, task) > 0
    }

    pub fn time_penalty(&self, seconds_spent: u32, task: TaskType) -> f64 {
        let seconds_over = self.seconds_over_limit(seconds_spent, task);
        if seconds_over == 0 {
            return 0.0;
        }
        let penalty = self.time_penalty.penalty(seconds_over, task);
        if penalty.is_finite() {
            penalty.max(0.0)
        } else {
            0.0
        }
    }
}
