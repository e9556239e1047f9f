use serde::Serialize;

use crate::services::scoring_policy::{
    ScoringPolicy, TaskType, MAX_WORD_COUNT_PENALTY, WORDS_PER_PENALTY_STEP,
    WORD_PENALTY_PER_STEP,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyReason {
    WordCount,
    Time,
}

/// A non-negative, capped deduction from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Penalty {
    pub reason: PenaltyReason,
    pub amount: f64,
}

impl Penalty {
    pub fn word_count(word_count: u32, task: TaskType, policy: &ScoringPolicy) -> Self {
        let amount = word_count_penalty(word_count, task, policy);
        Self { reason: PenaltyReason::WordCount, amount }
    }

    pub fn time(seconds_spent: u32, task: TaskType, policy: &ScoringPolicy) -> Self {
        Self { reason: PenaltyReason::Time, amount: policy.time_penalty(seconds_spent, task) }
    }

    pub fn applies(&self) -> bool {
        self.amount > 0.0
    }
}

/// Half a point per 25 missing words, prorated, never above 2.0.
pub fn word_count_penalty(word_count: u32, task: TaskType, policy: &ScoringPolicy) -> f64 {
    let minimum = policy.min_words(task);
    if word_count >= minimum {
        return 0.0;
    }

    let words_short = f64::from(minimum - word_count);
    let penalty = (words_short / WORDS_PER_PENALTY_STEP) * WORD_PENALTY_PER_STEP;
    penalty.min(MAX_WORD_COUNT_PENALTY)
}

pub fn time_penalty(seconds_spent: u32, task: TaskType, policy: &ScoringPolicy) -> f64 {
    policy.time_penalty(seconds_spent, task)
}

pub fn is_over_time_limit(seconds_spent: u32, task: TaskType, policy: &ScoringPolicy) -> bool {
    policy.is_over_time_limit(seconds_spent, task)
}

/// Live word-count feedback shown while an essay is being written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WordCountStatus {
    Met,
    Empty,
    Short { words_needed: u32, penalty: f64 },
}

impl WordCountStatus {
    pub fn evaluate(word_count: u32, task: TaskType, policy: &ScoringPolicy) -> Self {
        let minimum = policy.min_words(task);
        if word_count >= minimum {
            WordCountStatus::Met
        } else if word_count == 0 {
            WordCountStatus::Empty
        } else {
            WordCountStatus::Short {
                words_needed: minimum - word_count,
                penalty: word_count_penalty(word_count, task, policy),
            }
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            WordCountStatus::Short { words_needed, penalty } => Some(format!(
                "You need {words_needed} more words. Current penalty: -{penalty:.1} points"
            )),
            WordCountStatus::Met | WordCountStatus::Empty => None,
        }
    }
}
