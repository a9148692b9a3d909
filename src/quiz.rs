//! Test Runner
//!
//! Drives one test from question generation to a final score.
//!
//! ```text
//! NotStarted --start--> InProgress --advance past last / finish / time out--> Completed
//! ```
//!
//! `answer`, `advance` and `tick` are only valid while in progress. Once
//! completed the result is frozen; a new test needs a new session.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::generator::generate_test;
use crate::types::{TestMode, TestQuestion, TestResult, WordEntry, DEFAULT_SECONDS_PER_QUESTION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionReason {
    Finished,
    TimeExpired,
}

#[derive(Debug, Clone)]
pub struct TestSession {
    state: SessionState,
    user_id: String,
    mode: TestMode,
    question_count: usize,
    seconds_per_question: u32,
    time_budget: u32,
    time_left: u32,
    current_index: usize,
    result: Option<TestResult>,
    completion: Option<CompletionReason>,
}

impl TestSession {
    pub fn new(user_id: impl Into<String>, mode: TestMode, question_count: usize) -> Self {
        Self::with_time_limit(user_id, mode, question_count, DEFAULT_SECONDS_PER_QUESTION)
    }

    pub fn with_time_limit(
        user_id: impl Into<String>,
        mode: TestMode,
        question_count: usize,
        seconds_per_question: u32,
    ) -> Self {
        Self {
            state: SessionState::NotStarted,
            user_id: user_id.into(),
            mode,
            question_count,
            seconds_per_question,
            time_budget: 0,
            time_left: 0,
            current_index: 0,
            result: None,
            completion: None,
        }
    }

    fn expect_state(&self, expected: SessionState, action: &'static str) -> CoreResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }

    /// Generate questions from `words` and begin the countdown.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        words: &[WordEntry],
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.expect_state(SessionState::NotStarted, "start")?;
        let questions = generate_test(words, self.question_count, self.mode.allowed_kinds(), rng);
        self.begin(questions, now);
        Ok(())
    }

    /// Begin with a prepared question list instead of generating one.
    pub fn start_with_questions(
        &mut self,
        questions: Vec<TestQuestion>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.expect_state(SessionState::NotStarted, "start")?;
        self.begin(questions, now);
        Ok(())
    }

    fn begin(&mut self, questions: Vec<TestQuestion>, now: DateTime<Utc>) {
        let total = questions.len();
        self.time_budget = self
            .seconds_per_question
            .saturating_mul(self.question_count as u32);
        self.time_left = self.time_budget;
        self.current_index = 0;
        self.result = Some(TestResult {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            mode: self.mode,
            answers: vec![String::new(); total],
            questions,
            score: 0,
            total_questions: total,
            time_spent: 0,
            timestamp: now,
        });
        self.state = SessionState::InProgress;
        tracing::info!(
            user_id = %self.user_id,
            mode = ?self.mode,
            questions = total,
            budget_secs = self.time_budget,
            "test started"
        );
    }

    /// Record an answer in place; any slot may be revisited.
    pub fn answer(&mut self, index: usize, value: impl Into<String>) -> CoreResult<()> {
        self.expect_state(SessionState::InProgress, "answer")?;
        let result = self.result_mut()?;
        let total = result.answers.len();
        match result.answers.get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(CoreError::QuestionOutOfRange { index, total }),
        }
    }

    pub fn answer_current(&mut self, value: impl Into<String>) -> CoreResult<()> {
        self.answer(self.current_index, value)
    }

    /// Move to the next question, finishing the test after the last one.
    pub fn advance(&mut self) -> CoreResult<SessionState> {
        self.expect_state(SessionState::InProgress, "advance")?;
        if self.current_index + 1 < self.total_questions() {
            self.current_index += 1;
        } else {
            self.complete(CompletionReason::Finished);
        }
        Ok(self.state)
    }

    /// One second of the countdown; expires the test at zero.
    pub fn tick(&mut self) -> CoreResult<SessionState> {
        self.expect_state(SessionState::InProgress, "tick")?;
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.complete(CompletionReason::TimeExpired);
        }
        Ok(self.state)
    }

    pub fn time_expire(&mut self) -> CoreResult<&TestResult> {
        self.expect_state(SessionState::InProgress, "time_expire")?;
        self.complete(CompletionReason::TimeExpired);
        self.result_ref()
    }

    pub fn finish(&mut self) -> CoreResult<&TestResult> {
        self.expect_state(SessionState::InProgress, "finish")?;
        self.complete(CompletionReason::Finished);
        self.result_ref()
    }

    /// Leave without scoring; returns the partial answers so the caller can
    /// keep or drop them.
    pub fn abandon(self) -> Vec<String> {
        tracing::info!(user_id = %self.user_id, state = ?self.state, "test abandoned");
        self.result.map(|r| r.answers).unwrap_or_default()
    }

    fn complete(&mut self, reason: CompletionReason) {
        let elapsed = self.time_budget - self.time_left;
        if let Some(result) = self.result.as_mut() {
            result.score = score(result.correct_count(), result.total_questions);
            result.time_spent = elapsed;
            tracing::info!(
                test_id = %result.id,
                score = result.score,
                ?reason,
                elapsed_secs = elapsed,
                "test completed"
            );
        }
        self.completion = Some(reason);
        self.state = SessionState::Completed;
    }

    fn result_mut(&mut self) -> CoreResult<&mut TestResult> {
        self.result
            .as_mut()
            .ok_or_else(|| CoreError::NotFound("test result".to_string()))
    }

    fn result_ref(&self) -> CoreResult<&TestResult> {
        self.result
            .as_ref()
            .ok_or_else(|| CoreError::NotFound("test result".to_string()))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> TestMode {
        self.mode
    }

    pub fn completion(&self) -> Option<CompletionReason> {
        self.completion
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_questions(&self) -> usize {
        self.result.as_ref().map_or(0, |r| r.total_questions)
    }

    pub fn current_question(&self) -> Option<&TestQuestion> {
        self.result
            .as_ref()
            .and_then(|r| r.questions.get(self.current_index))
    }

    /// Snapshot of the test; `score` is meaningful only once completed.
    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<TestResult> {
        self.result
    }
}

/// `round(100 * correct / total)`, 0 for an empty test
pub fn score(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * correct as f64 / total as f64).round() as u32
}
