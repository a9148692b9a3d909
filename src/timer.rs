//! Countdown timer
//!
//! A tokio task that emits one tick per period on a channel. The task lives
//! as long as the `CountdownTimer` handle: cancelling or dropping the handle
//! aborts it, so a finished or abandoned test never leaves a stray ticker.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::error::CoreResult;
use crate::quiz::{SessionState, TestSession};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct CountdownTimer {
    handle: JoinHandle<()>,
}

impl CountdownTimer {
    /// Spawn the ticker on the current runtime. Ticks are numbered from 1.
    pub fn start(period: Duration) -> (Self, mpsc::Receiver<u64>) {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut seq = 0u64;
            loop {
                interval.tick().await;
                seq += 1;
                if tx.send(seq).await.is_err() {
                    break;
                }
            }
        });
        (Self { handle }, rx)
    }

    pub fn cancel(self) {
        // Drop aborts the task.
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Feed ticks into the session until it completes or the ticker stops.
///
/// Returns the final session state.
pub async fn run_countdown(
    session: &mut TestSession,
    ticks: &mut mpsc::Receiver<u64>,
) -> CoreResult<SessionState> {
    while session.state() == SessionState::InProgress {
        match ticks.recv().await {
            Some(_) => {
                session.tick()?;
            }
            None => break,
        }
    }
    Ok(session.state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::CompletionReason;
    use crate::types::{QuestionKind, TestMode, TestQuestion};
    use chrono::Utc;

    fn one_question() -> Vec<TestQuestion> {
        vec![TestQuestion {
            id: "spelling-1".into(),
            word_id: "1".into(),
            kind: QuestionKind::Spelling,
            prompt: String::new(),
            options: None,
            correct_answer: "abandon".into(),
            explanation: String::new(),
        }]
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_arrive_in_order() {
        let (timer, mut rx) = CountdownTimer::start(TICK_PERIOD);
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        timer.cancel();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_expires_session() {
        let mut session = TestSession::with_time_limit("u", TestMode::Mixed, 1, 5);
        session.start_with_questions(one_question(), Utc::now()).unwrap();

        let (timer, mut rx) = CountdownTimer::start(TICK_PERIOD);
        let state = run_countdown(&mut session, &mut rx).await.unwrap();
        drop(timer);

        assert_eq!(state, SessionState::Completed);
        assert_eq!(session.completion(), Some(CompletionReason::TimeExpired));
        assert_eq!(session.time_left(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_timer_stops_countdown() {
        let mut session = TestSession::with_time_limit("u", TestMode::Mixed, 1, 60);
        session.start_with_questions(one_question(), Utc::now()).unwrap();

        let (timer, mut rx) = CountdownTimer::start(TICK_PERIOD);
        rx.recv().await.unwrap();
        session.tick().unwrap();
        drop(timer);

        let state = run_countdown(&mut session, &mut rx).await.unwrap();
        assert_eq!(state, SessionState::InProgress);
        assert_eq!(session.time_left(), 59);
    }
}
