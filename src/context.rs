//! Study Context
//!
//! Per-user session object. It owns the catalog, the ledger, settings and
//! whichever card session or test is live, and is the only place where
//! session outcomes are turned into ledger writes.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;

use crate::catalog::WordCatalog;
use crate::config::StudyConfig;
use crate::error::{CoreError, CoreResult};
use crate::learning::CardSession;
use crate::ledger::ProgressLedger;
use crate::quiz::{SessionState, TestSession};
use crate::ranker;
use crate::scheduler;
use crate::stats::{self, DailyStats, WeeklySummary};
use crate::store::{ProgressStore, UserSnapshot};
use crate::timer::CountdownTimer;
use crate::types::{
    Achievement, LearningAction, LearningEvent, LearningStats, SessionMode, SettingsPatch,
    TestMode, TestResult, UserProgress, UserSettings, WordEntry,
};

/// Difficulty recorded for events whose word is missing from the catalog
const FALLBACK_DIFFICULTY: u8 = 3;

#[derive(Debug)]
pub struct StudyContext {
    catalog: WordCatalog,
    config: StudyConfig,
    settings: UserSettings,
    ledger: ProgressLedger,
    card_session: Option<CardSession>,
    test: Option<TestSession>,
    /// Ticker driving the running test, dropped when the test ends
    countdown: Option<CountdownTimer>,
}

impl StudyContext {
    pub fn new(
        user_id: &str,
        catalog: WordCatalog,
        config: StudyConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let mut ledger = ProgressLedger::new(user_id, now);
        ledger.set_goals(config.daily_goal, config.weekly_goal);
        let mut settings = UserSettings::new(user_id);
        settings.daily_goal = config.daily_goal;
        Self {
            catalog,
            config,
            settings,
            ledger,
            card_session: None,
            test: None,
            countdown: None,
        }
    }

    /// Resume a user from `store`, or start fresh when nothing is stored.
    pub fn restore<S: ProgressStore + ?Sized>(
        store: &S,
        user_id: &str,
        catalog: WordCatalog,
        config: StudyConfig,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let Some(snapshot) = store.load(user_id)? else {
            tracing::info!(user_id, "no stored progress, starting fresh");
            return Ok(Self::new(user_id, catalog, config, now));
        };
        tracing::info!(
            user_id,
            events = snapshot.events.len(),
            learned = snapshot.progress.learned_words.len(),
            "progress restored"
        );
        let ledger = ProgressLedger::from_parts(
            snapshot.progress,
            snapshot.events,
            snapshot.test_results,
            snapshot.achievements,
            now,
        );
        Ok(Self {
            catalog,
            config,
            settings: snapshot.settings,
            ledger,
            card_session: None,
            test: None,
            countdown: None,
        })
    }

    pub fn save<S: ProgressStore + ?Sized>(&self, store: &mut S) -> CoreResult<()> {
        store.save(&self.snapshot())
    }

    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            progress: self.ledger.progress().clone(),
            settings: self.settings.clone(),
            events: self.ledger.events().to_vec(),
            test_results: self.ledger.test_results().to_vec(),
            achievements: self.ledger.achievements().to_vec(),
        }
    }

    pub fn user_id(&self) -> &str {
        self.ledger.user_id()
    }

    pub fn catalog(&self) -> &WordCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    pub fn progress(&self) -> &UserProgress {
        self.ledger.progress()
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) -> &UserSettings {
        self.settings.apply(patch);
        let weekly = self.ledger.progress().weekly_goal;
        self.ledger.set_goals(self.settings.daily_goal, weekly);
        &self.settings
    }

    // ==================== Recording ====================

    fn difficulty_of(&self, word_id: &str) -> u8 {
        self.catalog
            .get(word_id)
            .map_or(FALLBACK_DIFFICULTY, |w| w.difficulty)
    }

    /// Append an event, promote the word to mastered once it has a long
    /// enough correct run, then check achievements. A promotion is logged
    /// as its own `Mastered` event.
    pub fn record_event(&mut self, event: LearningEvent) -> Vec<&'static Achievement> {
        let now = event.timestamp;
        let word_id = event.word_id.clone();
        let correct = event.correct;
        self.ledger.record_event(event);

        if correct
            && self.ledger.progress().is_learned(&word_id)
            && scheduler::consecutive_correct(self.ledger.events(), &word_id)
                >= self.config.mastery_streak
            && self.ledger.mark_mastered(&word_id)
        {
            let promotion = LearningEvent::new(
                word_id.clone(),
                self.ledger.user_id(),
                LearningAction::Mastered,
                true,
                0,
                self.difficulty_of(&word_id),
                now,
            );
            self.ledger.record_event(promotion);
        }
        self.ledger.evaluate_achievements(now)
    }

    /// Mark a word as known outside any session.
    pub fn mark_word_learned(&mut self, word_id: &str, now: DateTime<Utc>) -> CoreResult<bool> {
        if self.catalog.get(word_id).is_none() {
            return Err(CoreError::NotFound(format!("word {word_id}")));
        }
        let added = self.ledger.mark_learned(word_id);
        self.ledger.evaluate_achievements(now);
        Ok(added)
    }

    // ==================== Card sessions ====================

    pub fn start_card_session(&mut self, mode: SessionMode, now: DateTime<Utc>) -> &CardSession {
        let session = CardSession::start(
            &self.catalog,
            Some(self.ledger.progress()),
            mode,
            self.config.session_limits(),
            now,
        );
        self.card_session.insert(session)
    }

    pub fn card_session(&self) -> Option<&CardSession> {
        self.card_session.as_ref()
    }

    pub fn current_card(&self) -> Option<&WordEntry> {
        self.card_session
            .as_ref()
            .and_then(|s| s.current_word(&self.catalog))
    }

    /// Known cards become learned; either way the verdict is logged.
    pub fn respond_card(&mut self, known: bool, now: DateTime<Utc>) -> CoreResult<Option<LearningEvent>> {
        let session = self
            .card_session
            .as_mut()
            .ok_or_else(|| CoreError::NotFound("card session".to_string()))?;
        let Some(event) = session.respond(&self.catalog, self.ledger.user_id(), known, now) else {
            return Ok(None);
        };
        if event.action == LearningAction::Learned {
            self.ledger.mark_learned(&event.word_id);
        }
        self.record_event(event.clone());
        Ok(Some(event))
    }

    pub fn end_card_session(&mut self) -> Option<CardSession> {
        self.card_session.take()
    }

    // ==================== Tests ====================

    /// Start a test over the whole catalog, dropping any test still running.
    pub fn start_test<R: Rng + ?Sized>(
        &mut self,
        mode: TestMode,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> CoreResult<&TestSession> {
        self.countdown = None;
        if let Some(previous) = self.test.take() {
            previous.abandon();
        }
        let mut session = TestSession::with_time_limit(
            self.ledger.user_id(),
            mode,
            self.config.question_count,
            self.config.seconds_per_question,
        );
        session.start(self.catalog.words(), rng, now)?;
        Ok(&*self.test.insert(session))
    }

    pub fn test(&self) -> Option<&TestSession> {
        self.test.as_ref()
    }

    /// Hand the running test's ticker to the context. It is dropped, and
    /// its task aborted, as soon as the test settles or is abandoned.
    pub fn attach_countdown(&mut self, timer: CountdownTimer) -> CoreResult<()> {
        if self.test.is_none() {
            return Err(CoreError::NotFound("running test".to_string()));
        }
        self.countdown = Some(timer);
        Ok(())
    }

    pub fn has_countdown(&self) -> bool {
        self.countdown.is_some()
    }

    fn live_test(&mut self) -> CoreResult<&mut TestSession> {
        self.test
            .as_mut()
            .ok_or_else(|| CoreError::NotFound("running test".to_string()))
    }

    pub fn answer(&mut self, index: usize, value: impl Into<String>) -> CoreResult<()> {
        self.live_test()?.answer(index, value)
    }

    pub fn answer_current(&mut self, value: impl Into<String>) -> CoreResult<()> {
        self.live_test()?.answer_current(value)
    }

    pub fn advance(&mut self, now: DateTime<Utc>) -> CoreResult<SessionState> {
        let state = self.live_test()?.advance()?;
        self.settle_if_completed(state, now);
        Ok(state)
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> CoreResult<SessionState> {
        let state = self.live_test()?.tick()?;
        self.settle_if_completed(state, now);
        Ok(state)
    }

    pub fn finish_test(&mut self, now: DateTime<Utc>) -> CoreResult<TestResult> {
        self.live_test()?.finish()?;
        self.settle(now)
    }

    /// Settle the running test as timed out, whatever time is left.
    pub fn time_expire(&mut self, now: DateTime<Utc>) -> CoreResult<TestResult> {
        self.live_test()?.time_expire()?;
        self.settle(now)
    }

    /// Leave the running test without scoring or logging anything.
    pub fn abandon_test(&mut self) -> Vec<String> {
        self.countdown = None;
        self.test.take().map(TestSession::abandon).unwrap_or_default()
    }

    pub fn last_test_result(&self) -> Option<&TestResult> {
        self.ledger.test_results().last()
    }

    fn settle_if_completed(&mut self, state: SessionState, now: DateTime<Utc>) {
        if state == SessionState::Completed {
            if let Err(err) = self.settle(now) {
                tracing::error!(error = %err, "failed to settle completed test");
            }
        }
    }

    /// Log one `Tested` event per question and store the result.
    fn settle(&mut self, now: DateTime<Utc>) -> CoreResult<TestResult> {
        self.countdown = None;
        let result = self
            .test
            .take()
            .and_then(TestSession::into_result)
            .ok_or_else(|| CoreError::NotFound("test result".to_string()))?;

        let total = result.questions.len() as u32;
        let share = if total == 0 { 0 } else { result.time_spent / total };
        let remainder = result.time_spent - share * total;
        for (i, (question, answer)) in result.questions.iter().zip(&result.answers).enumerate() {
            let spent = if i as u32 + 1 == total { share + remainder } else { share };
            let event = LearningEvent::new(
                question.word_id.clone(),
                result.user_id.clone(),
                LearningAction::Tested,
                question.is_correct(answer),
                spent,
                self.difficulty_of(&question.word_id),
                now,
            );
            self.record_event(event);
        }

        if result.score == 100 && !result.questions.is_empty() {
            self.ledger.unlock_achievement("perfect_score", now);
        }
        self.ledger.record_test_result(result.clone());
        self.ledger.evaluate_achievements(now);
        Ok(result)
    }

    // ==================== Queries ====================

    pub fn recommend(&self, count: usize, now: DateTime<Utc>) -> Vec<&WordEntry> {
        ranker::rank(self.catalog.words(), self.ledger.events(), count, now)
    }

    pub fn due_words(&self, now: DateTime<Utc>) -> Vec<&WordEntry> {
        scheduler::due_words(self.catalog.words(), self.ledger.events(), now)
    }

    pub fn refresh_stats(&mut self, now: DateTime<Utc>) -> &LearningStats {
        self.ledger
            .refresh_stats(self.config.weak_threshold, self.config.strong_threshold, now)
    }

    pub fn weekly_summary(&self, now: DateTime<Utc>) -> WeeklySummary {
        stats::weekly_summary(self.ledger.events(), self.settings.daily_goal, now)
    }

    pub fn daily_breakdown(&self, start: NaiveDate, end: NaiveDate) -> Vec<DailyStats> {
        stats::daily_breakdown(self.ledger.events(), start, end)
    }
}
