//! # danci-core - vocabulary flashcard and quiz core
//!
//! Pure logic behind a word-learning app, with no UI or network code:
//!
//! - **Review scheduling** - fixed-interval forgetting curve scaled by difficulty
//! - **Recommendation** - priority ranking from error rate, recency and difficulty
//! - **Quizzes** - choice / fill-blank / spelling generation and a timed test runner
//! - **Progress** - event log, experience, levels, streaks and achievements
//!
//! ## Modules
//!
//! - [`catalog`] - word catalog, JSON loading, sample data
//! - [`scheduler`] - next review date and due words
//! - [`ranker`] - recommendation scores
//! - [`learning`] - session word selection and flashcard sessions
//! - [`generator`] - question generation with an injected RNG
//! - [`quiz`] - test state machine and scoring
//! - [`timer`] - tokio countdown feeding the test runner
//! - [`ledger`] - single writer of user progress
//! - [`achievements`] - built-in achievement definitions
//! - [`stats`] - weak/strong words, accuracy and weekly figures
//! - [`format`] - display helpers
//! - [`context`] - per-user study context tying the above together
//! - [`store`] - persistence collaborator
//! - [`config`], [`logging`], [`error`] - ambient plumbing
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use danci_core::{SessionMode, StudyConfig, StudyContext, WordCatalog};
//!
//! let catalog = WordCatalog::sample().unwrap();
//! let mut ctx = StudyContext::new("demo", catalog, StudyConfig::default(), Utc::now());
//! ctx.start_card_session(SessionMode::New, Utc::now());
//! ctx.respond_card(true, Utc::now()).unwrap();
//! assert_eq!(ctx.progress().learned_words.len(), 1);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod error;
pub mod types;

pub mod catalog;
pub mod scheduler;
pub mod ranker;
pub mod learning;
pub mod generator;
pub mod quiz;
pub mod timer;

pub mod achievements;
pub mod ledger;
pub mod stats;
pub mod format;

pub mod config;
pub mod context;
pub mod logging;
pub mod store;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use catalog::WordCatalog;
pub use config::StudyConfig;
pub use context::StudyContext;
pub use error::{CoreError, CoreResult};
pub use generator::generate_test;
pub use learning::{select_session_words, CardSession, SessionLimits};
pub use ledger::{exp_to_next_level, level_from_exp, level_progress, ProgressLedger};
pub use quiz::{CompletionReason, SessionState, TestSession};
pub use ranker::rank;
pub use scheduler::{is_due, next_review_date};
pub use store::{JsonFileStore, MemoryStore, ProgressStore, UserSnapshot};
pub use timer::CountdownTimer;
