//! Property-Based Tests for the scheduling, ranking and quiz core
//!
//! Invariants covered:
//! - Ranking: length is min(count, words) and scores never increase
//! - Levels: monotonic in experience, always within 1..=10
//! - Choice questions: correct answer appears exactly once among distinct options
//! - Fill-blank: no case-insensitive occurrence of the target survives, and
//!   putting the answer back into the prompt restores the word
//! - Scoring: bounded, 100 exactly when every answer is right
//! - Stats: weak and strong word sets never overlap

use std::collections::HashSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use danci_core::generator::{blank_out, choice_question, fill_blank_question};
use danci_core::quiz::score;
use danci_core::ranker::score_words;
use danci_core::stats::{strong_words, weak_words};
use danci_core::types::{QuestionKind, BLANK_MARKER, CHOICE_OPTION_COUNT};
use danci_core::{
    generate_test, level_from_exp, rank, LearningAction, LearningEvent, ProgressLedger,
    WordCatalog,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Events over the ten sample words, spread across sixty days
fn arb_history() -> impl Strategy<Value = Vec<LearningEvent>> {
    prop::collection::vec((1u32..=10, any::<bool>(), 0i64..60 * 24), 0..80).prop_map(|raw| {
        raw.into_iter()
            .map(|(id, correct, hours)| {
                LearningEvent::new(
                    id.to_string(),
                    "pbt",
                    LearningAction::Tested,
                    correct,
                    10,
                    3,
                    base_time() + Duration::hours(hours),
                )
            })
            .collect()
    })
}

fn arb_sentence() -> impl Strategy<Value = (String, String)> {
    (
        "[a-z]{2,8}",
        prop::collection::vec("[a-z]{1,10}", 0..5),
        prop::collection::vec("[a-z]{1,10}", 0..5),
        any::<bool>(),
    )
        .prop_map(|(target, before, after, upper)| {
            let shown = if upper { target.to_uppercase() } else { target.clone() };
            let mut parts = before;
            parts.push(shown);
            parts.extend(after);
            (target, format!("{}.", parts.join(" ")))
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_rank_is_sorted_prefix(history in arb_history(), count in 0usize..15) {
        let catalog = WordCatalog::sample().unwrap();
        let now = base_time() + Duration::days(61);
        let ranked = rank(catalog.words(), &history, count, now);
        prop_assert_eq!(ranked.len(), count.min(catalog.len()));

        let scores = score_words(catalog.words(), &history, now);
        let score_of = |id: &str| scores.iter().find(|p| p.word_id == id).map(|p| p.score).unwrap();
        for pair in ranked.windows(2) {
            prop_assert!(score_of(&pair[0].id) >= score_of(&pair[1].id));
        }
    }

    #[test]
    fn prop_level_is_monotonic(a in 0u32..5000, b in 0u32..5000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(level_from_exp(lo) <= level_from_exp(hi));
        prop_assert!((1..=10).contains(&level_from_exp(hi)));
    }

    #[test]
    fn prop_choice_options_hold_answer_once(seed in any::<u64>(), pick in 0usize..10) {
        let catalog = WordCatalog::sample().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let word = &catalog.words()[pick];
        let question = choice_question(word, catalog.words(), &mut rng);
        let options = question.options.clone().unwrap();

        prop_assert_eq!(options.len(), CHOICE_OPTION_COUNT);
        prop_assert_eq!(options.iter().filter(|o| **o == question.correct_answer).count(), 1);
        let distinct: HashSet<&String> = options.iter().collect();
        prop_assert_eq!(distinct.len(), options.len());
    }

    #[test]
    fn prop_blank_out_removes_target((target, sentence) in arb_sentence()) {
        let blanked = blank_out(&sentence, &target);
        prop_assert!(blanked.contains(BLANK_MARKER));
        prop_assert!(!blanked.to_lowercase().contains(&target));
    }

    #[test]
    fn prop_fill_blank_round_trip(
        pick in 0usize..10,
        (target, sentence) in arb_sentence(),
        use_sample in any::<bool>(),
    ) {
        let catalog = WordCatalog::sample().unwrap();
        let mut word = catalog.words()[pick].clone();
        if !use_sample {
            word.text = target;
            word.examples.truncate(1);
            if let Some(example) = word.examples.first_mut() {
                example.sentence = sentence;
            }
        }
        let question = fill_blank_question(&word);
        let blanked = question.prompt.strip_prefix("填空：").unwrap();
        prop_assert!(blanked.contains(BLANK_MARKER));

        let restored = blanked.replace(BLANK_MARKER, &question.correct_answer);
        prop_assert!(restored.to_lowercase().contains(&word.text.to_lowercase()));
    }

    #[test]
    fn prop_generate_test_uses_distinct_words(seed in any::<u64>(), count in 0usize..20) {
        let catalog = WordCatalog::sample().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let questions = generate_test(catalog.words(), count, &QuestionKind::ALL, &mut rng);
        prop_assert_eq!(questions.len(), count.min(catalog.len()));
        let ids: HashSet<&str> = questions.iter().map(|q| q.word_id.as_str()).collect();
        prop_assert_eq!(ids.len(), questions.len());
    }

    #[test]
    fn prop_choice_test_has_full_options(seed in any::<u64>(), count in 1usize..=10) {
        let catalog = WordCatalog::sample().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let questions = generate_test(catalog.words(), count, &[QuestionKind::Choice], &mut rng);
        prop_assert_eq!(questions.len(), count);
        for q in &questions {
            let options = q.options.as_ref().unwrap();
            prop_assert_eq!(options.len(), CHOICE_OPTION_COUNT);
            prop_assert_eq!(options.iter().filter(|o| **o == q.correct_answer).count(), 1);
        }
    }

    #[test]
    fn prop_score_bounds(total in 1usize..=100, correct_seed in any::<usize>()) {
        let correct = correct_seed % (total + 1);
        let s = score(correct, total);
        prop_assert!(s <= 100);
        prop_assert_eq!(s == 100, correct == total);
    }

    #[test]
    fn prop_weak_and_strong_disjoint(history in arb_history()) {
        let weak: HashSet<String> = weak_words(&history, 0.5).into_iter().collect();
        let strong: HashSet<String> = strong_words(&history, 0.8).into_iter().collect();
        prop_assert!(weak.is_disjoint(&strong));
    }

    #[test]
    fn prop_learned_exp_counts_distinct_words(ids in prop::collection::vec(0u8..20, 0..60)) {
        let mut ledger = ProgressLedger::new("pbt", base_time());
        for id in &ids {
            ledger.mark_learned(&id.to_string());
        }
        let distinct: HashSet<u8> = ids.iter().copied().collect();
        prop_assert_eq!(ledger.progress().total_exp as usize, distinct.len() * 5);
        prop_assert_eq!(ledger.progress().current_level, level_from_exp(ledger.progress().total_exp));
    }
}
