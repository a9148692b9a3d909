//! Question Generator
//!
//! Builds choice, fill-blank and spelling questions from catalog words. All
//! randomness comes from the caller's RNG so a seeded `ChaCha8Rng` gives a
//! reproducible test.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use regex::RegexBuilder;

use crate::types::{
    QuestionKind, TestQuestion, WordEntry, BLANK_MARKER, CHOICE_OPTION_COUNT,
};

pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// Generate up to `question_count` questions, one per distinct word.
///
/// Each word gets a kind drawn uniformly from `allowed_kinds`; an empty slice
/// means choice only.
pub fn generate_test<R: Rng + ?Sized>(
    words: &[WordEntry],
    question_count: usize,
    allowed_kinds: &[QuestionKind],
    rng: &mut R,
) -> Vec<TestQuestion> {
    let mut selected: Vec<&WordEntry> = words.iter().collect();
    selected.shuffle(rng);
    selected.truncate(question_count);

    selected
        .into_iter()
        .map(|word| {
            let kind = allowed_kinds
                .choose(rng)
                .copied()
                .unwrap_or(QuestionKind::Choice);
            build_question(kind, word, words, rng)
        })
        .collect()
}

pub fn build_question<R: Rng + ?Sized>(
    kind: QuestionKind,
    word: &WordEntry,
    all_words: &[WordEntry],
    rng: &mut R,
) -> TestQuestion {
    match kind {
        QuestionKind::Choice => choice_question(word, all_words, rng),
        QuestionKind::FillBlank => fill_blank_question(word),
        QuestionKind::Spelling => spelling_question(word),
    }
}

fn question_id(kind: QuestionKind, word: &WordEntry) -> String {
    format!("{}-{}", kind.id_prefix(), word.id)
}

/// Review line shown after answering: surface form, phonetic and meaning
fn explanation(word: &WordEntry) -> String {
    format!("{} - {} - {}", word.text, word.phonetic, word.primary_meaning())
}

/// Options are the correct meaning plus up to three distinct distractors.
/// A catalog with fewer than four distinct meanings yields fewer options.
pub fn choice_question<R: Rng + ?Sized>(
    word: &WordEntry,
    all_words: &[WordEntry],
    rng: &mut R,
) -> TestQuestion {
    let correct = word.primary_meaning().to_string();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut distractors: Vec<&str> = all_words
        .iter()
        .filter(|w| w.id != word.id)
        .map(|w| w.primary_meaning())
        .filter(|m| !m.is_empty() && *m != correct && seen.insert(*m))
        .collect();
    distractors.shuffle(rng);
    distractors.truncate(CHOICE_OPTION_COUNT - 1);

    let mut options: Vec<String> = Vec::with_capacity(CHOICE_OPTION_COUNT);
    options.push(correct.clone());
    options.extend(distractors.into_iter().map(str::to_string));
    options.shuffle(rng);

    if options.len() < CHOICE_OPTION_COUNT {
        tracing::debug!(
            word_id = %word.id,
            options = options.len(),
            "not enough distinct meanings for a full choice question"
        );
    }

    TestQuestion {
        id: question_id(QuestionKind::Choice, word),
        word_id: word.id.clone(),
        kind: QuestionKind::Choice,
        prompt: format!("\"{}\" 的中文意思是？", word.text),
        options: Some(options),
        explanation: explanation(word),
        correct_answer: correct,
    }
}

/// Replace every case-insensitive occurrence of `target` with the blank marker.
pub fn blank_out(sentence: &str, target: &str) -> String {
    if target.is_empty() {
        return sentence.to_string();
    }
    match RegexBuilder::new(&regex::escape(target))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re.replace_all(sentence, BLANK_MARKER).into_owned(),
        Err(_) => sentence.to_string(),
    }
}

pub fn fill_blank_question(word: &WordEntry) -> TestQuestion {
    // An example that never spells the word out would leave nothing to fill.
    let target = word.text.to_lowercase();
    let sentence = match word.first_example() {
        Some(example) if example.sentence.to_lowercase().contains(&target) => {
            example.sentence.clone()
        }
        _ => format!("This is a {}.", word.text),
    };
    let blanked = blank_out(&sentence, &word.text);

    TestQuestion {
        id: question_id(QuestionKind::FillBlank, word),
        word_id: word.id.clone(),
        kind: QuestionKind::FillBlank,
        prompt: format!("填空：{blanked}"),
        options: None,
        correct_answer: word.text.clone(),
        explanation: explanation(word),
    }
}

pub fn spelling_question(word: &WordEntry) -> TestQuestion {
    TestQuestion {
        id: question_id(QuestionKind::Spelling, word),
        word_id: word.id.clone(),
        kind: QuestionKind::Spelling,
        prompt: format!("请拼写：{}", word.primary_meaning()),
        options: None,
        correct_answer: word.text.to_lowercase(),
        explanation: explanation(word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::WordCatalog;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_choice_questions_have_four_options() {
        let catalog = WordCatalog::sample().unwrap();
        let questions = generate_test(catalog.words(), 5, &[QuestionKind::Choice], &mut rng());
        assert_eq!(questions.len(), 5);
        for q in &questions {
            let options = q.options.as_ref().expect("choice options");
            assert_eq!(options.len(), 4);
            assert_eq!(options.iter().filter(|o| **o == q.correct_answer).count(), 1);
            assert!(q.id.starts_with("choice-"));
        }
    }

    #[test]
    fn test_distinct_words_per_test() {
        let catalog = WordCatalog::sample().unwrap();
        let questions = generate_test(catalog.words(), 10, &QuestionKind::ALL, &mut rng());
        let ids: HashSet<&str> = questions.iter().map(|q| q.word_id.as_str()).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_count_capped_by_catalog() {
        let catalog = WordCatalog::sample().unwrap();
        let questions = generate_test(catalog.words(), 25, &[QuestionKind::Spelling], &mut rng());
        assert_eq!(questions.len(), 10);
        assert!(generate_test(&[], 5, &QuestionKind::ALL, &mut rng()).is_empty());
    }

    #[test]
    fn test_same_seed_same_test() {
        let catalog = WordCatalog::sample().unwrap();
        let a = generate_test(catalog.words(), 6, &QuestionKind::ALL, &mut rng());
        let b = generate_test(catalog.words(), 6, &QuestionKind::ALL, &mut rng());
        assert_eq!(a, b);
    }

    #[test]
    fn test_small_catalog_gives_fewer_options() {
        let catalog = WordCatalog::sample().unwrap();
        let words = &catalog.words()[..2];
        let q = choice_question(&words[0], words, &mut rng());
        let options = q.options.unwrap();
        assert_eq!(options.len(), 2);
        assert!(options.contains(&"抛弃；放弃".to_string()));
    }

    #[test]
    fn test_fill_blank_replaces_case_insensitively() {
        let catalog = WordCatalog::sample().unwrap();
        let actually = catalog.get("8").unwrap();
        let q = fill_blank_question(actually);
        assert_eq!(q.prompt, "填空：____, I prefer tea to coffee.");
        assert_eq!(q.correct_answer, "actually");
        assert!(q.options.is_none());
    }

    #[test]
    fn test_fill_blank_without_example_uses_template() {
        let catalog = WordCatalog::sample().unwrap();
        let mut word = catalog.get("1").unwrap().clone();
        word.examples.clear();
        let q = fill_blank_question(&word);
        assert_eq!(q.prompt, "填空：This is a ____.");
    }

    #[test]
    fn test_fill_blank_skips_example_without_word() {
        let catalog = WordCatalog::sample().unwrap();
        // "The school offers many after-school activities."
        let activity = catalog.get("7").unwrap();
        let q = fill_blank_question(activity);
        assert_eq!(q.prompt, "填空：This is a ____.");
        assert_eq!(q.correct_answer, "activity");
    }

    #[test]
    fn test_blank_out_all_occurrences() {
        assert_eq!(blank_out("Run, run, RUN!", "run"), "____, ____, ____!");
        assert_eq!(blank_out("nothing here", ""), "nothing here");
        assert_eq!(blank_out("a.b axb", "a.b"), "____ axb");
    }

    #[test]
    fn test_spelling_answer_is_lowercase() {
        let catalog = WordCatalog::sample().unwrap();
        let mut word = catalog.get("2").unwrap().clone();
        word.text = "Ability".to_string();
        let q = spelling_question(&word);
        assert_eq!(q.correct_answer, "ability");
        assert_eq!(q.prompt, "请拼写：能力；才能");
        assert_eq!(q.explanation, "Ability - /əˈbɪləti/ - 能力；才能");
    }
}
