use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use danci_core::format::{format_relative_date, format_time};
use danci_core::logging::init_tracing;
use danci_core::timer::TICK_PERIOD;
use danci_core::{
    achievements, exp_to_next_level, CoreResult, CountdownTimer, JsonFileStore, MemoryStore,
    ProgressStore, SessionMode, StudyConfig, StudyContext, TestMode, WordCatalog,
};

/// Chance the simulated learner knows a flashcard
const KNOWN_PROBABILITY: f64 = 0.6;
/// Chance the simulated learner answers a question correctly
const CORRECT_PROBABILITY: f64 = 0.7;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = StudyConfig::from_env();
    let _log_guard = init_tracing(&config.log_level);

    if let Err(err) = run(config).await {
        tracing::error!(error = %err, "drill failed");
        std::process::exit(1);
    }
}

async fn run(config: StudyConfig) -> CoreResult<()> {
    let seed = std::env::var("DANCI_SEED")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(42);
    let user_id = std::env::var("DANCI_USER").unwrap_or_else(|_| "demo".to_string());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let catalog = match std::env::var("DANCI_CATALOG") {
        Ok(path) => WordCatalog::load(Path::new(&path))?,
        Err(_) => WordCatalog::sample()?,
    };
    let mut store: Box<dyn ProgressStore> = match std::env::var("DANCI_DATA_DIR") {
        Ok(dir) => Box::new(JsonFileStore::new(dir)?),
        Err(_) => Box::new(MemoryStore::new()),
    };

    let mut ctx = StudyContext::restore(store.as_ref(), &user_id, catalog, config, Utc::now())?;
    tracing::info!(%user_id, seed, words = ctx.catalog().len(), "drill started");

    // ==================== Flashcards ====================

    ctx.start_card_session(SessionMode::New, Utc::now());
    loop {
        match ctx.card_session() {
            Some(session) if !session.is_finished() => {}
            _ => break,
        }
        let known = rng.gen_bool(KNOWN_PROBABILITY);
        if let Some(event) = ctx.respond_card(known, Utc::now())? {
            let text = ctx
                .catalog()
                .get(&event.word_id)
                .map_or("?", |w| w.text.as_str());
            println!("card  {text:<16} {}", if known { "known" } else { "again" });
        }
    }
    if let Some(session) = ctx.end_card_session() {
        let stats = session.stats();
        println!(
            "cards done: {} known, {} to revisit, {} total",
            stats.known, stats.unknown, stats.total
        );
    }

    // ==================== Timed test ====================

    ctx.start_test(TestMode::Mixed, &mut rng, Utc::now())?;
    let (timer, mut ticks) = CountdownTimer::start(TICK_PERIOD);
    ctx.attach_countdown(timer)?;
    loop {
        let Some(question) = ctx.test().and_then(|t| t.current_question()).cloned() else {
            break;
        };
        let think = Duration::from_millis(rng.gen_range(100..400));
        tokio::select! {
            Some(_) = ticks.recv() => {
                ctx.tick(Utc::now())?;
            }
            _ = tokio::time::sleep(think) => {
                let answer = if rng.gen_bool(CORRECT_PROBABILITY) {
                    question.correct_answer.clone()
                } else {
                    String::from("?")
                };
                println!("quiz  {:<40} -> {answer}", question.prompt);
                ctx.answer_current(answer)?;
                ctx.advance(Utc::now())?;
            }
        }
    }
    if ctx.test().is_some() {
        ctx.finish_test(Utc::now())?;
    }

    // ==================== Summary ====================

    let now = Utc::now();
    if let Some(result) = ctx.last_test_result() {
        println!(
            "test: {}/{} correct, score {}, {}",
            result.correct_count(),
            result.total_questions,
            result.score,
            format_time(result.time_spent as u64)
        );
    }

    let stats = ctx.refresh_stats(now).clone();
    let progress = ctx.progress();
    println!(
        "level {} ({} exp, {} to next), streak {} day(s), studied {}",
        progress.current_level,
        progress.total_exp,
        exp_to_next_level(progress.total_exp),
        progress.streak,
        format_time(stats.total_study_time)
    );
    if let Some(last) = progress.last_study_date {
        println!("last study: {}", format_relative_date(last, now));
    }
    println!("weak words: {:?}", stats.weak_words);

    for record in ctx.ledger().achievements() {
        if let Some(def) = achievements::find(&record.achievement_id) {
            println!("achievement {} {} (+{} exp)", def.icon, def.name, def.exp);
        }
    }

    let next: Vec<&str> = ctx.recommend(3, now).iter().map(|w| w.text.as_str()).collect();
    println!("next up: {}", next.join(", "));

    ctx.save(store.as_mut())?;
    tracing::info!(%user_id, "drill finished");
    Ok(())
}
