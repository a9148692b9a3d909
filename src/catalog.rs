//! Word Catalog
//!
//! Ordered, immutable collection of vocabulary entries. Catalog order is
//! significant: session selection walks it front to back.

use std::collections::HashMap;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{CoreError, CoreResult};
use crate::types::{DifficultyBand, WordEntry};

/// Built-in sample catalog
const SAMPLE_WORDS_JSON: &str = include_str!("../data/words.json");

#[derive(Debug, Clone, Default)]
pub struct WordCatalog {
    words: Vec<WordEntry>,
    index: HashMap<String, usize>,
}

impl WordCatalog {
    /// Build a catalog, keeping the first entry when ids repeat.
    pub fn new(words: Vec<WordEntry>) -> Self {
        let mut index = HashMap::with_capacity(words.len());
        let mut unique = Vec::with_capacity(words.len());
        for word in words {
            if index.contains_key(&word.id) {
                tracing::warn!(word_id = %word.id, "duplicate word id in catalog, skipped");
                continue;
            }
            index.insert(word.id.clone(), unique.len());
            unique.push(word);
        }
        Self {
            words: unique,
            index,
        }
    }

    pub fn from_json(json: &str) -> CoreResult<Self> {
        let words: Vec<WordEntry> = serde_json::from_str(json)?;
        for word in &words {
            if word.id.trim().is_empty() {
                return Err(CoreError::Catalog(format!(
                    "word '{}' has an empty id",
                    word.text
                )));
            }
            if !(1..=5).contains(&word.difficulty) {
                return Err(CoreError::Catalog(format!(
                    "word '{}' has difficulty {} outside 1-5",
                    word.id, word.difficulty
                )));
            }
        }
        Ok(Self::new(words))
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), words = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// The ten-word sample catalog bundled with the crate
    pub fn sample() -> CoreResult<Self> {
        Self::from_json(SAMPLE_WORDS_JSON)
    }

    pub fn words(&self) -> &[WordEntry] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&WordEntry> {
        self.index.get(id).map(|&i| &self.words[i])
    }

    pub fn by_band(&self, band: DifficultyBand) -> Vec<&WordEntry> {
        self.words
            .iter()
            .filter(|w| w.difficulty_band() == band)
            .collect()
    }

    pub fn by_part_of_speech(&self, pos: &str) -> Vec<&WordEntry> {
        self.words
            .iter()
            .filter(|w| w.has_part_of_speech(pos))
            .collect()
    }

    pub fn by_tag(&self, tag: &str) -> Vec<&WordEntry> {
        self.words.iter().filter(|w| w.has_tag(tag)).collect()
    }

    /// Up to `count` random words, optionally restricted to one difficulty.
    pub fn random_words<R: Rng + ?Sized>(
        &self,
        count: usize,
        difficulty: Option<u8>,
        rng: &mut R,
    ) -> Vec<&WordEntry> {
        let mut pool: Vec<&WordEntry> = match difficulty {
            Some(d) => self.words.iter().filter(|w| w.difficulty == d).collect(),
            None => self.words.iter().collect(),
        };
        pool.shuffle(rng);
        pool.truncate(count);
        pool
    }
}
