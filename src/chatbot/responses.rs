//! Taught keyword responses.
//!
//! Entries keep the order they were first taught in. A message matches an
//! entry when it contains the keyword (case-sensitive); the earliest matching
//! entry wins and one of its responses is picked at random.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chatbot::storage::{Storage, load_or_default, save_json};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEntry {
    pub keyword: String,
    pub responses: Vec<String>,
}

pub struct ResponseStore {
    entries: Vec<ResponseEntry>,
    storage: Box<dyn Storage>,
}

impl ResponseStore {
    pub fn load(storage: Box<dyn Storage>) -> Self {
        let entries: Vec<ResponseEntry> = load_or_default(storage.as_ref(), "responses");
        info!("{} keyword entries loaded", entries.len());
        Self { entries, storage }
    }

    /// Candidate responses for the first entry whose keyword occurs in `text`.
    pub fn candidates(&self, text: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| !e.responses.is_empty() && text.contains(&e.keyword))
            .map(|e| e.responses.as_slice())
    }

    /// A random response for `text`, if any keyword matches.
    pub fn lookup_response(&self, text: &str) -> Option<String> {
        self.candidates(text)?.choose(&mut rand::rng()).cloned()
    }

    /// Append responses to a keyword, creating the entry if needed.
    /// Returns `false` without touching anything when `responses` is empty.
    pub fn teach(&mut self, keyword: &str, responses: Vec<String>) -> bool {
        if responses.is_empty() {
            return false;
        }

        match self.entries.iter_mut().find(|e| e.keyword == keyword) {
            Some(entry) => entry.responses.extend(responses),
            None => self.entries.push(ResponseEntry {
                keyword: keyword.to_string(),
                responses,
            }),
        }

        info!("📚 Learned responses for {:?}", keyword);
        self.persist();
        true
    }

    /// Remove a keyword and all its responses.
    pub fn delete_by_keyword(&mut self, keyword: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.keyword != keyword);
        if self.entries.len() == before {
            return false;
        }

        info!("🗑️ Forgot responses for {:?}", keyword);
        self.persist();
        true
    }

    pub fn entries(&self) -> &[ResponseEntry] {
        &self.entries
    }

    fn persist(&self) {
        if let Err(e) = save_json(self.storage.as_ref(), &self.entries) {
            warn!("Failed to save responses to {}: {e}", self.storage.location());
        }
    }
}
