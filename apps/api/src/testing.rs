//! In-process fakes shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::facts::FactsStore;
use crate::llm_client::{CompletionError, TextBackend};
use crate::models::facts::{Experience, UserFacts};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Nothing,
    Fail(u16),
}

/// Plays back canned replies in order, then keeps failing once the script runs out.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    exhausted: Reply,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedBackend {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(texts.into_iter().map(|t| Reply::Text(t.into())).collect()),
            exhausted: Reply::Fail(500),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            exhausted: Reply::Fail(status),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers every call with the same text.
    pub fn repeating(text: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            exhausted: Reply::Text(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn then_nothing(self) -> Self {
        self.replies.lock().unwrap().push_back(Reply::Nothing);
        self
    }

    /// `(prompt, model)` of every call received so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str, model: &str) -> Result<Option<String>, CompletionError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), model.to_string()));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.exhausted.clone());
        match reply {
            Reply::Text(text) => Ok(Some(text)),
            Reply::Nothing => Ok(None),
            Reply::Fail(status) => Err(CompletionError::Backend {
                status,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

/// Facts keyed by email, standing in for the Postgres store.
#[derive(Default)]
pub struct MemoryFactsStore {
    internships: HashMap<String, Vec<Experience>>,
    milestones: HashMap<String, Vec<Experience>>,
}

impl MemoryFactsStore {
    pub fn with_user(mut self, facts: &UserFacts) -> Self {
        self.internships
            .insert(facts.identifier.clone(), facts.internships.clone());
        self.milestones
            .insert(facts.identifier.clone(), facts.milestones.clone());
        self
    }
}

#[async_trait]
impl FactsStore for MemoryFactsStore {
    async fn internships(&self, identifier: &str) -> Result<Vec<Experience>, AppError> {
        Ok(self.internships.get(identifier).cloned().unwrap_or_default())
    }

    async fn milestones(&self, identifier: &str) -> Result<Vec<Experience>, AppError> {
        Ok(self.milestones.get(identifier).cloned().unwrap_or_default())
    }
}

pub fn sample_facts() -> UserFacts {
    let mut facts = UserFacts::new("jordan@example.com").with_skills(["Python", "SQL", "Tableau"]);
    facts.internships.push(Experience::internship(
        Some("Acme Analytics".to_string()),
        Some("Data Intern".to_string()),
        Some("Jun 2024 - Aug 2024".to_string()),
        Some("Built churn dashboards for the sales team".to_string()),
    ));
    facts.milestones.push(Experience::milestone(
        Some("Kaggle bronze medal".to_string()),
        Some("2024-11-02".to_string()),
        None,
    ));
    facts
}
