//! Interactive session state: who is logged in and what they last loaded.
//!
//! Created when the shell starts and cleared on logout. Agent results are
//! cached per (username, password, prompt) so repeating an identical request
//! within a session does not launch another browser run.

use crate::agent::Secrets;
use crate::models::CourseOfferings;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Please fill all the authentication fields ({0} is empty)")]
    MissingField(&'static str),
    #[error("Not logged in")]
    NotAuthenticated,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    username: String,
    password: String,
    prompt: String,
}

#[derive(Default)]
pub struct Session {
    api_key: String,
    credentials: Option<Secrets>,
    /// Offerings currently loaded for browsing.
    pub offerings: Option<CourseOfferings>,
    cache: HashMap<CacheKey, Option<CourseOfferings>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username())
            .field("loaded", &self.offerings.as_ref().map(CourseOfferings::len))
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start a session with an API key pre-filled from configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Validate and store login details. Nothing is stored on failure.
    pub fn login(&mut self, api_key: &str, username: &str, password: &str) -> Result<(), SessionError> {
        let required: [(&'static str, &str); 3] =
            [("API key", api_key), ("username", username), ("password", password)];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(SessionError::MissingField(name));
            }
        }
        self.api_key = api_key.trim().to_owned();
        self.credentials = Some(Secrets::new(username.trim(), password));
        Ok(())
    }

    /// Forget credentials, loaded data and cached results.
    pub fn logout(&mut self) {
        self.credentials = None;
        self.offerings = None;
        self.cache.clear();
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn credentials(&self) -> Result<&Secrets, SessionError> {
        self.credentials.as_ref().ok_or(SessionError::NotAuthenticated)
    }

    /// A previous result for the same credentials and prompt, if any.
    /// The outer `Option` is the cache lookup; the inner one is the result.
    pub fn cached(&self, prompt: &str) -> Option<&Option<CourseOfferings>> {
        let key = self.key(prompt)?;
        self.cache.get(&key)
    }

    pub fn remember(&mut self, prompt: &str, result: Option<CourseOfferings>) {
        if let Some(key) = self.key(prompt) {
            self.cache.insert(key, result);
        }
    }

    fn key(&self, prompt: &str) -> Option<CacheKey> {
        let credentials = self.credentials.as_ref()?;
        Some(CacheKey {
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            prompt: prompt.to_owned(),
        })
    }
}
