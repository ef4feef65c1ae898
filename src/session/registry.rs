use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use uuid::Uuid;

use crate::db::Preferences;
use crate::engine::EngineFactory;
use crate::models::EvaluationResult;

use super::Session;

type SharedSession = Arc<Mutex<Session>>;

/// Live sessions keyed by id.
///
/// Each session sits behind its own lock, so requests for one session run
/// one at a time while different sessions proceed independently.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, SharedSession>>>,
    engines: Arc<dyn EngineFactory>,
    prefs: Arc<dyn Preferences>,
}

impl SessionRegistry {
    pub fn new(engines: Arc<dyn EngineFactory>, prefs: Arc<dyn Preferences>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            engines,
            prefs,
        }
    }

    /// The session for `id`, created if it is unknown or no id was given.
    pub fn get_or_create(&self, id: Option<Uuid>) -> Result<(Uuid, SharedSession)> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow!("session registry lock poisoned"))?;
        let id = id.unwrap_or_else(Uuid::new_v4);
        let session = sessions
            .entry(id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(Session::start(
                    id,
                    self.engines.create(),
                    self.prefs.clone(),
                )))
            })
            .clone();
        Ok((id, session))
    }

    /// Evaluates `code` in a session. A session ended by `/exit` is removed
    /// once the request completes.
    pub fn evaluate(&self, id: Option<Uuid>, code: &str) -> Result<(Uuid, EvaluationResult)> {
        let (id, session) = self.get_or_create(id)?;
        let (result, terminated) = {
            let mut session = session
                .lock()
                .map_err(|_| anyhow!("session {} lock poisoned", id))?;
            let result = session.evaluate(code);
            (result, session.is_terminated())
        };
        if terminated {
            self.end(id)?;
        }
        tracing::debug!(session = %id, status = result.status, "Evaluated request");
        Ok((id, result))
    }

    /// Removes a session. Returns whether it existed.
    pub fn end(&self, id: Uuid) -> Result<bool> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow!("session registry lock poisoned"))?;
        let removed = sessions.remove(&id).is_some();
        if removed {
            tracing::info!(session = %id, "Session ended");
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
