/*
 * script/context.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The evaluator and its result cache, shared behind a lock.
 */

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::ScriptError;
use super::cache::BoundedCache;
use crate::processor::markdown_to_html;
use crate::settings::DEFAULT_CACHE_CAPACITY;

/// Something that can evaluate R code.
///
/// Evaluators are stateful (an R session may hold the bootstrap's
/// definitions) and are only ever called with the [`ScriptContext`] lock
/// held, so they need to be `Send` but not `Sync`.
pub trait ScriptEvaluator: Send {
    /// Human-readable name, used for logging.
    fn name(&self) -> &str;

    /// Evaluate one expression and return its printed value.
    fn evaluate(&mut self, expression: &str) -> Result<String, ScriptError>;

    /// Run the user's bootstrap script before any expression.
    fn bootstrap(&mut self, script: &str) -> Result<(), ScriptError> {
        self.evaluate(script).map(|_| ())
    }
}

/// Evaluator used when no R installation is available.
#[derive(Debug, Clone)]
pub struct UnavailableEvaluator {
    reason: String,
}

impl UnavailableEvaluator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ScriptEvaluator for UnavailableEvaluator {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn evaluate(&mut self, _expression: &str) -> Result<String, ScriptError> {
        Err(ScriptError::RuntimeNotFound(self.reason.clone()))
    }
}

struct ScriptState {
    evaluator: Box<dyn ScriptEvaluator>,
    cache: BoundedCache<String, String>,
}

/// Shared handle to an evaluator and its result cache.
///
/// Clones refer to the same evaluator and cache. All access goes through a
/// mutex, so at most one expression is evaluated at a time.
#[derive(Clone)]
pub struct ScriptContext {
    state: Arc<Mutex<ScriptState>>,
}

impl std::fmt::Debug for ScriptContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.state.try_lock() {
            Ok(state) => f
                .debug_struct("ScriptContext")
                .field("evaluator", &state.evaluator.name())
                .field("cached", &state.cache.len())
                .field("capacity", &state.cache.capacity())
                .finish(),
            Err(_) => f.debug_struct("ScriptContext").finish_non_exhaustive(),
        }
    }
}

impl ScriptContext {
    pub fn new(evaluator: Box<dyn ScriptEvaluator>) -> Self {
        Self::with_capacity(evaluator, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(evaluator: Box<dyn ScriptEvaluator>, capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                evaluator,
                cache: BoundedCache::new(capacity),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evaluate `expression`, or return its cached result.
    ///
    /// The evaluator's output is converted to inline HTML before it is
    /// cached. Failures are not cached.
    pub fn evaluate(&self, expression: &str) -> Result<String, ScriptError> {
        let mut state = self.lock();
        if let Some(cached) = state.cache.get(expression) {
            tracing::trace!(expression, "Script cache hit");
            return Ok(cached.clone());
        }

        let raw = state.evaluator.evaluate(expression)?;
        let html = to_inline_html(&raw);
        if let Some((evicted, _)) = state.cache.insert(expression.to_string(), html.clone()) {
            tracing::trace!(evicted = %evicted, "Script cache full; evicted oldest expression");
        }
        Ok(html)
    }

    /// Run a bootstrap script through the evaluator.
    pub fn bootstrap(&self, script: &str) -> Result<(), ScriptError> {
        let mut state = self.lock();
        tracing::debug!(evaluator = state.evaluator.name(), "Running bootstrap script");
        state.evaluator.bootstrap(script)
    }

    /// Forget every cached result.
    pub fn clear(&self) {
        self.lock().cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.lock().cache.len()
    }

    pub fn is_cached(&self, expression: &str) -> bool {
        self.lock().cache.contains_key(expression)
    }
}

/// Convert evaluator output (Markdown) to inline HTML.
///
/// Output that renders as a single paragraph is unwrapped to its inline
/// content; anything else keeps its block markup. The result is trimmed.
pub fn to_inline_html(output: &str) -> String {
    let html = markdown_to_html(output);
    let trimmed = html.trim();

    let inline = trimmed
        .strip_prefix("<p>")
        .and_then(|rest| rest.strip_suffix("</p>"))
        .filter(|inner| !inner.contains("<p>"));

    inline.unwrap_or(trimmed).trim().to_string()
}
