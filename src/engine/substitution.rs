// src/engine/substitution.rs

//! Result store and `{{step_<id>.<field>}}` placeholder substitution.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::dag::NodeId;
use crate::exec::{OperationResult, Request};

static RESULT_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{step_(\w+)\.result\.(\w+)\}\}").expect("placeholder pattern is valid")
});

static SHORT_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{step_(\w+)\.(\w+)\}\}").expect("placeholder pattern is valid")
});

/// Results of executed nodes, keyed by node id.
///
/// Cloning shares the underlying map. Writers only ever insert under their
/// own node id.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    inner: Arc<RwLock<HashMap<NodeId, OperationResult>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<NodeId>, result: OperationResult) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), result);
    }

    pub fn get(&self, id: &str) -> Option<OperationResult> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of `field` on the result of `id`, if both exist.
    fn lookup(&self, id: &str, field: &str) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .and_then(|r| r.field(field))
    }
}

/// Replace every resolvable placeholder in `text`.
///
/// Both `{{step_<id>.result.<field>}}` and `{{step_<id>.<field>}}` are
/// recognised. Placeholders naming an unknown step or field are kept
/// verbatim; a field without a value becomes the empty string.
pub fn substitute_placeholders(text: &str, store: &ResultStore) -> String {
    if !text.contains("{{step_") {
        return text.to_string();
    }

    let replace = |caps: &Captures| -> String {
        match store.lookup(&caps[1], &caps[2]) {
            Some(value) => value,
            None => {
                trace!(placeholder = &caps[0], "placeholder left unresolved");
                caps[0].to_string()
            }
        }
    };

    let once = RESULT_PLACEHOLDER.replace_all(text, replace);
    SHORT_PLACEHOLDER.replace_all(&once, replace).into_owned()
}

/// Rewrite the substitutable fields of `request` in place.
///
/// Returns how many fields changed.
pub fn apply_substitutions(request: &mut dyn Request, store: &ResultStore) -> usize {
    if store.is_empty() {
        return 0;
    }

    let mut changed = 0;
    for field in request.substitution_fields() {
        let rewritten = substitute_placeholders(field, store);
        if rewritten != *field {
            debug!(before = %field, after = %rewritten, "substituted step results");
            *field = rewritten;
            changed += 1;
        }
    }
    changed
}
