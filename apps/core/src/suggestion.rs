use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::cache::{CacheKey, TieredCache};
use crate::debounce::Debouncer;
use crate::highlight::{highlight_spans, Highlighted};
use crate::model::{normalize_for_search, Task};
use crate::remote::FetchError;
use crate::search::rank_suggestions;

pub const MIN_SUGGESTION_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub task: Task,
    pub highlighted: Highlighted,
}

impl Suggestion {
    pub fn new(task: Task, query: &str) -> Self {
        let highlighted = highlight_spans(&task.name, query);
        Self { task, highlighted }
    }

    pub fn highlighted_name(&self) -> String {
        self.highlighted.to_markup()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionPhase {
    Idle,
    Pending,
    Loaded,
    Navigating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavKey {
    Down,
    Up,
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionUpdate {
    Unchanged,
    Shown(Vec<Suggestion>),
    Hidden,
    Selected(usize),
    Commit(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionState {
    query: String,
    candidates: Vec<Suggestion>,
    selected: Option<usize>,
    visible: bool,
    pending: bool,
}

impl SuggestionState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn candidates(&self) -> &[Suggestion] {
        &self.candidates
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn phase(&self) -> SuggestionPhase {
        if self.pending {
            SuggestionPhase::Pending
        } else if self.visible && self.selected.is_some() {
            SuggestionPhase::Navigating
        } else if self.visible {
            SuggestionPhase::Loaded
        } else {
            SuggestionPhase::Idle
        }
    }

    fn show(&mut self, candidates: Vec<Suggestion>) {
        self.candidates = candidates;
        self.selected = None;
        self.visible = !self.candidates.is_empty();
    }

    fn clear(&mut self) {
        self.candidates.clear();
        self.selected = None;
        self.visible = false;
    }

    fn select_next(&mut self) -> Option<usize> {
        if !self.visible || self.candidates.is_empty() {
            return None;
        }
        let next = match self.selected {
            Some(current) => (current + 1) % self.candidates.len(),
            None => 0,
        };
        self.selected = Some(next);
        Some(next)
    }

    fn select_previous(&mut self) -> Option<usize> {
        if !self.visible || self.candidates.is_empty() {
            return None;
        }
        let last = self.candidates.len() - 1;
        let previous = match self.selected {
            Some(0) | None => last,
            Some(current) => current - 1,
        };
        self.selected = Some(previous);
        Some(previous)
    }
}

#[derive(Debug)]
enum ControllerMessage {
    Debounced {
        query: String,
        generation: u64,
    },
    Resolved {
        query: String,
        generation: u64,
        outcome: Result<Arc<Vec<Task>>, FetchError>,
    },
}

/// Drives the suggestion list from raw input and navigation keys.
///
/// Lookups are debounced and run as spawned tasks; their results come back
/// through [`SuggestionController::pump`]. Each lookup carries the generation
/// it was started in, and a result is only applied while both its generation
/// and its query still match the current input.
pub struct SuggestionController {
    cache: Arc<TieredCache>,
    state: SuggestionState,
    debouncer: Debouncer,
    delay: Duration,
    generation: u64,
    tx: mpsc::UnboundedSender<ControllerMessage>,
    rx: mpsc::UnboundedReceiver<ControllerMessage>,
}

impl SuggestionController {
    pub fn new(cache: Arc<TieredCache>, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            cache,
            state: SuggestionState::default(),
            debouncer: Debouncer::new(),
            delay,
            generation: 0,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &SuggestionState {
        &self.state
    }

    pub fn phase(&self) -> SuggestionPhase {
        self.state.phase()
    }

    pub fn on_input(&mut self, raw: &str) -> SuggestionUpdate {
        let query = normalize_for_search(raw);
        self.generation += 1;
        self.state.query = query.clone();

        if query.chars().count() < MIN_SUGGESTION_CHARS {
            self.state.pending = false;
            self.state.clear();
            return SuggestionUpdate::Hidden;
        }

        self.state.pending = true;
        let tx = self.tx.clone();
        let generation = self.generation;
        self.debouncer.schedule(
            move || {
                let _ = tx.send(ControllerMessage::Debounced { query, generation });
            },
            self.delay,
        );
        SuggestionUpdate::Unchanged
    }

    pub fn on_key(&mut self, key: NavKey) -> SuggestionUpdate {
        match key {
            NavKey::Down => self
                .state
                .select_next()
                .map_or(SuggestionUpdate::Unchanged, SuggestionUpdate::Selected),
            NavKey::Up => self
                .state
                .select_previous()
                .map_or(SuggestionUpdate::Unchanged, SuggestionUpdate::Selected),
            NavKey::Enter => match self.state.selected {
                Some(index) if self.state.visible => self.commit(index),
                _ => SuggestionUpdate::Unchanged,
            },
            NavKey::Escape => self.dismiss(),
        }
    }

    pub fn on_pointer_select(&mut self, index: usize) -> SuggestionUpdate {
        if !self.state.visible || index >= self.state.candidates.len() {
            return SuggestionUpdate::Unchanged;
        }
        self.commit(index)
    }

    pub fn on_pointer_outside(&mut self) -> SuggestionUpdate {
        self.dismiss()
    }

    /// Waits for the next debounce or lookup completion and applies it.
    /// Cancel-safe: dropping the future before it resolves loses nothing.
    pub async fn pump(&mut self) -> SuggestionUpdate {
        match self.rx.recv().await {
            Some(message) => self.handle_message(message),
            None => SuggestionUpdate::Unchanged,
        }
    }

    fn handle_message(&mut self, message: ControllerMessage) -> SuggestionUpdate {
        match message {
            ControllerMessage::Debounced { query, generation } => {
                if self.is_current(&query, generation) {
                    self.spawn_lookup(query, generation);
                } else {
                    tracing::debug!(query = %query, "dropping superseded debounce");
                }
                SuggestionUpdate::Unchanged
            }
            ControllerMessage::Resolved {
                query,
                generation,
                outcome,
            } => self.apply_resolution(&query, generation, outcome),
        }
    }

    fn spawn_lookup(&self, query: String, generation: u64) {
        let cache = Arc::clone(&self.cache);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = cache.resolve(&CacheKey::AllTasks).await;
            let _ = tx.send(ControllerMessage::Resolved {
                query,
                generation,
                outcome,
            });
        });
    }

    fn apply_resolution(
        &mut self,
        query: &str,
        generation: u64,
        outcome: Result<Arc<Vec<Task>>, FetchError>,
    ) -> SuggestionUpdate {
        if !self.is_current(query, generation) {
            tracing::debug!(query = %query, "discarding stale suggestion results");
            return SuggestionUpdate::Unchanged;
        }
        self.state.pending = false;

        let tasks = match outcome {
            Ok(tasks) => tasks,
            Err(error) => {
                tracing::warn!(query = %query, %error, "suggestion lookup failed");
                self.state.clear();
                return SuggestionUpdate::Hidden;
            }
        };

        let suggestions: Vec<Suggestion> = rank_suggestions(&tasks, query)
            .into_iter()
            .map(|task| Suggestion::new(task, query))
            .collect();

        if suggestions.is_empty() {
            self.state.clear();
            return SuggestionUpdate::Hidden;
        }

        self.state.show(suggestions.clone());
        SuggestionUpdate::Shown(suggestions)
    }

    fn commit(&mut self, index: usize) -> SuggestionUpdate {
        let Some(chosen) = self.state.candidates.get(index) else {
            return SuggestionUpdate::Unchanged;
        };
        let name = chosen.task.name.clone();

        self.generation += 1;
        self.state.pending = false;
        self.state.clear();
        self.state.query = normalize_for_search(&name);
        SuggestionUpdate::Commit(name)
    }

    /// Hides a visible list and cancels lookups in flight for it. With nothing
    /// shown, a pending lookup is left to render.
    fn dismiss(&mut self) -> SuggestionUpdate {
        if !self.state.visible {
            return SuggestionUpdate::Unchanged;
        }
        self.generation += 1;
        self.state.pending = false;
        self.state.clear();
        SuggestionUpdate::Hidden
    }

    fn is_current(&self, query: &str, generation: u64) -> bool {
        generation == self.generation && query == self.state.query
    }
}
