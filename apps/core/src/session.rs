use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::cache::{CacheKey, TieredCache};
use crate::config::{validate, Config, ConfigError, FullSearchKey};
use crate::contract::UiEvent;
use crate::debounce::DEFAULT_DEBOUNCE_MS;
use crate::model::Task;
use crate::present::{Notice, Presenter, FETCH_FAILED_MESSAGE, GUIDANCE_MESSAGE};
use crate::remote::{FetchError, GraphqlTaskSource};
use crate::search::rank_all;
use crate::store::{SqliteStore, StorageError};
use crate::suggestion::{NavKey, SuggestionController, SuggestionUpdate};

pub const MIN_SEARCH_CHARS: usize = 3;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StorageError),
    #[error("remote source error: {0}")]
    Source(#[from] FetchError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub debounce: Duration,
    pub full_search_key: FullSearchKey,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            full_search_key: FullSearchKey::AllTasks,
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(value: &Config) -> Self {
        Self {
            debounce: Duration::from_millis(value.debounce_ms),
            full_search_key: value.full_search_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    TooShort,
    Found(Vec<Task>),
    Empty,
    Failed(String),
}

enum Step {
    Event(Option<UiEvent>),
    Update(SuggestionUpdate),
}

/// Binds the input box, the suggestion list and the explicit search action to
/// one cache and one presenter.
pub struct QuestSearchSession<P: Presenter> {
    cache: Arc<TieredCache>,
    suggestions: SuggestionController,
    presenter: P,
    full_search_key: FullSearchKey,
    input: String,
}

impl<P: Presenter> QuestSearchSession<P> {
    pub fn new(cache: Arc<TieredCache>, settings: SessionSettings, presenter: P) -> Self {
        let suggestions = SuggestionController::new(Arc::clone(&cache), settings.debounce);
        Self {
            cache,
            suggestions,
            presenter,
            full_search_key: settings.full_search_key,
            input: String::new(),
        }
    }

    pub fn from_config(cfg: &Config, presenter: P) -> Result<Self, SessionError> {
        validate(cfg)?;
        let store = SqliteStore::open_from_config(cfg)?;
        let source = GraphqlTaskSource::from_config(cfg)?;
        let cache = Arc::new(TieredCache::new(Arc::new(store), Arc::new(source)));
        tracing::info!(
            source = cache.source_name(),
            endpoint = %cfg.endpoint,
            "quest search session ready"
        );
        Ok(Self::new(cache, SessionSettings::from(cfg), presenter))
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cache(&self) -> &Arc<TieredCache> {
        &self.cache
    }

    pub fn suggestions(&self) -> &SuggestionController {
        &self.suggestions
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }

    /// Replaces the input text without triggering suggestions.
    pub fn set_input(&mut self, value: &str) {
        self.input = value.to_string();
    }

    pub fn on_input(&mut self, value: &str) {
        self.input = value.to_string();
        let update = self.suggestions.on_input(value);
        self.render(&update);
    }

    pub async fn on_key(&mut self, key: NavKey) -> Option<SearchOutcome> {
        let update = self.suggestions.on_key(key);
        self.apply(update).await
    }

    pub async fn on_pointer_select(&mut self, index: usize) -> Option<SearchOutcome> {
        let update = self.suggestions.on_pointer_select(index);
        self.apply(update).await
    }

    pub fn on_pointer_outside(&mut self) {
        let update = self.suggestions.on_pointer_outside();
        self.render(&update);
    }

    /// Applies the next debounce firing or suggestion lookup result.
    pub async fn pump(&mut self) -> Option<SearchOutcome> {
        let update = self.suggestions.pump().await;
        self.apply(update).await
    }

    /// Explicit search on the current input: requires at least
    /// [`MIN_SEARCH_CHARS`] characters, shows loading for the duration and
    /// renders every match, a no-results notice, or an error notice.
    pub async fn search(&mut self) -> SearchOutcome {
        let query = self.input.trim().to_string();
        if query.chars().count() < MIN_SEARCH_CHARS {
            self.presenter
                .show_notice(&Notice::Guidance(GUIDANCE_MESSAGE.to_string()));
            return SearchOutcome::TooShort;
        }

        self.presenter.set_loading(true);
        let key = match self.full_search_key {
            FullSearchKey::AllTasks => CacheKey::AllTasks,
            FullSearchKey::PerQuery => CacheKey::query(&query),
        };

        let outcome = match self.cache.resolve(&key).await {
            Ok(tasks) => {
                let matches = rank_all(&tasks, &query);
                if matches.is_empty() {
                    self.presenter.show_notice(&Notice::NoResults);
                    SearchOutcome::Empty
                } else {
                    self.presenter.show_results(&matches);
                    SearchOutcome::Found(matches)
                }
            }
            Err(error) => {
                tracing::error!(query = %query, %error, "quest search failed");
                self.presenter
                    .show_notice(&Notice::Error(FETCH_FAILED_MESSAGE.to_string()));
                SearchOutcome::Failed(error.to_string())
            }
        };

        self.presenter.set_loading(false);
        outcome
    }

    pub async fn handle(&mut self, event: UiEvent) -> Option<SearchOutcome> {
        match event {
            UiEvent::Input(value) => {
                self.on_input(&value);
                None
            }
            UiEvent::Key(key) => self.on_key(key).await,
            UiEvent::PointerSelect(index) => self.on_pointer_select(index).await,
            UiEvent::PointerOutside => {
                self.on_pointer_outside();
                None
            }
            UiEvent::Search => {
                // The search trigger sits outside the input box.
                self.on_pointer_outside();
                Some(self.search().await)
            }
        }
    }

    /// Processes input events and suggestion completions until `events` closes.
    pub async fn run(&mut self, mut events: mpsc::Receiver<UiEvent>) {
        loop {
            let step = tokio::select! {
                event = events.recv() => Step::Event(event),
                update = self.suggestions.pump() => Step::Update(update),
            };

            match step {
                Step::Event(Some(event)) => {
                    self.handle(event).await;
                }
                Step::Event(None) => break,
                Step::Update(update) => {
                    self.apply(update).await;
                }
            }
        }
    }

    async fn apply(&mut self, update: SuggestionUpdate) -> Option<SearchOutcome> {
        if let SuggestionUpdate::Commit(name) = update {
            self.input = name.clone();
            self.presenter.set_query(&name);
            self.presenter.hide_suggestions();
            return Some(self.search().await);
        }
        self.render(&update);
        None
    }

    fn render(&mut self, update: &SuggestionUpdate) {
        match update {
            SuggestionUpdate::Shown(suggestions) => self.presenter.show_suggestions(suggestions),
            SuggestionUpdate::Hidden => self.presenter.hide_suggestions(),
            SuggestionUpdate::Selected(index) => self.presenter.select_suggestion(*index),
            SuggestionUpdate::Unchanged | SuggestionUpdate::Commit(_) => {}
        }
    }
}
