#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Notify, Semaphore};

use questfind_core::cache::{CacheKey, TieredCache};
use questfind_core::model::Task;
use questfind_core::present::{Notice, Presenter};
use questfind_core::remote::{FetchError, TaskSource};
use questfind_core::store::{KeyValueStore, SqliteStore, StorageError};
use questfind_core::suggestion::Suggestion;

pub fn tasks(names: &[&str]) -> Vec<Task> {
    names.iter().map(|name| Task::named(name)).collect()
}

pub fn names(tasks: &[Task]) -> Vec<String> {
    tasks.iter().map(|task| task.name.clone()).collect()
}

/// Serves a fixed task list and counts fetches.
pub struct CountingSource {
    tasks: Vec<Task>,
    fetches: AtomicUsize,
    keys: Mutex<Vec<CacheKey>>,
}

impl CountingSource {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            fetches: AtomicUsize::new(0),
            keys: Mutex::new(Vec::new()),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<CacheKey> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskSource for CountingSource {
    fn source_name(&self) -> &'static str {
        "counting"
    }

    async fn fetch(&self, key: &CacheKey) -> Result<Vec<Task>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(key.clone());
        Ok(self.tasks.clone())
    }
}

/// Serves queued responses in order; the last one repeats.
pub struct ScriptedSource {
    responses: Mutex<Vec<Result<Vec<Task>, u16>>>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<Vec<Task>, u16>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskSource for ScriptedSource {
    fn source_name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(&self, _key: &CacheKey) -> Result<Vec<Task>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        let next = if responses.len() > 1 {
            responses.remove(0)
        } else {
            responses[0].clone()
        };
        next.map_err(|status| FetchError::Transport { status })
    }
}

/// Blocks every fetch until the test releases a permit.
pub struct GatedSource {
    tasks: Vec<Task>,
    gate: Arc<Semaphore>,
    fetches: AtomicUsize,
}

impl GatedSource {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            gate: Arc::new(Semaphore::new(0)),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskSource for GatedSource {
    fn source_name(&self) -> &'static str {
        "gated"
    }

    async fn fetch(&self, _key: &CacheKey) -> Result<Vec<Task>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|error| FetchError::Client(error.to_string()))?;
        permit.forget();
        Ok(self.tasks.clone())
    }
}

/// A store whose reads and writes always fail.
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("store offline".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("store offline".to_string()))
    }
}

/// A store whose writes park until the test releases them.
#[derive(Default)]
pub struct ParkedStore {
    entered: Notify,
    released: Notify,
}

impl ParkedStore {
    pub async fn wait_for_write(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl KeyValueStore for ParkedStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        self.entered.notify_one();
        self.released.notified().await;
        Ok(())
    }
}

/// A plain map store that counts reads.
#[derive(Default)]
pub struct MapStore {
    entries: Mutex<HashMap<String, String>>,
    reads: AtomicUsize,
}

impl MapStore {
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        store
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MapStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub fn memory_cache(source: Arc<dyn TaskSource>) -> Arc<TieredCache> {
    let store = SqliteStore::open_memory().unwrap();
    Arc::new(TieredCache::new(Arc::new(store), source))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Suggestions(Vec<String>),
    Hidden,
    Selected(usize),
    Query(String),
    Loading(bool),
    Results(Vec<String>),
    Notice(Notice),
}

/// Records every presenter call in order.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub calls: Vec<Shown>,
}

impl RecordingPresenter {
    pub fn notices(&self) -> Vec<Notice> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Shown::Notice(notice) => Some(notice.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_results(&self) -> Option<Vec<String>> {
        self.calls.iter().rev().find_map(|call| match call {
            Shown::Results(names) => Some(names.clone()),
            _ => None,
        })
    }
}

impl Presenter for RecordingPresenter {
    fn show_suggestions(&mut self, suggestions: &[Suggestion]) {
        self.calls.push(Shown::Suggestions(
            suggestions.iter().map(|s| s.task.name.clone()).collect(),
        ));
    }

    fn hide_suggestions(&mut self) {
        self.calls.push(Shown::Hidden);
    }

    fn select_suggestion(&mut self, index: usize) {
        self.calls.push(Shown::Selected(index));
    }

    fn set_query(&mut self, query: &str) {
        self.calls.push(Shown::Query(query.to_string()));
    }

    fn set_loading(&mut self, loading: bool) {
        self.calls.push(Shown::Loading(loading));
    }

    fn show_results(&mut self, tasks: &[Task]) {
        self.calls.push(Shown::Results(names(tasks)));
    }

    fn show_notice(&mut self, notice: &Notice) {
        self.calls.push(Shown::Notice(notice.clone()));
    }
}

/// Answers exactly one HTTP request with `status` and `body`, handing the
/// request body back through the returned receiver.
pub async fn one_shot_http(status: u16, body: &str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    let body = body.to_string();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];
        let request_body = loop {
            let read = socket.read(&mut chunk).await.unwrap();
            if read == 0 {
                break String::new();
            }
            raw.extend_from_slice(&chunk[..read]);
            if let Some(body) = complete_body(&raw) {
                break body;
            }
        };
        let _ = tx.send(request_body);

        let response = format!(
            "HTTP/1.1 {status} Status\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });

    (format!("http://{addr}/graphql"), rx)
}

fn complete_body(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let header_end = text.find("\r\n\r\n")?;
    let length = text[..header_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    let body = &raw[header_end + 4..];
    (body.len() >= length).then(|| String::from_utf8_lossy(&body[..length]).into_owned())
}
