//! In-memory doubles for the fixloop ports.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fixloop::adapters::proposers::{MockProposer, MockResponse};
use fixloop::domain::errors::{GitOperationError, StoreError};
use fixloop::domain::models::{BudgetConfig, CiConfig, FixConfig};
use fixloop::domain::ports::{Clock, FileStore, GitClient, TestRun, TestRunner};
use fixloop::services::{CiDriver, CostLedger, FixEngine};

fn key(path: &str) -> String {
    path.trim_start_matches("./").to_string()
}

/// File store backed by a map; `./a.js` and `a.js` are the same file.
#[derive(Clone, Default)]
pub struct MemoryFileStore {
    files: Arc<Mutex<HashMap<String, String>>>,
    failing_writes: Arc<Mutex<HashMap<String, usize>>>,
    writes: Arc<Mutex<Vec<(String, String)>>>,
}

impl MemoryFileStore {
    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::default();
        {
            let mut map = store.files.lock().unwrap();
            for (path, content) in files {
                map.insert(key(path), content.to_string());
            }
        }
        store
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(&key(path)).cloned()
    }

    /// The next `count` writes to `path` fail.
    pub fn fail_writes(&self, path: &str, count: usize) {
        self.failing_writes
            .lock()
            .unwrap()
            .insert(key(path), count);
    }

    /// Every write attempted, successful or not, in order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn exists(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(&key(path))
    }

    async fn read(&self, path: &str) -> Result<String, StoreError> {
        self.content(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn write(&self, path: &str, contents: &str) -> Result<(), StoreError> {
        self.writes
            .lock()
            .unwrap()
            .push((key(path), contents.to_string()));

        {
            let mut failing = self.failing_writes.lock().unwrap();
            if let Some(remaining) = failing.get_mut(&key(path)) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(StoreError::Io {
                        path: path.to_string(),
                        source: std::io::Error::other("disk full"),
                    });
                }
            }
        }

        self.files
            .lock()
            .unwrap()
            .insert(key(path), contents.to_string());
        Ok(())
    }
}

pub fn passing() -> TestRun {
    TestRun {
        exit_code: Some(0),
        stdout: "all tests passed".to_string(),
        ..Default::default()
    }
}

pub fn failing(output: &str) -> TestRun {
    TestRun {
        exit_code: Some(1),
        stdout: String::new(),
        stderr: output.to_string(),
        timed_out: false,
    }
}

/// Replays queued runs, then repeats `fallback` forever.
pub struct ScriptedTestRunner {
    queue: Mutex<VecDeque<TestRun>>,
    fallback: TestRun,
    runs: AtomicUsize,
}

impl ScriptedTestRunner {
    pub fn new(script: impl IntoIterator<Item = TestRun>, fallback: TestRun) -> Self {
        Self {
            queue: Mutex::new(script.into_iter().collect()),
            fallback,
            runs: AtomicUsize::new(0),
        }
    }

    pub fn always(run: TestRun) -> Self {
        Self::new([], run)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TestRunner for ScriptedTestRunner {
    async fn run(&self, _command: &str) -> TestRun {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Passes only while every watched file contains its expected snippet.
/// The failing run reports `failure_output` so the locator can find files.
pub struct ContentOracle {
    files: MemoryFileStore,
    expectations: Vec<(String, String)>,
    failure_output: String,
    runs: AtomicUsize,
}

impl ContentOracle {
    pub fn new<'a>(
        files: MemoryFileStore,
        expectations: impl IntoIterator<Item = (&'a str, &'a str)>,
        failure_output: &str,
    ) -> Self {
        Self {
            files,
            expectations: expectations
                .into_iter()
                .map(|(p, s)| (p.to_string(), s.to_string()))
                .collect(),
            failure_output: failure_output.to_string(),
            runs: AtomicUsize::new(0),
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TestRunner for ContentOracle {
    async fn run(&self, _command: &str) -> TestRun {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let ok = self
            .expectations
            .iter()
            .all(|(path, snippet)| {
                self.files
                    .content(path)
                    .is_some_and(|c| c.contains(snippet.as_str()))
            });
        if ok {
            passing()
        } else {
            failing(&self.failure_output)
        }
    }
}

/// Records git calls; one step can be made to fail.
#[derive(Default)]
pub struct RecordingGit {
    calls: Mutex<Vec<String>>,
    failing_steps: HashSet<&'static str>,
}

impl RecordingGit {
    pub fn failing_at(step: &'static str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_steps: HashSet::from([step]),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn step(&self, step: &'static str, detail: String) -> Result<(), GitOperationError> {
        self.calls.lock().unwrap().push(detail);
        if self.failing_steps.contains(step) {
            Err(GitOperationError::new(step, "simulated failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GitClient for RecordingGit {
    async fn configure_identity(&self, name: &str, email: &str) -> Result<(), GitOperationError> {
        self.step("config", format!("config {name} <{email}>"))
    }

    async fn stage_all(&self) -> Result<(), GitOperationError> {
        self.step("add", "add".to_string())
    }

    async fn commit(&self, message: &str) -> Result<(), GitOperationError> {
        self.step("commit", format!("commit {message}"))
    }

    async fn push(&self) -> Result<(), GitOperationError> {
        self.step("push", "push".to_string())
    }
}

/// Clock whose date the test controls.
pub struct ManualClock(Mutex<NaiveDate>);

impl ManualClock {
    pub fn new(date: NaiveDate) -> Self {
        Self(Mutex::new(date))
    }

    pub fn set(&self, date: NaiveDate) {
        *self.0.lock().unwrap() = date;
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.0.lock().unwrap()
    }
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
}

pub fn budget(daily: f64, per_operation: f64) -> BudgetConfig {
    BudgetConfig {
        daily_limit_usd: daily,
        per_operation_limit_usd: per_operation,
        state_file: None,
    }
}

pub fn fix_config() -> FixConfig {
    FixConfig {
        model: "claude-haiku-4-5".to_string(),
        max_output_tokens: 1000,
        temperature: 0.0,
        test_command: "npm test".to_string(),
        test_timeout_secs: 30,
        dry_run: false,
    }
}

pub fn ledger(budget: &BudgetConfig) -> CostLedger {
    CostLedger::new(budget, Arc::new(ManualClock::new(day(1))))
}

pub fn proposer(responses: impl IntoIterator<Item = MockResponse>) -> Arc<MockProposer> {
    Arc::new(MockProposer::with_responses(responses))
}

pub fn engine(
    proposer: Arc<MockProposer>,
    files: &MemoryFileStore,
    tests: Arc<dyn TestRunner>,
    budget: &BudgetConfig,
) -> FixEngine {
    FixEngine::new(
        proposer,
        Arc::new(files.clone()),
        tests,
        ledger(budget),
        fix_config(),
    )
}

pub fn driver(
    engine: FixEngine,
    files: &MemoryFileStore,
    tests: Arc<dyn TestRunner>,
    git: Arc<RecordingGit>,
    ci: CiConfig,
) -> CiDriver {
    CiDriver::new(Arc::new(engine), tests, Arc::new(files.clone()), git, ci)
}
