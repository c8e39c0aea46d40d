mod common;

use std::sync::Arc;

use fixloop::adapters::proposers::MockResponse;
use fixloop::domain::models::{BatchResult, BudgetConfig, CiConfig};

use common::{
    budget, driver, engine, failing, passing, proposer, ContentOracle, MemoryFileStore,
    RecordingGit, ScriptedTestRunner,
};

const BUGGY: &str = "function total(a, b) {\n  return a - b;\n}\n";
const FIXED: &str = "function total(a, b) {\n  return a + b;\n}";

const NODE_FAILURE: &str = "\
FAIL ./cart.test.js
  TypeError: expected 5, got -1
    at total (./cart.js:2:10)
    at Object.<anonymous> (./cart.test.js:5:1)
";

fn generous() -> BudgetConfig {
    budget(10.0, 1.0)
}

fn cart_project() -> MemoryFileStore {
    MemoryFileStore::with_files([
        ("cart.js", BUGGY),
        ("cart.test.js", "expect(total(2, 3)).toBe(5);\n"),
    ])
}

fn committing(push: bool) -> CiConfig {
    CiConfig {
        auto_commit: true,
        auto_push: push,
        ..CiConfig::default()
    }
}

#[tokio::test]
async fn test_passing_suite_touches_nothing() {
    let files = cart_project();
    let proposer = proposer([]);
    let tests = Arc::new(ScriptedTestRunner::always(passing()));
    let git = Arc::new(RecordingGit::default());
    let ci = driver(
        engine(proposer.clone(), &files, tests.clone(), &generous()),
        &files,
        tests.clone(),
        git.clone(),
        committing(true),
    );

    let batch = ci.run_once().await.unwrap();
    assert!(batch.tests_passed_initially());
    assert_eq!(batch.total_attempted(), 0);
    assert_eq!(batch.committed(), None);

    let outcome = ci.run_with_retries().await.unwrap();
    assert!(outcome.final_tests_passed);
    assert_eq!(outcome.attempts, 1);
    // one run per call, no confirmation re-run
    assert_eq!(tests.runs(), 2);

    assert!(proposer.requests().await.is_empty());
    assert!(files.writes().is_empty());
    assert!(git.calls().is_empty());
}

#[tokio::test]
async fn test_stack_frame_points_at_source_not_test_file() {
    let files = cart_project();
    let proposer = proposer([MockResponse::success(FIXED)]);
    let tests = Arc::new(ContentOracle::new(
        files.clone(),
        [("cart.js", "a + b")],
        NODE_FAILURE,
    ));
    let ci = driver(
        engine(proposer.clone(), &files, tests.clone(), &generous()),
        &files,
        tests.clone(),
        Arc::new(RecordingGit::default()),
        CiConfig::default(),
    );

    let batch = ci.run_once().await.unwrap();

    assert!(!batch.tests_passed_initially());
    assert_eq!(batch.total_attempted(), 1);
    assert_eq!(batch.successful(), 1);
    assert_eq!(batch.attempted()[0].filename(), "./cart.js");
    assert_eq!(files.content("cart.js").as_deref(), Some(FIXED));
    assert_eq!(
        files.content("cart.test.js").as_deref(),
        Some("expect(total(2, 3)).toBe(5);\n")
    );

    // the full failing output is handed to the proposer
    let requests = proposer.requests().await;
    assert!(requests[0].error_context.contains("expected 5, got -1"));
}

#[tokio::test]
async fn test_retries_stop_once_green() {
    let files = cart_project();
    let proposer = proposer([MockResponse::success(FIXED)]);
    let tests = Arc::new(ContentOracle::new(
        files.clone(),
        [("cart.js", "a + b")],
        NODE_FAILURE,
    ));
    let ci = driver(
        engine(proposer, &files, tests.clone(), &generous()),
        &files,
        tests.clone(),
        Arc::new(RecordingGit::default()),
        CiConfig {
            max_retries: 3,
            ..CiConfig::default()
        },
    );

    let outcome = ci.run_with_retries().await.unwrap();

    assert!(outcome.final_tests_passed);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.rounds.len(), 1);
    assert_eq!(outcome.total_fixed(), 1);
    // initial run, verification inside the engine, confirmation re-run
    assert_eq!(tests.runs(), 3);
}

#[tokio::test]
async fn test_retries_exhausted_when_nothing_helps() {
    let files = cart_project();
    // unscripted mock echoes the file back unchanged
    let proposer = proposer([]);
    let tests = Arc::new(ScriptedTestRunner::always(failing(NODE_FAILURE)));
    let ci = driver(
        engine(proposer.clone(), &files, tests.clone(), &generous()),
        &files,
        tests.clone(),
        Arc::new(RecordingGit::default()),
        CiConfig {
            max_retries: 3,
            ..CiConfig::default()
        },
    );

    let outcome = ci.run_with_retries().await.unwrap();

    assert!(!outcome.final_tests_passed);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.max_retries, 3);
    assert_eq!(outcome.rounds.len(), 3);
    assert_eq!(outcome.total_fixed(), 0);
    assert!(outcome
        .rounds
        .iter()
        .all(|round| round.failed() == round.total_attempted()));
    assert_eq!(proposer.requests().await.len(), 3);
    assert_eq!(files.content("cart.js").as_deref(), Some(BUGGY));
}

#[tokio::test]
async fn test_unlocatable_failure_reports_diagnostic() {
    let files = cart_project();
    let proposer = proposer([]);
    let tests = Arc::new(ScriptedTestRunner::always(failing("Segmentation fault")));
    let git = Arc::new(RecordingGit::default());
    let ci = driver(
        engine(proposer.clone(), &files, tests.clone(), &generous()),
        &files,
        tests,
        git.clone(),
        committing(false),
    );

    let batch = ci.run_once().await.unwrap();

    assert_eq!(batch.total_attempted(), 0);
    assert!(batch.diagnostic().is_some());
    assert_eq!(batch.test_output(), Some("Segmentation fault"));
    assert_eq!(batch.committed(), None);
    assert!(proposer.requests().await.is_empty());
    assert!(git.calls().is_empty());
}

#[tokio::test]
async fn test_default_file_used_when_no_frame_matches() {
    let files = MemoryFileStore::with_files([("src/index.js", BUGGY)]);
    let proposer = proposer([MockResponse::success(FIXED)]);
    let tests = Arc::new(ContentOracle::new(
        files.clone(),
        [("src/index.js", "a + b")],
        "1 test failed",
    ));
    let ci = driver(
        engine(proposer, &files, tests.clone(), &generous()),
        &files,
        tests,
        Arc::new(RecordingGit::default()),
        CiConfig {
            default_file: Some("src/index.js".to_string()),
            ..CiConfig::default()
        },
    );

    let batch = ci.run_once().await.unwrap();

    assert_eq!(batch.successful(), 1);
    assert_eq!(batch.attempted()[0].filename(), "src/index.js");
}

#[tokio::test]
async fn test_missing_candidates_are_skipped() {
    let files = MemoryFileStore::with_files([("cart.test.js", "")]);
    let proposer = proposer([]);
    let tests = Arc::new(ScriptedTestRunner::always(failing(NODE_FAILURE)));
    let ci = driver(
        engine(proposer, &files, tests.clone(), &generous()),
        &files,
        tests,
        Arc::new(RecordingGit::default()),
        CiConfig::default(),
    );

    let batch = ci.run_once().await.unwrap();

    assert_eq!(batch.total_attempted(), 0);
    assert!(batch.diagnostic().is_some());
}

#[tokio::test]
async fn test_commit_and_push_after_successful_round() {
    let files = cart_project();
    let proposer = proposer([MockResponse::success(FIXED)]);
    let tests = Arc::new(ContentOracle::new(
        files.clone(),
        [("cart.js", "a + b")],
        NODE_FAILURE,
    ));
    let git = Arc::new(RecordingGit::default());
    let config = committing(true);
    let expected_message = config.render_commit_message(&["./cart.js"]);
    let ci = driver(
        engine(proposer, &files, tests.clone(), &generous()),
        &files,
        tests,
        git.clone(),
        config,
    );

    let batch = ci.run_once().await.unwrap();

    assert_eq!(batch.committed(), Some(true));
    assert_eq!(batch.git_error(), None);
    let calls = git.calls();
    assert_eq!(calls.len(), 4);
    assert!(calls[0].starts_with("config "));
    assert_eq!(calls[1], "add");
    assert_eq!(calls[2], format!("commit {expected_message}"));
    assert!(calls[2].contains("1 file(s)"));
    assert!(calls[2].contains("- ./cart.js"));
    assert_eq!(calls[3], "push");
}

#[tokio::test]
async fn test_no_push_unless_enabled() {
    let files = cart_project();
    let proposer = proposer([MockResponse::success(FIXED)]);
    let tests = Arc::new(ContentOracle::new(
        files.clone(),
        [("cart.js", "a + b")],
        NODE_FAILURE,
    ));
    let git = Arc::new(RecordingGit::default());
    let ci = driver(
        engine(proposer, &files, tests.clone(), &generous()),
        &files,
        tests,
        git.clone(),
        committing(false),
    );

    let batch = ci.run_once().await.unwrap();

    assert_eq!(batch.committed(), Some(true));
    assert!(!git.calls().iter().any(|c| c == "push"));
}

async fn round_with_git_failing_at(
    step: &'static str,
) -> (BatchResult, Vec<String>, MemoryFileStore) {
    let files = cart_project();
    let proposer = proposer([MockResponse::success(FIXED)]);
    let tests = Arc::new(ContentOracle::new(
        files.clone(),
        [("cart.js", "a + b")],
        NODE_FAILURE,
    ));
    let git = Arc::new(RecordingGit::failing_at(step));
    let ci = driver(
        engine(proposer, &files, tests.clone(), &generous()),
        &files,
        tests,
        git.clone(),
        committing(true),
    );
    let batch = ci.run_once().await.unwrap();
    (batch, git.calls(), files)
}

#[tokio::test]
async fn test_git_failure_before_commit_keeps_fixes() {
    for step in ["config", "add", "commit"] {
        let (batch, calls, files) = round_with_git_failing_at(step).await;

        assert_eq!(batch.committed(), Some(false), "step {step}");
        let error = batch.git_error().unwrap();
        assert!(error.contains(&format!("git {step} failed")), "{error}");
        assert_eq!(batch.successful(), 1);
        assert!(!calls.iter().any(|c| c == "push"));
        assert_eq!(files.content("cart.js").as_deref(), Some(FIXED));
    }
}

#[tokio::test]
async fn test_push_failure_still_counts_as_committed() {
    let (batch, calls, files) = round_with_git_failing_at("push").await;

    assert_eq!(batch.committed(), Some(true));
    assert!(batch.git_error().unwrap().contains("git push failed"));
    assert_eq!(calls.len(), 4);
    assert_eq!(files.content("cart.js").as_deref(), Some(FIXED));
}

#[tokio::test]
async fn test_nothing_committed_when_no_fix_succeeds() {
    let files = cart_project();
    let proposer = proposer([]);
    let tests = Arc::new(ScriptedTestRunner::always(failing(NODE_FAILURE)));
    let git = Arc::new(RecordingGit::default());
    let ci = driver(
        engine(proposer, &files, tests.clone(), &generous()),
        &files,
        tests,
        git.clone(),
        committing(true),
    );

    let batch = ci.run_once().await.unwrap();

    assert_eq!(batch.successful(), 0);
    assert_eq!(batch.committed(), None);
    assert!(git.calls().is_empty());
}

#[tokio::test]
async fn test_budget_refusals_show_up_as_failed_attempts() {
    let files = cart_project();
    let proposer = proposer([]);
    let tests = Arc::new(ScriptedTestRunner::always(failing(NODE_FAILURE)));
    let ci = driver(
        engine(proposer.clone(), &files, tests.clone(), &budget(10.0, 0.000_1)),
        &files,
        tests,
        Arc::new(RecordingGit::default()),
        CiConfig {
            max_retries: 2,
            ..CiConfig::default()
        },
    );

    let outcome = ci.run_with_retries().await.unwrap();

    assert!(!outcome.final_tests_passed);
    assert_eq!(outcome.attempts, 2);
    let last = outcome.last_batch().unwrap();
    assert_eq!(last.failed(), 1);
    assert!((last.total_cost_usd() - 0.0).abs() < f64::EPSILON);
    assert!(proposer.requests().await.is_empty());
}
