#![cfg(unix)]

use std::time::Duration;

use htcondor_apid::domain::backend::command::{CommandInvocation, CommandRunner, OutputContract, ProcessRunner};
use htcondor_apid::error::Error;

fn runner() -> ProcessRunner {
    ProcessRunner::new(Duration::from_secs(10))
}

#[tokio::test]
async fn test_captures_exit_code_and_streams() {
    let invocation = CommandInvocation::new("sh", OutputContract::ScalarText).arg_pair("-c", "echo out; echo err >&2; exit 3");

    let output = runner().run(&invocation).await.unwrap();

    assert_eq!(output.exit_code, Some(3));
    assert_eq!(output.stdout, "out\n");
    assert_eq!(output.stderr, "err\n");
    assert!(!output.is_success());
    assert_eq!(output.diagnostic(), "err");
}

#[tokio::test]
async fn test_arguments_reach_the_program_verbatim() {
    // Shell metacharacters must arrive as plain argv entries.
    let constraint = "true && (Owner == \"alice\"); rm -rf $HOME `id`";
    let invocation = CommandInvocation::new("printf", OutputContract::ScalarText).arg("%s|%s").arg("-constraint").arg(constraint);

    let output = runner().run(&invocation).await.unwrap();

    assert!(output.is_success());
    assert_eq!(output.stdout, format!("-constraint|{}", constraint));
}

#[tokio::test]
async fn test_slow_command_times_out() {
    let runner = ProcessRunner::new(Duration::from_millis(200));
    let invocation = CommandInvocation::new("sleep", OutputContract::ScalarText).arg("5");

    let started = std::time::Instant::now();
    let err = runner.run(&invocation).await.unwrap_err();

    assert!(matches!(err, Error::Timeout(_)), "Expected Timeout, got {:?}", err);
    assert_eq!(err.status_code(), 504);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_missing_executable_is_unavailable() {
    let invocation = CommandInvocation::new("/nonexistent/condor_q", OutputContract::JsonArray).arg("-json");

    let err = runner().run(&invocation).await.unwrap_err();

    assert!(matches!(err, Error::ServiceUnavailable(_)), "Expected ServiceUnavailable, got {:?}", err);
    assert_eq!(err.status_code(), 503);
}
