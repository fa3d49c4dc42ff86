//! Capture scopes collecting reports from spawned processes.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Context, Result};
use version_report::{
    with_capture, FieldChange, FieldChangeKind, OperationChange, ReportContext, TargetReport,
    LOCATION_ENV_VAR,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_guard() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_version-report"))
}

/// Spawn the binary to append one report, relying on the inherited environment.
fn exec_subprocess(i: usize, pr_report: &str) -> Result<()> {
    let status = bin()
        .args(["add", "--key"])
        .arg(format!("subprocess{i}"))
        .args(["--priority", "2", "--must-generate", "--pr-report", pr_report])
        .status()
        .context("spawn version-report add")?;
    if !status.success() {
        bail!("subprocess {i} exited with {status}");
    }
    Ok(())
}

#[test]
fn test_subprocess_reports_are_merged_and_files_removed() {
    let _env = env_guard();
    std::env::remove_var(LOCATION_ENV_VAR);

    let (capture, paths) = with_capture(&ReportContext::unconfigured(), |ctx| -> Result<_> {
        for i in 1..=2 {
            exec_subprocess(i, "original")?;
        }
        exec_subprocess(1, "overridden")?;
        Ok((
            ctx.location().unwrap().to_path_buf(),
            ctx.secondary_location().unwrap(),
        ))
    })
    .unwrap();

    let reports = &capture.primary.reports;
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].key, "subprocess1");
    assert_eq!(reports[0].pr_report.as_deref(), Some("overridden"));
    assert_eq!(reports[1].key, "subprocess2");
    assert_eq!(reports[1].pr_report.as_deref(), Some("original"));
    assert!(capture.must_generate());
    assert_eq!(capture.pr_markdown(), "overridden\noriginal\n");
    assert!(capture.structured.is_none());

    let (primary, secondary): (PathBuf, PathBuf) = paths;
    assert!(!primary.exists());
    assert!(!secondary.exists());
    assert!(std::env::var_os(LOCATION_ENV_VAR).is_none());
}

#[test]
fn test_subprocess_targets_use_the_derived_log() {
    let _env = env_guard();

    let target = TargetReport::new("typescript", "1.23.8")
        .with_package_name("@acme/sdk")
        .with_previous_version("1.23.7")
        .with_operation(OperationChange::modified(
            "sdk.createUser()",
            vec![FieldChange::new("request.email", FieldChangeKind::Removed, true)],
        ));
    let payload = serde_json::to_vec(&target).unwrap();

    let (capture, ()) = with_capture(&ReportContext::unconfigured(), |ctx| -> Result<()> {
        for _ in 0..2 {
            let mut child = ctx
                .apply_to(&mut bin())
                .arg("add-target")
                .stdin(Stdio::piped())
                .spawn()
                .context("spawn version-report add-target")?;
            child
                .stdin
                .take()
                .context("child stdin")?
                .write_all(&payload)?;
            let status = child.wait()?;
            if !status.success() {
                bail!("add-target exited with {status}");
            }
        }
        Ok(())
    })
    .unwrap();

    assert!(capture.primary.is_empty());
    let structured = capture.structured.expect("structured records");
    assert_eq!(structured.targets, vec![target.clone(), target]);
    assert!(structured.is_breaking());
}

#[test]
fn test_failing_subprocess_error_is_returned() {
    let _env = env_guard();
    std::env::remove_var(LOCATION_ENV_VAR);

    let err = with_capture(&ReportContext::unconfigured(), |_| -> Result<()> {
        let status = bin()
            .args(["add", "--key", "k", "--bump", "enormous"])
            .stderr(Stdio::null())
            .status()?;
        if !status.success() {
            bail!("add rejected");
        }
        Ok(())
    })
    .unwrap_err();

    assert_eq!(err.to_string(), "add rejected");
    assert!(std::env::var_os(LOCATION_ENV_VAR).is_none());
}

#[test]
fn test_capture_command_prints_combined_result() {
    let _env = env_guard();

    let output = bin()
        .env_remove(LOCATION_ENV_VAR)
        .args(["capture", "--"])
        .arg(env!("CARGO_BIN_EXE_version-report"))
        .args([
            "add",
            "--key",
            "sdk",
            "--priority",
            "-1",
            "--bump",
            "minor",
            "--new-version",
            "1.4.0",
            "--commit-report",
            "feat: new endpoints",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let report = &value["primary"]["reports"][0];
    assert_eq!(report["key"], "sdk");
    assert_eq!(report["priority"], -1);
    assert_eq!(report["bump_type"], "minor");
    assert_eq!(report["new_version"], "1.4.0");
    assert_eq!(report["commit_report"], "feat: new endpoints");
    assert!(value["structured"].is_null());
}
