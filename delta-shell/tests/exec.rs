use delta_core::{Change, Request, Runner};
use delta_shell::{EvalRunner, ExecConfig, ExecRunner, ShellError};
use serde_json::json;

fn change(file: std::path::PathBuf) -> Change {
    let (created, name) =
        delta_core::parse_file_name(&file.file_name().unwrap().to_string_lossy());

    Change {
        name,
        path: file.parent().unwrap().to_path_buf(),
        extension: "sh".to_owned(),
        created,
        file,
        ..Change::default()
    }
}

#[tokio::test]
async fn default_program_echoes_the_artifact_path() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("20240101000000.seed.commit.sh");
    tokio::fs::write(&file, "ignored by echo\n").await.unwrap();

    let runner = ExecRunner::new();
    let mut change = change(file.clone());

    let message = runner
        .commit(&mut change, &Request::default())
        .await
        .unwrap();

    assert!(message.contains("seed.commit.sh"), "{message}");
}

#[tokio::test]
async fn sh_program_runs_the_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("20240101000000.seed.commit.sh");
    tokio::fs::write(&file, "echo committed from script\n")
        .await
        .unwrap();

    let runner = ExecRunner::with_config(ExecConfig {
        program: "sh".to_owned(),
    });
    let mut change = change(file);

    let message = runner
        .commit(&mut change, &Request::default())
        .await
        .unwrap();

    assert_eq!(message, "committed from script");
}

#[tokio::test]
async fn rollback_runs_the_paired_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let commit = dir.path().join("20240101000000.seed.commit.sh");
    let rollback = dir.path().join("20240101000000.seed.rollback.sh");
    tokio::fs::write(&commit, "echo committed\n").await.unwrap();
    tokio::fs::write(&rollback, "echo rolled back\n").await.unwrap();

    let runner = ExecRunner::with_config(ExecConfig {
        program: "sh".to_owned(),
    });
    let mut change = change(commit);

    let message = runner
        .rollback(&mut change, &Request::default())
        .await
        .unwrap();

    assert_eq!(message, "rolled back");
}

#[tokio::test]
async fn rollback_without_paired_artifact_fails() {
    let dir = tempfile::tempdir().unwrap();
    let commit = dir.path().join("20240101000000.seed.commit.sh");
    tokio::fs::write(&commit, "echo committed\n").await.unwrap();

    let runner = ExecRunner::new();
    let mut change = change(commit);

    let err = runner
        .rollback(&mut change, &Request::default())
        .await
        .expect_err("derived rollback artifact does not exist");

    assert!(
        err.to_string().contains("rollback.sh"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn failing_command_surfaces_status_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("20240101000000.seed.commit.sh");
    tokio::fs::write(&file, "echo broken >&2\nexit 3\n").await.unwrap();

    let runner = ExecRunner::with_config(ExecConfig {
        program: "sh".to_owned(),
    });
    let mut change = change(file);

    let err = runner
        .commit(&mut change, &Request::default())
        .await
        .expect_err("non-zero exit must fail");

    match err.downcast_ref::<ShellError>() {
        Some(ShellError::CommandFailed { code, detail, .. }) => {
            assert_eq!(*code, Some(3));
            assert!(detail.contains("broken"));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn program_override_comes_from_request_params() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("20240101000000.seed.commit.sh");
    tokio::fs::write(&file, "echo from params\n").await.unwrap();

    let runner = ExecRunner::new(); // default program is echo
    let mut change = change(file);
    let req = Request::default().params(json!({ "program": "sh" }));

    let message = runner.commit(&mut change, &req).await.unwrap();

    assert_eq!(message, "from params");
}

#[tokio::test]
async fn eval_rejects_empty_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("20240101000000.seed.commit.js");
    tokio::fs::write(&file, "  \n").await.unwrap();

    let runner = EvalRunner::new("mongodb://localhost:27017");
    let mut change = change(file);

    let err = runner
        .commit(&mut change, &Request::default())
        .await
        .expect_err("empty artifact must fail before any evaluation");

    assert!(
        err.to_string().contains("empty migration artifact"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn eval_rollback_requires_the_paired_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let commit = dir.path().join("20240101000000.seed.commit.js");
    tokio::fs::write(&commit, "db.x.drop();\n").await.unwrap();

    let runner = EvalRunner::new("mongodb://localhost:27017");
    let mut change = change(commit);

    let err = runner
        .rollback(&mut change, &Request::default())
        .await
        .expect_err("derived rollback artifact does not exist");

    assert!(err.to_string().contains("rollback.js"), "{err}");
}
