//! End-to-end tests of the do-file protocol with a real `/bin/sh`.
//!
//! Each test writes do-files into a scratch project, builds one target through
//! `ShellRunner`, and checks the committed target plus leftover temp files.

use std::fs;

use redo::build::{BuildContext, BuildOutcome, build};
use redo::core::commit::CommitOutcome;
use redo::core::env::ParentContext;
use redo::error::{BuildError, ErrorKind};
use redo::io::config::RedoConfig;
use redo::io::shell::ShellRunner;
use redo::test_support::TestProject;

fn ctx() -> BuildContext {
    BuildContext::default()
}

fn verbose_ctx() -> BuildContext {
    BuildContext {
        config: RedoConfig {
            verbose: true,
            ..RedoConfig::default()
        },
        parent: ParentContext::default(),
    }
}

/// `out.txt` whose do-file prints `hello` ends up containing exactly `hello`.
#[test]
fn stdout_only_becomes_target() {
    let project = TestProject::new().expect("project");
    project
        .write_do("out.txt.do", "printf hello\n")
        .expect("dofile");
    let target = project.target("out.txt").expect("target");

    let report = build(&target, &ctx(), &ShellRunner).expect("build");
    assert_eq!(
        report.outcome,
        BuildOutcome::Built(CommitOutcome::PromoteCapture)
    );
    assert_eq!(project.read("out.txt").expect("read"), "hello");
    assert!(project.temp_files().expect("temp files").is_empty());
}

#[test]
fn explicit_only_becomes_target() {
    let project = TestProject::new().expect("project");
    project
        .write_do("default.txt.do", "printf 'from $3' > \"$3\"\n")
        .expect("dofile");
    let target = project.target("out.txt").expect("target");

    let report = build(&target, &ctx(), &ShellRunner).expect("build");
    assert_eq!(
        report.outcome,
        BuildOutcome::Built(CommitOutcome::PromoteExplicit)
    );
    assert_eq!(project.read("out.txt").expect("read"), "from $3");
    assert!(project.temp_files().expect("temp files").is_empty());
}

/// Creating `$3` without writing to it still selects it over empty stdout.
#[test]
fn empty_explicit_file_produces_empty_target() {
    let project = TestProject::new().expect("project");
    project.write("out.txt", "previous").expect("seed");
    project
        .write_do("out.txt.do", ": > \"$3\"\n")
        .expect("dofile");
    let target = project.target("out.txt").expect("target");

    build(&target, &ctx(), &ShellRunner).expect("build");
    assert_eq!(project.read("out.txt").expect("read"), "");
    assert!(project.temp_files().expect("temp files").is_empty());
}

#[test]
fn writing_both_outputs_fails_and_keeps_previous_target() {
    let project = TestProject::new().expect("project");
    project.write("out.txt", "previous").expect("seed");
    project
        .write_do("out.txt.do", "printf a\nprintf b > \"$3\"\n")
        .expect("dofile");
    let target = project.target("out.txt").expect("target");

    let err = build(&target, &ctx(), &ShellRunner).unwrap_err();
    assert!(matches!(err, BuildError::DualOutput { .. }), "{err}");
    assert_eq!(err.kind(), ErrorKind::Violation);
    assert_eq!(project.read("out.txt").expect("read"), "previous");
    assert!(project.temp_files().expect("temp files").is_empty());
}

#[test]
fn no_output_removes_stale_target() {
    let project = TestProject::new().expect("project");
    project.write("out.txt", "stale").expect("seed");
    project.write_do("out.txt.do", "true\n").expect("dofile");
    let target = project.target("out.txt").expect("target");

    let report = build(&target, &ctx(), &ShellRunner).expect("build");
    assert_eq!(
        report.outcome,
        BuildOutcome::Built(CommitOutcome::DeleteStale)
    );
    assert!(!target.full_path().exists());

    build(&target, &ctx(), &ShellRunner).expect("rebuild without previous target");
    assert!(project.temp_files().expect("temp files").is_empty());
}

#[test]
fn task_writing_to_explicit_path_fails() {
    let project = TestProject::new().expect("project");
    project
        .write_do("@deploy.do", "printf oops > \"$3\"\n")
        .expect("dofile");
    let target = project.target("@deploy").expect("target");

    let err = build(&target, &ctx(), &ShellRunner).unwrap_err();
    assert!(matches!(err, BuildError::TaskWroteExplicit { .. }), "{err}");
    assert!(err.to_string().contains("@deploy.do"));
    assert!(!target.full_path().exists());
    assert!(project.temp_files().expect("temp files").is_empty());
}

#[test]
fn task_runs_for_side_effects() {
    let project = TestProject::new().expect("project");
    project
        .write_do("@all.do", "touch side-effect\n")
        .expect("dofile");
    let target = project.target("@all").expect("target");

    let report = build(&target, &ctx(), &ShellRunner).expect("build");
    assert_eq!(report.outcome, BuildOutcome::Built(CommitOutcome::NoOp));
    assert!(project.path().join("side-effect").exists());
    assert!(!target.full_path().exists());
}

/// `data.tar.gz` with only `default.gz.do` gets `$2 = data.tar`.
#[test]
fn generic_dofile_receives_one_level_basename() {
    let project = TestProject::new().expect("project");
    project
        .write_do("default.gz.do", "printf '%s|%s' \"$1\" \"$2\"\n")
        .expect("dofile");
    let target = project.target("data.tar.gz").expect("target");

    let report = build(&target, &ctx(), &ShellRunner).expect("build");
    assert_eq!(report.dofile.name, "default.gz.do");
    assert_eq!(
        project.read("data.tar.gz").expect("read"),
        "data.tar.gz|data.tar"
    );
}

#[test]
fn script_runs_in_its_own_directory_with_relative_paths() {
    let project = TestProject::new().expect("project");
    project
        .write_do(
            "default.o.do",
            "printf '%s|%s|%s' \"$(pwd -P)\" \"$1\" \"$2\"\n",
        )
        .expect("dofile");
    let target = project.target("src/lib/x.o").expect("target");

    build(&target, &ctx(), &ShellRunner).expect("build");
    assert_eq!(
        project.read("src/lib/x.o").expect("read"),
        format!("{}|src/lib/x.o|src/lib/x", project.path().display())
    );
}

#[test]
fn child_environment_carries_parent_and_depth() {
    let project = TestProject::new().expect("project");
    project
        .write_do(
            "sub/default.do",
            "printf '%s|%s|[%s]' \"$REDO_PARENT\" \"$REDO_PARENT_DIR\" \"$REDO_DEPTH\"\n",
        )
        .expect("dofile");
    let target = project.target("sub/out.txt").expect("target");
    let nested = BuildContext {
        config: RedoConfig::default(),
        parent: ParentContext {
            depth: " ".to_string(),
            parent: "all".to_string(),
        },
    };

    build(&target, &nested, &ShellRunner).expect("build");
    assert_eq!(
        project.read("sub/out.txt").expect("read"),
        format!("out.txt|{}|[  ]", project.path().join("sub").display())
    );
}

#[test]
fn first_failing_command_aborts_script() {
    let project = TestProject::new().expect("project");
    project
        .write_do("out.txt.do", "false\nprintf never\n")
        .expect("dofile");
    let target = project.target("out.txt").expect("target");

    let err = build(&target, &ctx(), &ShellRunner).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Run);
    assert!(!err.to_string().contains("/bin/sh"), "{err}");
    assert!(!target.full_path().exists());
    assert!(project.temp_files().expect("temp files").is_empty());
}

#[test]
fn verbose_failure_includes_command_line() {
    let project = TestProject::new().expect("project");
    project.write_do("out.txt.do", "exit 3\n").expect("dofile");
    let target = project.target("out.txt").expect("target");

    let err = build(&target, &verbose_ctx(), &ShellRunner).unwrap_err();
    let message = err.to_string();
    assert!(
        message.starts_with("out.txt: /bin/sh -e out.txt.do out.txt out.txt "),
        "{message}"
    );
    assert!(message.contains("out.txt.dst.tmp"), "{message}");
}

#[test]
fn extra_shell_flag_is_passed_through() {
    let project = TestProject::new().expect("project");
    project
        .write_do("out.txt.do", "case $- in *x*) printf traced;; *) printf plain;; esac\n")
        .expect("dofile");
    let target = project.target("out.txt").expect("target");
    let traced = BuildContext {
        config: RedoConfig {
            shell_args: Some("x".to_string()),
            ..RedoConfig::default()
        },
        parent: ParentContext::default(),
    };

    build(&target, &traced, &ShellRunner).expect("build");
    assert_eq!(project.read("out.txt").expect("read"), "traced");
}

#[test]
fn leftover_explicit_file_from_crashed_run_is_ignored() {
    let project = TestProject::new().expect("project");
    project.write("out.txt.dst.tmp", "crashed").expect("leftover");
    project
        .write_do("out.txt.do", "printf fresh\n")
        .expect("dofile");
    let target = project.target("out.txt").expect("target");

    build(&target, &ctx(), &ShellRunner).expect("build");
    assert_eq!(project.read("out.txt").expect("read"), "fresh");
    assert!(project.temp_files().expect("temp files").is_empty());
}

#[test]
fn rebuilding_is_safe_after_a_failure() {
    let project = TestProject::new().expect("project");
    project
        .write_do("out.txt.do", "printf a\nprintf b > \"$3\"\n")
        .expect("dofile");
    let target = project.target("out.txt").expect("target");
    build(&target, &ctx(), &ShellRunner).unwrap_err();

    fs::write(project.path().join("out.txt.do"), "printf fixed\n").expect("fix dofile");
    build(&target, &ctx(), &ShellRunner).expect("rebuild");
    assert_eq!(project.read("out.txt").expect("read"), "fixed");
}
