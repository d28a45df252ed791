use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn missing_video_id_prints_usage_and_fails() {
    Command::cargo_bin("transcript-fetcher")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn extra_arguments_are_rejected() {
    Command::cargo_bin("transcript-fetcher")
        .unwrap()
        .args(["dQw4w9WgXcQ", "surplus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_describes_the_tool() {
    Command::cargo_bin("transcript-fetcher")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("VIDEO_ID"))
        .stdout(predicate::str::contains("--tor"));
}

#[test]
fn invalid_proxy_port_is_rejected() {
    Command::cargo_bin("transcript-fetcher")
        .unwrap()
        .args(["dQw4w9WgXcQ", "--proxy-port", "notaport"])
        .assert()
        .failure();
}
