// tests/config_loading.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, JobConfigBuilder};
use crate::common::{ManualExecutor, init_tracing};

use std::fs;

use tempfile::TempDir;

use batchpool::config::{load_and_validate, parse_str};
use batchpool::errors::BatchpoolError;
use batchpool::jobs::PlaylistEntry;
use batchpool::submit_config;
use batchpool::types::{JobKind, TaskStatus};

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("Batchpool.toml");
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn loads_and_applies_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(
        &dir,
        r#"
[job.rip]
kind = "cd_extraction"
cmd = "ripper --track 1"
"#,
    );

    let cfg = load_and_validate(&path).expect("valid config");
    assert_eq!(cfg.pool.worker_count, 2);
    assert!(cfg.pool.auto_size);
    assert_eq!(cfg.pool.poll_interval_ms, 200);

    let rip = &cfg.job["rip"];
    assert_eq!(rip.kind, JobKind::CdExtraction);
    assert_eq!(rip.display_name("rip"), "rip");
    assert!(rip.after.is_none());

    let manager_cfg = cfg.manager_config();
    assert_eq!(manager_cfg.worker_count, 2);
    assert!(manager_cfg.auto_size);
}

#[test]
fn full_job_file_is_parsed() {
    let raw = parse_str(
        r#"
[pool]
worker_count = 3
auto_size = false
poll_interval_ms = 50

[job.encode]
kind = "encoding"
name = "Track 1"
description = "flac -> mp3"
cmd = "lame track1.wav track1.mp3"
progress_pattern = '(\d+)%'
after = "rip"

[job.rip]
kind = "cd_extraction"
cmd = "cdparanoia 1 track1.wav"

[job.list]
kind = "playlist_write"
output = "album.m3u"
extended = true
after = "encode"

[[job.list.entries]]
path = "track1.mp3"
title = "Intro"
length_secs = 61
"#,
    )
    .expect("parses");

    assert_eq!(raw.pool.worker_count, 3);
    assert!(!raw.pool.auto_size);
    assert_eq!(raw.job.len(), 3);

    let list = &raw.job["list"];
    assert!(list.extended);
    assert_eq!(list.entries, vec![PlaylistEntry::new("track1.mp3").with_title("Intro", 61)]);

    let encode = &raw.job["encode"];
    assert_eq!(encode.display_name("encode"), "Track 1");
    assert_eq!(encode.after.as_deref(), Some("rip"));
}

#[test]
fn job_without_kind_defaults_to_unknown() {
    assert_eq!(JobKind::default(), JobKind::Unknown);

    let raw = parse_str(
        r#"
[job.tag]
cmd = "tagger album"
"#,
    )
    .expect("parses");
    assert_eq!(raw.job["tag"].kind, JobKind::Unknown);
}

#[test]
fn unknown_kind_is_a_parse_error() {
    let err = parse_str(
        r#"
[job.x]
kind = "transcoding"
cmd = "true"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, BatchpoolError::TomlError(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().expect("tempdir");
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, BatchpoolError::IoError(_)));
}

#[test]
fn submission_order_puts_dependencies_first() {
    let cfg = ConfigFileBuilder::new()
        .with_job(
            "a_list",
            JobConfigBuilder::playlist("out.m3u").after("b_encode").build(),
        )
        .with_job(
            "b_encode",
            JobConfigBuilder::command(JobKind::Encoding, "enc").after("c_rip").build(),
        )
        .with_job(
            "c_rip",
            JobConfigBuilder::command(JobKind::CdExtraction, "rip").build(),
        )
        .build();

    assert_eq!(cfg.submission_order(), ["c_rip", "b_encode", "a_list"]);
}

#[test]
fn empty_config_is_rejected() {
    let err = ConfigFileBuilder::new().try_build().unwrap_err();
    assert!(matches!(err, BatchpoolError::ConfigError(msg) if msg.contains("at least one")));
}

#[test]
fn zero_poll_interval_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_poll_interval_ms(0)
        .with_job("a", JobConfigBuilder::command(JobKind::Encoding, "enc").build())
        .try_build()
        .unwrap_err();
    assert!(matches!(err, BatchpoolError::ConfigError(msg) if msg.contains("poll_interval_ms")));
}

#[test]
fn zero_workers_is_accepted() {
    let cfg = ConfigFileBuilder::new()
        .with_workers(0, false)
        .with_job("a", JobConfigBuilder::command(JobKind::Encoding, "enc").build())
        .build();
    assert_eq!(cfg.pool.worker_count, 0);
}

#[test]
fn command_job_needs_cmd() {
    let err = ConfigFileBuilder::new()
        .with_job("a", JobConfigBuilder::command(JobKind::Encoding, "   ").build())
        .try_build()
        .unwrap_err();
    assert!(matches!(err, BatchpoolError::ConfigError(msg) if msg.contains("needs a `cmd`")));
}

#[test]
fn playlist_job_needs_output() {
    let err = ConfigFileBuilder::new()
        .with_job("list", JobConfigBuilder::playlist("").build())
        .try_build()
        .unwrap_err();
    assert!(matches!(err, BatchpoolError::ConfigError(msg) if msg.contains("`output`")));
}

#[test]
fn progress_pattern_must_compile_and_capture() {
    let err = ConfigFileBuilder::new()
        .with_job(
            "a",
            JobConfigBuilder::command(JobKind::Encoding, "enc")
                .progress_pattern("(\\d+")
                .build(),
        )
        .try_build()
        .unwrap_err();
    assert!(matches!(err, BatchpoolError::ConfigError(msg) if msg.contains("invalid progress_pattern")));

    let err = ConfigFileBuilder::new()
        .with_job(
            "a",
            JobConfigBuilder::command(JobKind::Encoding, "enc")
                .progress_pattern("\\d+%")
                .build(),
        )
        .try_build()
        .unwrap_err();
    assert!(matches!(err, BatchpoolError::ConfigError(msg) if msg.contains("capture group")));
}

#[test]
fn unknown_dependency_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_job(
            "a",
            JobConfigBuilder::command(JobKind::Encoding, "enc").after("ghost").build(),
        )
        .try_build()
        .unwrap_err();
    assert!(matches!(err, BatchpoolError::ConfigError(msg) if msg.contains("unknown dependency 'ghost'")));
}

#[test]
fn self_dependency_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_job(
            "a",
            JobConfigBuilder::command(JobKind::Encoding, "enc").after("a").build(),
        )
        .try_build()
        .unwrap_err();
    assert!(matches!(err, BatchpoolError::ConfigError(msg) if msg.contains("itself")));
}

#[test]
fn dependency_cycle_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_job(
            "a",
            JobConfigBuilder::command(JobKind::Encoding, "enc").after("b").build(),
        )
        .with_job(
            "b",
            JobConfigBuilder::command(JobKind::Encoding, "enc").after("a").build(),
        )
        .try_build()
        .unwrap_err();
    assert!(matches!(err, BatchpoolError::DependencyCycle(_)));
}

#[test]
fn submit_config_wires_dependencies_by_key() {
    init_tracing();
    let dir = TempDir::new().expect("tempdir");
    let output = dir.path().join("album.m3u");

    let cfg = ConfigFileBuilder::new()
        .with_job(
            "list",
            JobConfigBuilder::playlist(output.to_str().expect("utf-8 path"))
                .entry(PlaylistEntry::new("track1.mp3"))
                .after("rip")
                .build(),
        )
        .with_job(
            "rip",
            JobConfigBuilder::command(JobKind::CdExtraction, "true")
                .name("Rip track 1")
                .build(),
        )
        .build();

    let (manager, exec) = ManualExecutor::manager();
    let ids = submit_config(&manager, &cfg).expect("submitted");

    // The dependency is submitted first and is the only job dispatched.
    assert!(ids["rip"] < ids["list"]);
    assert_eq!(exec.pending_ids(), vec![ids["rip"]]);

    let tasks = manager.current_tasks();
    assert_eq!(tasks[0].name, "Rip track 1");
    assert_eq!(tasks[0].kind, JobKind::CdExtraction);
    assert_eq!(tasks[1].name, "Playlist: album.m3u");
    assert_eq!(tasks[1].kind, JobKind::PlaylistWrite);
    assert_eq!(tasks[1].status, TaskStatus::Waiting);
}
