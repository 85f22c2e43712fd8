//! Reapers driven against a file-backed store and real directories.

mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as TimeDelta, Utc};

use apphub::cluster::NoopPodClient;
use apphub::db::{application_repo, bucket_repo, file_repo, group_repo, task_repo, Database};
use apphub::lifecycle::Manager;
use apphub::model::task::RELEASED;
use apphub::model::{Attachment, GroupMode, Task, TaskGroup, TaskState};
use apphub::reaper::{BucketReaper, FileReaper, GroupReaper, Reaper, Supervisor, TaskReaper};

use common::*;

#[test]
fn test_pipelined_created_task_is_released_not_deleted() {
    let h = TestHarness::new();
    let settings = h.settings();
    let group =
        group_repo::insert(&h.db, &TaskGroup::new("pipeline", GroupMode::Pipeline)).unwrap();
    let bucket = bucket_repo::create(&h.db, &h.bucket_root).unwrap();
    let file = file_repo::create(&h.db, &h.file_root, "log", b"out").unwrap();

    let mut task = Task::new("analyze", TaskState::Created);
    task.create_time = Utc::now() - TimeDelta::minutes(2 * settings.hub.task.reaper.created as i64);
    task.task_group_id = Some(group);
    task.bucket_id = Some(bucket.id);
    task.attached = vec![Attachment {
        id: file.id,
        name: file.name.clone(),
        activity: 0,
    }];
    let id = task_repo::insert(&h.db, &task).unwrap();

    let reaper = TaskReaper::new(h.db.clone(), Arc::clone(&settings), Arc::new(NoopPodClient));
    reaper.reap(Utc::now()).unwrap();

    let task = task_repo::find_by_id(&h.db, id).unwrap().expect("task kept");
    assert_eq!(task.state, TaskState::Created);
    assert!(task.bucket_id.is_none());
    assert!(task.attached.is_empty());
    assert!(task.events.iter().any(|e| e.kind == RELEASED));
}

#[test]
fn test_bucket_reclamation_cycles() {
    let h = TestHarness::new();
    let settings = h.settings();
    let bucket = bucket_repo::create(&h.db, &h.bucket_root).unwrap();
    let reaper = BucketReaper::new(h.db.clone(), Arc::clone(&settings));
    let now = Utc::now();
    let ttl = TimeDelta::minutes(settings.bucket.ttl as i64);

    reaper.reap(now).unwrap();
    let marked = bucket_repo::find_by_id(&h.db, bucket.id).unwrap().unwrap();
    assert_eq!(marked.expiration, Some(now + ttl));

    reaper.reap(now + ttl / 2).unwrap();
    let waiting = bucket_repo::find_by_id(&h.db, bucket.id).unwrap().unwrap();
    assert_eq!(waiting.expiration, marked.expiration);
    assert!(Path::new(&bucket.path).exists());

    reaper.reap(now + ttl * 2).unwrap();
    assert!(bucket_repo::find_by_id(&h.db, bucket.id).unwrap().is_none());
    assert!(!Path::new(&bucket.path).exists());
}

#[test]
fn test_bucket_referenced_before_expiry_is_kept() {
    let h = TestHarness::new();
    let settings = h.settings();
    let bucket = bucket_repo::create(&h.db, &h.bucket_root).unwrap();
    let reaper = BucketReaper::new(h.db.clone(), Arc::clone(&settings));
    let now = Utc::now();

    reaper.reap(now).unwrap();
    let app = ApplicationBuilder::new("app").insert(&h.db);
    application_repo::set_bucket(&h.db, app, Some(bucket.id)).unwrap();
    reaper.reap(now + TimeDelta::minutes(10)).unwrap();

    let kept = bucket_repo::find_by_id(&h.db, bucket.id).unwrap().unwrap();
    assert!(kept.expiration.is_none());
    assert!(Path::new(&kept.path).exists());
}

#[test]
fn test_group_and_file_reapers_together() {
    let h = TestHarness::new();
    let settings = h.settings();
    let bucket = bucket_repo::create(&h.db, &h.bucket_root).unwrap();
    let mut group = TaskGroup::new("ready", GroupMode::Batch);
    group.state = Some(TaskState::Ready);
    group.create_time = Utc::now() - TimeDelta::hours(2);
    group.bucket_id = Some(bucket.id);
    let group = group_repo::insert(&h.db, &group).unwrap();
    let orphan = file_repo::create(&h.db, &h.file_root, "tmp", b"x").unwrap();

    let now = Utc::now();
    GroupReaper::new(h.db.clone(), Arc::clone(&settings)).reap(now).unwrap();
    assert!(group_repo::find_by_id(&h.db, group).unwrap().is_none());

    let buckets = BucketReaper::new(h.db.clone(), Arc::clone(&settings));
    buckets.reap(now).unwrap();
    assert!(bucket_repo::find_by_id(&h.db, bucket.id).unwrap().unwrap().expiration.is_some());

    let files = FileReaper::new(h.db.clone(), Arc::clone(&settings));
    files.reap(now).unwrap();
    files
        .reap(now + TimeDelta::minutes(settings.file.ttl as i64 + 1))
        .unwrap();
    assert!(file_repo::find_by_id(&h.db, orphan.id).unwrap().is_none());
    assert!(!Path::new(&orphan.path).exists());
}

#[test]
fn test_supervisor_runs_under_manager() {
    let h = TestHarness::new();
    let settings = h.settings();
    let bucket = bucket_repo::create(&h.db, &h.bucket_root).unwrap();

    let mut manager = Manager::new(h.db.clone(), Duration::from_secs(5));
    manager.register(Box::new(Supervisor::new(
        h.db.clone(),
        Arc::clone(&settings),
        Arc::new(NoopPodClient),
    )));
    manager.run();
    std::thread::sleep(Duration::from_millis(200));
    manager.stop();
    assert!(h.db.is_closed());

    let reopened = Database::open(&settings.hub.db.path).unwrap();
    let marked = bucket_repo::find_by_id(&reopened, bucket.id).unwrap().unwrap();
    assert!(marked.expiration.is_some());
}
