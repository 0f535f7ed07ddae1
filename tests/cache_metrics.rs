use std::{
    io::Write,
    num::NonZeroUsize,
    sync::{Arc, OnceLock},
    time::Duration,
};

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use quire::{
    application::jobs::{
        LogExportContext, LogTaskError, LogTaskService, LogTaskStore, WorkerPoolConfig,
    },
    cache::BoundedCache,
    infra::{artifacts::ArtifactStore, log_source::FileLogSource},
};
use serial_test::serial;

fn snapshotter() -> &'static Snapshotter {
    static SNAPSHOTTER: OnceLock<Snapshotter> = OnceLock::new();
    SNAPSHOTTER.get_or_init(|| {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        recorder
            .install()
            .expect("debug metrics recorder should install in this test process");
        snapshotter
    })
}

/// Sum of every counter called `name` whose labels include `label`, if given.
fn counter_total(name: &str, label: Option<(&str, &str)>) -> u64 {
    snapshotter()
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(key, _, _, _)| key.key().name() == name)
        .filter(|(key, _, _, _)| match label {
            Some((label_key, label_value)) => key
                .key()
                .labels()
                .any(|l| l.key() == label_key && l.value() == label_value),
            None => true,
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(count) => count,
            _ => 0,
        })
        .sum()
}

fn metric_names() -> Vec<String> {
    snapshotter()
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(key, _, _, _)| key.key().name().to_string())
        .collect()
}

#[test]
#[serial]
fn cache_operations_emit_hit_miss_and_evict_counters() {
    let _ = snapshotter();
    let label = Some(("cache", "metrics_probe"));
    let hits = counter_total("quire_cache_hit_total", label);
    let misses = counter_total("quire_cache_miss_total", label);
    let evictions = counter_total("quire_cache_evict_total", label);

    let cache: BoundedCache<String, u32> =
        BoundedCache::with_name("metrics_probe", 1).expect("capacity");
    assert_eq!(cache.get("a"), None);
    cache.put("a".to_string(), 1).expect("put a");
    assert_eq!(cache.get("a"), Some(1));
    cache.put("a".to_string(), 2).expect("replace a");
    cache.put("b".to_string(), 3).expect("put b");

    assert_eq!(counter_total("quire_cache_hit_total", label), hits + 1);
    assert_eq!(counter_total("quire_cache_miss_total", label), misses + 1);
    assert_eq!(counter_total("quire_cache_evict_total", label), evictions + 1);
}

#[tokio::test]
#[serial]
async fn log_pipeline_emits_task_metrics() {
    let _ = snapshotter();
    let mut log = tempfile::NamedTempFile::new().expect("log file");
    log.write_all(b"2024-01-15 INFO ok\n").expect("write log");
    let artifacts = tempfile::tempdir().expect("artifact dir");

    let context = LogExportContext::new(
        Arc::new(LogTaskStore::new()),
        Arc::new(FileLogSource::new(log.path())),
        Arc::new(ArtifactStore::new(artifacts.path()).expect("artifact store")),
    );
    let service = LogTaskService::start(
        WorkerPoolConfig {
            workers: NonZeroUsize::new(1).expect("workers"),
            queue_capacity: NonZeroUsize::new(1).expect("queue"),
        },
        context,
    );

    let submitted = counter_total("quire_log_task_submitted_total", None);
    let completed = counter_total("quire_log_task_completed_total", None);

    let id = service.submit("2024-01-15").expect("submit");
    service
        .wait_for_completion(&id, Duration::from_secs(10))
        .await
        .expect("completes");
    service.shutdown().await;

    assert_eq!(
        service.submit("2024-01-15"),
        Err(LogTaskError::ShuttingDown)
    );

    assert_eq!(
        counter_total("quire_log_task_submitted_total", None),
        submitted + 1
    );
    assert_eq!(
        counter_total("quire_log_task_completed_total", None),
        completed + 1
    );
    assert!(counter_total("quire_log_task_rejected_total", Some(("reason", "shutdown"))) >= 1);

    let names = metric_names();
    assert!(
        names.iter().any(|name| name == "quire_log_task_duration_ms"),
        "missing metric: quire_log_task_duration_ms"
    );
}
