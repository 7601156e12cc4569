mod support;

use std::collections::HashMap;
use std::sync::Arc;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use postcache::cache::{CacheConfig, MemoryBackend, PostListCache};

use support::{DownBackend, FakeStore, memory_service, service_with};

#[tokio::test]
async fn cache_paths_emit_expected_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // miss + store latency, then hit, then invalidate
    let store = FakeStore::new();
    store.seed("a", 0);
    let (service, _) = memory_service(&store);
    service.get_posts().await.expect("miss");
    service.get_posts().await.expect("hit");
    service
        .create_post(Some("b".to_string()), None)
        .await
        .expect("create");

    // backend errors on read and a failed invalidation
    let down = service_with(
        &store,
        Arc::new(DownBackend::default()),
        &CacheConfig::default(),
    );
    down.get_posts().await.expect("read through outage");
    down.create_post(Some("c".to_string()), None)
        .await
        .expect("create through outage");

    // populate skipped after an intervening invalidation
    let cache = PostListCache::new(Arc::new(MemoryBackend::new()), &CacheConfig::default());
    let observed = cache.epoch();
    cache.invalidate().await.expect("invalidate");
    cache.populate(observed, &[]).await.expect("populate");

    let mut counters: HashMap<String, u64> = HashMap::new();
    let mut histograms: HashMap<String, usize> = HashMap::new();
    for (key, _, _, value) in snapshotter.snapshot().into_vec() {
        let name = key.key().name().to_string();
        match value {
            DebugValue::Counter(count) => *counters.entry(name).or_default() += count,
            DebugValue::Histogram(samples) => *histograms.entry(name).or_default() += samples.len(),
            DebugValue::Gauge(_) => {}
        }
    }

    let counter = |name: &str| counters.get(name).copied().unwrap_or(0);
    assert!(counter("postcache_cache_hit_total") >= 1);
    assert!(counter("postcache_cache_miss_total") >= 1);
    assert!(counter("postcache_cache_backend_error_total") >= 2);
    assert!(counter("postcache_cache_invalidate_total") >= 3);
    assert!(counter("postcache_cache_invalidate_failed_total") >= 1);
    assert!(counter("postcache_cache_populate_skipped_total") >= 1);
    assert!(histograms.get("postcache_store_list_ms").copied().unwrap_or(0) >= 2);
}
