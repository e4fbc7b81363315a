//! Install and activate.

mod common;

use std::sync::Arc;

use common::*;
use swcache_core::{CacheStorage, SwcacheError, DEFAULT_CORE_ASSETS};
use swcache_router::RouterState;
use swcache_store::MemoryCacheStorage;

#[tokio::test]
async fn test_install_stores_every_core_asset() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let fetcher = ScriptedFetcher::with_shell();
    let router = router_with(config(), storage.clone(), fetcher.clone());

    let report = router.install().await.unwrap();

    assert_eq!(report.cache_name, "route-stats-cache-v027");
    assert_eq!(report.assets_cached, DEFAULT_CORE_ASSETS.len());
    assert!(report.skip_waiting);
    assert_eq!(router.state(), RouterState::Installed);

    let cache = storage.get("route-stats-cache-v027").unwrap();
    assert_eq!(cache.len(), DEFAULT_CORE_ASSETS.len());
    let shell = cache.get(&key("./index.html")).unwrap();
    assert_eq!(shell.body, "body of /index.html");
}

#[tokio::test]
async fn test_install_is_all_or_nothing() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let fetcher = ScriptedFetcher::with_shell();
    fetcher.serve_status("/icon-512.png", 404, "gone");
    let router = router_with(config(), storage.clone(), fetcher);

    let err = router.install().await.unwrap_err();

    assert!(matches!(
        err,
        SwcacheError::BadAssetStatus { ref asset, status: 404 } if asset == "./icon-512.png"
    ));
    assert_eq!(router.state(), RouterState::Redundant);
    assert!(storage
        .get("route-stats-cache-v027")
        .map_or(true, |cache| cache.is_empty()));
}

#[tokio::test]
async fn test_install_fails_offline() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let fetcher = ScriptedFetcher::with_shell();
    fetcher.set_offline(true);
    let router = router_with(config(), storage, fetcher);

    let err = router.install().await.unwrap_err();
    assert!(matches!(err, SwcacheError::InstallFailed { .. }));
}

#[tokio::test]
async fn test_failed_install_prevents_activation() {
    let storage = Arc::new(MemoryCacheStorage::new());
    storage.open("route-stats-cache-v026").await.unwrap();
    let fetcher = ScriptedFetcher::with_shell();
    fetcher.set_offline(true);
    let router = router_with(config(), storage.clone(), fetcher);

    router.install().await.unwrap_err();
    let err = router.activate().await.unwrap_err();

    assert!(matches!(err, SwcacheError::InvalidState { .. }));
    assert!(storage.has("route-stats-cache-v026").await.unwrap());
}

#[tokio::test]
async fn test_install_is_idempotent() {
    let storage = CountingStorage::new();
    let fetcher = ScriptedFetcher::with_shell();
    let router = router_with(config(), storage.clone(), fetcher);

    router.install().await.unwrap();
    let first = storage.snapshot();
    router.install().await.unwrap();
    let second = storage.snapshot();

    assert_eq!(first, second);
    assert_eq!(router.state(), RouterState::Installed);
}

#[tokio::test]
async fn test_install_can_retry_after_failure() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let fetcher = ScriptedFetcher::with_shell();
    fetcher.set_offline(true);
    let router = router_with(config(), storage, fetcher.clone());

    router.install().await.unwrap_err();
    fetcher.set_offline(false);
    router.install().await.unwrap();

    assert_eq!(router.state(), RouterState::Installed);
}

#[tokio::test]
async fn test_activate_keeps_only_current_cache() {
    let storage = Arc::new(MemoryCacheStorage::new());
    storage.open("route-stats-cache-v025").await.unwrap();
    storage.open("route-stats-cache-v026").await.unwrap();
    storage.open("some-other-cache").await.unwrap();
    let router = router_with(config(), storage.clone(), ScriptedFetcher::with_shell());

    router.install().await.unwrap();
    let report = router.activate().await.unwrap();

    assert_eq!(storage.keys().await.unwrap(), vec!["route-stats-cache-v027"]);
    assert_eq!(
        report.deleted,
        vec![
            "route-stats-cache-v025",
            "route-stats-cache-v026",
            "some-other-cache"
        ]
    );
    assert!(report.clients_claimed);
    assert_eq!(router.state(), RouterState::Activated);
}

#[tokio::test]
async fn test_activate_twice_requires_reinstall() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let router = router_with(config(), storage, ScriptedFetcher::with_shell());

    router.install().await.unwrap();
    router.activate().await.unwrap();
    assert!(router.activate().await.is_err());

    router.install().await.unwrap();
    let report = router.activate().await.unwrap();
    assert!(report.deleted.is_empty());
}

#[test]
fn test_duplicate_assets_rejected_before_install() {
    let config = config().with_assets(["./index.html", "./index.html#x", "./index.html"]);
    let result = swcache_router::CacheRouter::new(
        config,
        Arc::new(MemoryCacheStorage::new()),
        ScriptedFetcher::with_shell(),
    );
    assert!(matches!(result, Err(SwcacheError::ConfigError(_))));
}

#[tokio::test]
async fn test_install_report_counts_stored_entries() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let config = config().with_assets(["./", "./index.html", "./manifest.json"]);
    let router = router_with(config, storage.clone(), ScriptedFetcher::with_shell());

    let report = router.install().await.unwrap();

    let cache = storage.get(&report.cache_name).unwrap();
    assert_eq!(report.assets_cached, cache.len());
    assert_eq!(report.assets_cached, 3);
}
