//! End-to-end scenarios: trigger → durable log → beacon → confirmation.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracker_client::{
    AudioAction, AudioEventParams, CustomEventParams, Environment, PageViewParams, Tracker,
    TrackerConfig,
};
use tracker_outbox::{Transport, TransportError, EVENTS_KEY};
use tracker_storage::{KeyValueStore, MemoryStore};
use url::Url;

/// Records every beacon URL; confirms (succeeds) only when told to.
struct FakeCollector {
    confirm: AtomicBool,
    hits: Mutex<Vec<Url>>,
}

impl FakeCollector {
    fn new(confirm: bool) -> Arc<Self> {
        Arc::new(Self {
            confirm: AtomicBool::new(confirm),
            hits: Mutex::new(Vec::new()),
        })
    }

    fn hits(&self) -> Vec<Url> {
        self.hits.lock().unwrap().clone()
    }
}

impl Transport for FakeCollector {
    fn send(&self, url: Url) -> BoxFuture<'_, Result<(), TransportError>> {
        async move {
            self.hits.lock().unwrap().push(url);
            if self.confirm.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(TransportError::Status(503))
            }
        }
        .boxed()
    }
}

fn tracker_with(store: &Arc<MemoryStore>, collector: &Arc<FakeCollector>) -> Tracker {
    Tracker::new(
        Arc::clone(store) as Arc<dyn KeyValueStore>,
        Arc::clone(collector) as Arc<dyn Transport>,
        Environment::default(),
    )
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

fn query(url: &Url) -> BTreeMap<String, String> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[tokio::test]
async fn custom_event_is_delivered_and_removed_from_the_log() {
    let store = Arc::new(MemoryStore::new());
    let collector = FakeCollector::new(true);
    let tracker = tracker_with(&store, &collector);

    tracker
        .initialize(TrackerConfig::new("515773", "https://logs1252"))
        .await
        .unwrap();
    tracker
        .track_custom_event(CustomEventParams {
            event_type: Some("A".to_string()),
            page: Some("test::http://test".to_string()),
            level: Some("0".to_string()),
        })
        .await
        .unwrap();

    wait_until(|| !collector.hits().is_empty()).await;
    let hit = &collector.hits()[0];
    assert_eq!(hit.host_str(), Some("logs1252.xiti.com"));
    let params = query(hit);
    assert_eq!(params["s"], "515773");
    assert_eq!(params["s2"], "0");
    assert_eq!(params["p"], "test::http://test");
    assert_eq!(params["clic"], "A");

    // on confirmation the durable log returns to empty
    wait_until(|| store.get(EVENTS_KEY).unwrap() == Some("[]".to_string())).await;
}

#[tokio::test]
async fn audio_play_schedules_refresh_until_stopped() {
    let store = Arc::new(MemoryStore::new());
    let collector = FakeCollector::new(true);
    let tracker = tracker_with(&store, &collector);

    let mut config = TrackerConfig::new("515773", "https://logs1252");
    config.audio_refresh_interval = Duration::from_millis(20);
    tracker.initialize(config).await.unwrap();

    tracker
        .track_audio_event(AudioEventParams {
            page: Some("s::u".to_string()),
            level: Some("0".to_string()),
            action: Some(AudioAction::Play),
            duration: Some("123456".to_string()),
            context_page: Some("c::p".to_string()),
            context_level: Some("1".to_string()),
            quality_id: None,
        })
        .await
        .unwrap();

    wait_until(|| !collector.hits().is_empty()).await;
    let params = query(&collector.hits()[0]);
    assert_eq!(params["type"], "audio");
    assert_eq!(params["a"], "play");
    assert_eq!(params["m1"], "123456");
    assert_eq!(params["prich"], "c::p");
    assert_eq!(params["s2rich"], "1");

    // refresh ticks keep arriving while playback runs
    wait_until(|| {
        collector
            .hits()
            .iter()
            .filter(|u| query(u).get("a").map(String::as_str) == Some("refresh"))
            .count()
            >= 2
    })
    .await;

    tracker
        .track_audio_event(AudioEventParams {
            page: Some("s::u".to_string()),
            level: Some("0".to_string()),
            action: Some(AudioAction::Stop),
            duration: Some("123456".to_string()),
            context_page: Some("c::p".to_string()),
            context_level: Some("1".to_string()),
            quality_id: None,
        })
        .await
        .unwrap();

    // after stop, the refresh stream dries up
    tokio::time::sleep(Duration::from_millis(60)).await;
    let count = collector.hits().len();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(collector.hits().len(), count);
}

#[tokio::test]
async fn queue_survives_a_restart() {
    let store = Arc::new(MemoryStore::new());

    // first run: collector never confirms, events stay queued
    {
        let collector = FakeCollector::new(false);
        let tracker = tracker_with(&store, &collector);
        tracker
            .initialize(TrackerConfig::new("515773", "https://logs1252"))
            .await
            .unwrap();
        for page in ["one", "two"] {
            tracker
                .track_page_view(PageViewParams {
                    page: Some(page.to_string()),
                    level: Some("0".to_string()),
                })
                .await
                .unwrap();
        }
        wait_until(|| collector.hits().len() >= 2).await;
        assert_eq!(tracker.pending_count().await.unwrap(), 2);
    }

    // second run over the same store: recovery delivers both
    let collector = FakeCollector::new(true);
    let tracker = tracker_with(&store, &collector);
    tracker
        .initialize(TrackerConfig::new("515773", "https://logs1252"))
        .await
        .unwrap();

    wait_until(|| store.get(EVENTS_KEY).unwrap() == Some("[]".to_string())).await;
    let mut pages: Vec<String> = collector
        .hits()
        .iter()
        .filter_map(|u| query(u).get("p").cloned())
        .collect();
    pages.sort();
    assert_eq!(pages, vec!["one".to_string(), "two".to_string()]);
}

#[tokio::test]
async fn missing_level_leaves_the_log_untouched() {
    let store = Arc::new(MemoryStore::new());
    let collector = FakeCollector::new(true);
    let tracker = tracker_with(&store, &collector);

    tracker
        .initialize(TrackerConfig::new("515773", "https://logs1252"))
        .await
        .unwrap();
    let before = store.get(EVENTS_KEY).unwrap();

    let result = tracker
        .track_page_view(PageViewParams {
            page: Some("x".to_string()),
            level: None,
        })
        .await;
    assert!(result.is_err());
    assert_eq!(store.get(EVENTS_KEY).unwrap(), before);
    assert!(collector.hits().is_empty());
}
