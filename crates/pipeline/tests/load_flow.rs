//! End-to-end load pipeline scenarios: fetch → normalize → filters →
//! merge worker → lane scheduling → renderer handoff, including
//! supersession mid-flight.

use async_trait::async_trait;
use danmaku_pipeline::{
    CommentSource, ContainerGeometry, DanmakuPipeline, LoadOutcome, RenderSink,
};
use danmaku_protocol::{Comment, RawComment, Settings};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

fn raw(id: u32, time: f64, text: &str) -> RawComment {
    RawComment {
        id: id.to_string(),
        params: format!("{time},1,16777215,user{id}"),
        text: text.to_string(),
    }
}

fn geometry() -> ContainerGeometry {
    ContainerGeometry {
        width: 1280.0,
        height: 720.0,
    }
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct StaticSource {
    raw: Vec<RawComment>,
}

#[async_trait]
impl CommentSource for StaticSource {
    async fn fetch_raw(&self, _media_reference: &str) -> anyhow::Result<Vec<RawComment>> {
        Ok(self.raw.clone())
    }
}

/// Blocks fetches for the "slow" reference until released; everything
/// else resolves immediately.
struct TwoSpeedSource {
    gate: Arc<Notify>,
}

#[async_trait]
impl CommentSource for TwoSpeedSource {
    async fn fetch_raw(&self, media_reference: &str) -> anyhow::Result<Vec<RawComment>> {
        if media_reference == "slow" {
            self.gate.notified().await;
            Ok(vec![raw(1, 0.0, "stale episode comment")])
        } else {
            Ok(vec![raw(2, 0.0, "fresh episode comment")])
        }
    }
}

#[derive(Default)]
struct RecordingSink {
    handoffs: Mutex<Vec<Vec<Comment>>>,
}

impl RenderSink for RecordingSink {
    fn handoff(&self, comments: Vec<Comment>) {
        self.handoffs.lock().unwrap().push(comments);
    }
}

impl RecordingSink {
    fn snapshot(&self) -> Vec<Vec<Comment>> {
        self.handoffs.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn test_scenario_merge_and_deliver() {
    init_logs();
    // Three comments, two near-identical: the survivor carries " [x2]".
    let source = Arc::new(StaticSource {
        raw: vec![raw(1, 0.0, "hi"), raw(2, 0.1, "hi"), raw(3, 10.0, "bye")],
    });
    let sink = Arc::new(RecordingSink::default());
    let settings = Settings {
        merge_enabled: true,
        merge_threshold: 80,
        merge_time_window_seconds: 5.0,
        auto_filter_enabled: false,
        ..Default::default()
    };
    let pipeline = DanmakuPipeline::new(source, sink.clone(), settings);

    let outcome = pipeline.load("ep1", geometry()).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Delivered(2));

    let handoffs = sink.snapshot();
    assert_eq!(handoffs.len(), 1);
    let delivered = &handoffs[0];
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].text, "hi [x2]");
    assert_eq!(delivered[0].merged_count, Some(2));
    assert_eq!(delivered[1].text, "bye");
}

#[tokio::test]
async fn test_scenario_keyword_blocklist() {
    let source = Arc::new(StaticSource {
        raw: vec![
            raw(1, 0.0, "buy spam today"),
            raw(2, 1.0, "regular comment"),
            raw(3, 2.0, "more spam here"),
        ],
    });
    let sink = Arc::new(RecordingSink::default());
    let settings = Settings {
        keyword_blocklist: "spam".to_string(),
        auto_filter_enabled: false,
        ..Default::default()
    };
    let pipeline = DanmakuPipeline::new(source, sink.clone(), settings);

    let outcome = pipeline.load("ep1", geometry()).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Delivered(1));
    assert_eq!(sink.snapshot()[0][0].text, "regular comment");
}

#[tokio::test]
async fn test_everything_filtered_is_no_comments_not_error() {
    let source = Arc::new(StaticSource {
        raw: vec![raw(1, 0.0, "spam"), raw(2, 1.0, "spam")],
    });
    let sink = Arc::new(RecordingSink::default());
    let settings = Settings {
        keyword_blocklist: "spam".to_string(),
        auto_filter_enabled: false,
        ..Default::default()
    };
    let pipeline = DanmakuPipeline::new(source, sink.clone(), settings);

    let outcome = pipeline.load("ep1", geometry()).await.unwrap();
    assert_eq!(outcome, LoadOutcome::NoComments);
    assert!(sink.snapshot().is_empty());
}

#[tokio::test]
async fn test_superseded_load_never_reaches_renderer() {
    init_logs();
    // The slow load is overtaken while its fetch is still outstanding; by
    // the time it resumes, its token is stale and the sink must only ever
    // see the fresh episode's comments.
    let gate = Arc::new(Notify::new());
    let source = Arc::new(TwoSpeedSource { gate: gate.clone() });
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Arc::new(DanmakuPipeline::new(
        source,
        sink.clone(),
        Settings::default(),
    ));

    let slow = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.load("slow", geometry()).await })
    };
    // Let the slow load mint its token and park in fetch.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let fast = pipeline.load("fast", geometry()).await.unwrap();
    assert_eq!(fast, LoadOutcome::Delivered(1));

    gate.notify_one();
    let slow = slow.await.unwrap().unwrap();
    assert_eq!(slow, LoadOutcome::Superseded);

    let handoffs = sink.snapshot();
    assert_eq!(handoffs.len(), 1);
    assert_eq!(handoffs[0][0].text, "fresh episode comment");
}

#[tokio::test]
async fn test_auto_filter_engages_and_stop_restores_once() {
    let source = Arc::new(StaticSource {
        raw: vec![
            raw(1, 0.0, "one"),
            raw(2, 1.0, "two"),
            raw(3, 2.0, "three"),
        ],
    });
    let sink = Arc::new(RecordingSink::default());
    let settings = Settings {
        auto_filter_threshold: 2,
        ..Default::default()
    };
    let pipeline = DanmakuPipeline::new(source, sink, settings);

    assert_eq!(
        pipeline.get_option("merge_enabled"),
        Some(serde_json::Value::Bool(false))
    );
    pipeline.load("ep1", geometry()).await.unwrap();

    // Three comments over a threshold of two: the override is live.
    assert_eq!(
        pipeline.get_option("merge_enabled"),
        Some(serde_json::Value::Bool(true))
    );
    assert_eq!(
        pipeline.get_option("block_bottom"),
        Some(serde_json::Value::Bool(true))
    );

    pipeline.stop();
    assert_eq!(
        pipeline.get_option("merge_enabled"),
        Some(serde_json::Value::Bool(false))
    );
    assert_eq!(
        pipeline.get_option("block_bottom"),
        Some(serde_json::Value::Bool(false))
    );

    // A second stop is a no-op, not a second restore.
    pipeline.stop();
    assert_eq!(
        pipeline.get_option("merge_enabled"),
        Some(serde_json::Value::Bool(false))
    );
}

#[tokio::test]
async fn test_set_option_feeds_next_load() {
    let source = Arc::new(StaticSource {
        raw: vec![raw(1, 5.0, "shifted")],
    });
    let sink = Arc::new(RecordingSink::default());
    let pipeline = DanmakuPipeline::new(
        source,
        sink.clone(),
        Settings {
            auto_filter_enabled: false,
            ..Default::default()
        },
    );

    pipeline
        .set_option("time_offset_seconds", serde_json::json!(-2.0))
        .unwrap();
    pipeline.load("ep1", geometry()).await.unwrap();
    assert_eq!(sink.snapshot()[0][0].time_seconds, 3.0);
}
