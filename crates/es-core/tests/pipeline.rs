//! End-to-end resolution through a widget

use es_core::prelude::*;
use es_core::{LedgerError, VisualStateKind};
use es_media::Placeholder;
use es_storage::{ResolverRegistry, StorageResolver};
use es_test_utils::{init_tracing, InMemoryLedger, LedgerKey, RecordingSink, ScriptedResolver};
use pretty_assertions::assert_eq;
use serde_json::json;

fn registry(resolvers: Vec<ScriptedResolver>) -> ResolverRegistry {
    resolvers.into_iter().fold(ResolverRegistry::new(), |registry, resolver| {
        let name = resolver.backend().to_string();
        registry.with(name, Arc::new(resolver))
    })
}

fn cat_resolver() -> ScriptedResolver {
    ScriptedResolver::absent("ipfs")
        .with_content("ipfs://Qm123", json!({"image": "ipfs://Qm456", "description": "cat"}))
}

fn widget(
    kind: WidgetKind,
    ledger: InMemoryLedger,
    resolvers: Vec<ScriptedResolver>,
) -> (MediaWidget, Arc<InMemoryLedger>, Arc<RecordingSink>) {
    init_tracing();
    let sink = RecordingSink::new();
    let (connection, ledger) = ledger.into_connection("statemine");
    let config = RenderConfig::new().with_resolvers(registry(resolvers));
    let widget = MediaWidget::new(kind, config, sink.clone()).with_default_connection(connection);
    (widget, ledger, sink)
}

#[tokio::test]
async fn item_renders_resolved_image() {
    let ledger = InMemoryLedger::new().with_item(11, 1, "ipfs://Qm123");
    let (widget, ledger, sink) = widget(WidgetKind::Item, ledger, vec![cat_resolver()]);

    assert!(widget.set_collection(Some(11)).is_none());
    let report = widget.set_item(Some(1)).unwrap().settle().await.unwrap().unwrap();

    assert!(report.applied);
    assert_eq!(ledger.calls(), vec![LedgerKey::item(11, 1)]);

    let state = widget.state();
    let image = state.image().unwrap();
    assert_eq!(image.src, "https://gateway.pinata.cloud/ipfs/Qm456");
    assert_eq!(image.alt.as_deref(), Some("cat"));
    assert_eq!(
        sink.history(),
        vec![
            RenderNode::Cleared,
            RenderNode::Placeholder(Placeholder::Loading),
            RenderNode::Image(image.clone()),
        ]
    );
}

#[tokio::test]
async fn collection_renders_resolved_image() {
    let ledger = InMemoryLedger::new().with_collection(11, "ipfs://Qm123");
    let (widget, _ledger, sink) = widget(WidgetKind::Collection, ledger, vec![cat_resolver()]);

    widget.set_collection(Some(11)).unwrap().settle().await.unwrap();

    assert_eq!(widget.state().kind(), VisualStateKind::Rendered);
    assert_eq!(sink.last_src().as_deref(), Some("https://gateway.pinata.cloud/ipfs/Qm456"));
}

#[tokio::test]
async fn missing_record_is_no_metadata() {
    let (widget, ledger, sink) = widget(WidgetKind::Collection, InMemoryLedger::new(), vec![cat_resolver()]);

    widget.set_collection(Some(999)).unwrap().settle().await.unwrap();

    assert_eq!(ledger.calls(), vec![LedgerKey::collection(999)]);
    assert_eq!(widget.state(), VisualState::NoMetadata);
    assert_eq!(sink.last(), Some(RenderNode::Placeholder(Placeholder::NoMetadata)));
}

#[tokio::test]
async fn ledger_failure_is_no_metadata() {
    let ledger = InMemoryLedger::new()
        .with_collection(4, "ipfs://Qm123")
        .with_failure(LedgerKey::collection(4), LedgerError::Query("storage proof".into()));
    let (widget, _ledger, _sink) = widget(WidgetKind::Collection, ledger, vec![cat_resolver()]);

    widget.set_collection(Some(4)).unwrap().settle().await.unwrap();

    assert_eq!(widget.state(), VisualState::NoMetadata);
}

#[tokio::test]
async fn every_backend_absent_is_no_content() {
    let primary = ScriptedResolver::absent("primary");
    let fallback = ScriptedResolver::absent("fallback");
    let (primary_calls, fallback_calls) = (primary.call_log(), fallback.call_log());
    let ledger = InMemoryLedger::new().with_collection(11, "ipfs://Qm123");
    let (widget, _ledger, sink) = widget(WidgetKind::Collection, ledger, vec![primary, fallback]);

    widget.set_collection(Some(11)).unwrap().settle().await.unwrap();

    assert_eq!(widget.state(), VisualState::NoContent);
    assert_eq!(sink.last(), Some(RenderNode::Placeholder(Placeholder::NoContent)));
    assert_eq!(*primary_calls.lock(), vec!["ipfs://Qm123".to_string()]);
    assert_eq!(*fallback_calls.lock(), vec!["ipfs://Qm123".to_string()]);
}

#[tokio::test]
async fn falls_back_to_later_backend() {
    let primary = ScriptedResolver::absent("primary");
    let fallback = ScriptedResolver::absent("fallback")
        .with_content("ipfs://Qm123", json!({"media": {"uri": "ipfs://QmFallback"}}));
    let ledger = InMemoryLedger::new().with_collection(11, "ipfs://Qm123");
    let (widget, _ledger, sink) = widget(WidgetKind::Collection, ledger, vec![primary, fallback]);

    widget.set_collection(Some(11)).unwrap().settle().await.unwrap();

    assert_eq!(sink.last_src().as_deref(), Some("https://gateway.pinata.cloud/ipfs/QmFallback"));
}

#[tokio::test]
async fn video_is_unsupported_and_not_rendered() {
    let resolver = ScriptedResolver::absent("ipfs").with_content(
        "ipfs://Qm123",
        json!({"media": {"uri": "ipfs://QmVid", "mimeType": "video/mp4"}}),
    );
    let ledger = InMemoryLedger::new().with_collection(11, "ipfs://Qm123");
    let (widget, _ledger, sink) = widget(WidgetKind::Collection, ledger, vec![resolver]);

    widget.set_collection(Some(11)).unwrap().settle().await.unwrap();

    assert_eq!(widget.state(), VisualState::UnsupportedMedia);
    assert!(sink.history().iter().all(|node| node.as_image().is_none()));
    assert_eq!(sink.last(), Some(RenderNode::Placeholder(Placeholder::Loading)));
}

#[tokio::test]
async fn incomplete_configuration_issues_no_lookup() {
    let ledger = InMemoryLedger::new().with_collection(11, "ipfs://Qm123");
    let (widget, ledger, sink) = widget(WidgetKind::Item, ledger, vec![cat_resolver()]);

    for value in ["0", "-4", "abc", ""] {
        assert!(widget.set_attribute("collection", Some(value)).is_none());
        assert_eq!(widget.state(), VisualState::EmptyConfiguration);
    }
    assert!(widget.set_collection(Some(11)).is_none());

    assert!(ledger.calls().is_empty());
    assert_eq!(sink.last(), Some(RenderNode::Cleared));
}

#[tokio::test]
async fn refresh_is_idempotent() {
    let ledger = InMemoryLedger::new().with_collection(11, "ipfs://Qm123");
    let (widget, ledger, _sink) = widget(WidgetKind::Collection, ledger, vec![cat_resolver()]);

    widget.set_collection(Some(11)).unwrap().settle().await.unwrap();
    let first = widget.state();
    widget.refresh().unwrap().settle().await.unwrap();

    assert_eq!(widget.state(), first);
    assert_eq!(ledger.calls().len(), 2);
}

#[tokio::test]
async fn new_connection_triggers_run() {
    let ledger = InMemoryLedger::new();
    let (widget, _ledger, _sink) = widget(WidgetKind::Collection, ledger, vec![cat_resolver()]);
    widget.set_collection(Some(11)).unwrap().settle().await.unwrap();
    assert_eq!(widget.state(), VisualState::NoMetadata);

    let (connection, _) = InMemoryLedger::new()
        .with_collection(11, "ipfs://Qm123")
        .into_connection("statemint");
    let report = widget.set_connection(Some(connection.clone())).unwrap().settle().await.unwrap();

    assert!(report.is_some());
    assert_eq!(widget.state().kind(), VisualStateKind::Rendered);
    assert!(widget.set_connection(Some(connection)).is_none());
}
