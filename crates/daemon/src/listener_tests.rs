use super::*;
use brummer_adapters::provider::MockProvider;
use brummer_core::CoderRequest;
use brummer_engine::{CoderManagerConfig, DiscoveryConfig, EventBus, InMemoryDataProvider, ProviderRegistry, PtyManagerConfig};
use brummer_core::id::UuidIdGen;
use tempfile::tempdir;

fn test_ctx() -> (ListenCtx, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let providers = Arc::new(ProviderRegistry::new());
    providers.register("mock", Arc::new(MockProvider::new())).unwrap();
    let event_bus = EventBus::new(Some(2));

    let coders = CoderManager::new(
        CoderManagerConfig {
            max_concurrent: 5,
            workspace_base_dir: dir.path().join("workspaces"),
            default_provider: "mock".to_string(),
        },
        providers,
        Arc::clone(&event_bus),
    );
    let pty = PtyManager::new(
        PtyManagerConfig::default(),
        Arc::clone(&event_bus),
        Arc::new(InMemoryDataProvider::new()),
        Arc::new(UuidIdGen),
    );
    let discovery = DiscoveryRegistry::new(DiscoveryConfig {
        directory: dir.path().join("instances"),
        ..DiscoveryConfig::default()
    });

    (ListenCtx { coders, pty, discovery }, dir)
}

#[tokio::test]
async fn ping_returns_pong() {
    let (ctx, _dir) = test_ctx();
    let response = dispatch(&ctx, Request::Ping).await;
    assert!(matches!(response, Response::Pong));
}

#[tokio::test]
async fn create_coder_then_get_round_trips() {
    let (ctx, _dir) = test_ctx();
    let request = CoderRequest {
        provider: None,
        name: "demo".to_string(),
        task: "write a test".to_string(),
        workspace_files: vec![],
    };

    let created = match dispatch(&ctx, Request::CreateCoder(request)).await {
        Response::Coder(coder) => coder,
        other => panic!("unexpected response: {other:?}"),
    };

    let fetched = dispatch(&ctx, Request::GetCoder(created.id.clone())).await;
    assert!(matches!(fetched, Response::Coder(coder) if coder.id == created.id));
}

#[tokio::test]
async fn get_unknown_coder_returns_error_response() {
    let (ctx, _dir) = test_ctx();
    let response = dispatch(&ctx, Request::GetCoder(brummer_core::CoderId::new("nope"))).await;
    assert!(matches!(response, Response::Error(_)));
}

#[tokio::test]
async fn list_instances_starts_empty() {
    let (ctx, _dir) = test_ctx();
    let response = dispatch(&ctx, Request::ListInstances).await;
    assert!(matches!(response, Response::Instances(instances) if instances.is_empty()));
}

#[tokio::test]
async fn create_pty_session_then_list_round_trips() {
    let (ctx, _dir) = test_ctx();
    let created = match dispatch(
        &ctx,
        Request::CreatePtySession {
            name: "shell".to_string(),
            command: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), "sleep 5".to_string()],
        },
    )
    .await
    {
        Response::PtySessionId(id) => id,
        other => panic!("unexpected response: {other:?}"),
    };

    let listed = dispatch(&ctx, Request::ListPtySessions).await;
    assert!(matches!(listed, Response::PtySessionIds(ids) if ids.contains(&created)));
}
