use std::sync::Arc;
use std::time::Duration;

use azdraft_canvas::CanvasConfig;
use azdraft_core::{ConnectionDraft, ResourceDraft, ResourceType};
use azdraft_ingest::{ChunkSource, IngestError, ReplaySource};
use azdraft_session::{
    AuthProvider, DirectorySink, LocalAuth, Provider, SessionController, SessionError, SessionRuntime,
    SimulatedDeployment, Step, TokioClock, TRANSPORT_ERROR_MESSAGE,
};

const PART_ONE: &str = r#"{"description":"Serverless API","architecture":{"resources":[{"id":"resource-1","name":"gateway","type":"apiManagement"},{"id":"resource-2","name":"handler","type":"function"}"#;
const PART_TWO: &str = r#",{"id":"resource-3","name":"orders","type":"cosmosDb"}],"connections":[{"id":"connection-1","source":"resource-1","target":"resource-2","type":"dataFlow"},{"id":"connection-2","source":"resource-2","target":"resource-3","type":"dependency"}]}}"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn runtime_with(source: impl ChunkSource + 'static) -> (SessionRuntime, Arc<LocalAuth>) {
    init_tracing();
    let auth = Arc::new(LocalAuth::in_memory());
    let controller = SessionController::new(auth.clone(), CanvasConfig::default());
    let runtime = SessionRuntime::new(
        controller,
        Arc::new(source),
        Arc::new(SimulatedDeployment::new(Duration::from_millis(2000))),
        Arc::new(TokioClock::new()),
    );
    (runtime, auth)
}

#[tokio::test(start_paused = true)]
async fn streamed_architecture_reaches_store_and_canvas() {
    let (mut runtime, _) = runtime_with(ReplaySource::new([PART_ONE, PART_TWO]));
    runtime.submit_prompt("serverless order api").unwrap();
    runtime.run_until_idle().await;

    let controller = runtime.controller();
    assert!(!controller.is_generating());
    assert_eq!(controller.description(), "Serverless API");
    assert_eq!(controller.store().resources().len(), 3);
    assert_eq!(controller.store().connections().len(), 2);

    let canvas = controller.canvas();
    assert_eq!(canvas.nodes().len(), 3);
    assert!(!canvas.is_animating());
    assert_eq!(canvas.edges().len(), 2);
    assert_eq!(canvas.edges()[1].style.fade_delay_ms, 100);
    assert_eq!(
        controller.sessions().get("default").unwrap().last_message,
        "serverless order api"
    );
}

#[tokio::test(start_paused = true)]
async fn open_failure_reports_and_leaves_store_empty() {
    let (mut runtime, _) = runtime_with(ReplaySource::failing(IngestError::Transport(
        "connection refused".into(),
    )));
    runtime.submit_prompt("anything").unwrap();
    runtime.wait_for_generation().await;

    let controller = runtime.controller();
    assert_eq!(controller.error(), Some(TRANSPORT_ERROR_MESSAGE));
    assert!(controller.store().is_empty());
    assert_eq!(runtime.step().await, Step::Idle);
}

#[tokio::test(start_paused = true)]
async fn session_switch_supersedes_running_stream() {
    let (mut runtime, _) = runtime_with(ReplaySource::new([PART_ONE, PART_TWO]));
    runtime.select_session("a");
    let first = runtime.submit_prompt("first").unwrap();

    runtime.select_session("b");
    runtime.select_session("a");
    assert_ne!(runtime.controller().current_token(), first);
    assert!(runtime.controller().store().is_empty());
    assert!(!runtime.controller().is_generating());

    // Whatever the aborted task managed to send is ignored by the next run.
    let second = runtime.submit_prompt("second").unwrap();
    while runtime.controller().is_generating() {
        if let Step::Ingest { applied: false } = runtime.step().await {
            assert_eq!(runtime.controller().current_token(), second);
        }
    }
    assert_eq!(runtime.controller().store().resources().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn manual_edits_reproject_immediately() {
    let (mut runtime, _) = runtime_with(ReplaySource::default());
    let (web, db) = runtime.edit(|c| {
        let web = c.add_resource(ResourceDraft::new("web", ResourceType::AppService));
        let db = c.add_resource(ResourceDraft::new("db", ResourceType::SqlDatabase));
        (web, db)
    });
    runtime
        .edit(|c| c.add_connection(ConnectionDraft::new(&web.id, &db.id, "dataFlow".into())))
        .unwrap();
    assert_eq!(runtime.controller().canvas().nodes().len(), 2);

    runtime.run_until_idle().await;
    assert_eq!(runtime.controller().canvas().edges().len(), 1);

    runtime.edit(|c| c.remove_resource(&web.id));
    let canvas = runtime.controller().canvas();
    assert_eq!(canvas.nodes().len(), 1);
    assert!(canvas.edges().is_empty());
    assert!(runtime.controller().store().connections().is_empty());
}

#[tokio::test(start_paused = true)]
async fn template_export_and_deploy() {
    let (mut runtime, auth) = runtime_with(ReplaySource::default());
    let dir = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(dir.path());

    assert!(matches!(
        runtime.export_template(&sink),
        Err(SessionError::NoTemplate)
    ));
    runtime.edit(|c| c.add_resource(ResourceDraft::new("store", ResourceType::StorageAccount)));
    runtime.edit(|c| c.generate_template().map(|_| ())).unwrap();

    let path = runtime.export_template(&sink).unwrap();
    assert!(path.ends_with("azure-deployment.json"));
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["contentVersion"], "1.0.0.0");
    assert_eq!(
        written["resources"][0]["type"],
        "Microsoft.Storage/storageAccounts"
    );

    let err = runtime.deploy_template().await.unwrap_err();
    assert_eq!(err.redirect(), Some("/auth/signin"));

    auth.sign_in(Provider::Google).unwrap();
    let receipt = runtime.deploy_template().await.unwrap();
    assert_eq!(receipt.target, "1 resources");
}

#[tokio::test(start_paused = true)]
async fn code_deploy_checks_resource_type() {
    let (mut runtime, auth) = runtime_with(ReplaySource::default());
    auth.sign_in(Provider::Microsoft).unwrap();
    let function = runtime.edit(|c| c.add_resource(ResourceDraft::new("fn", ResourceType::Function)));
    let vault = runtime.edit(|c| c.add_resource(ResourceDraft::new("kv", ResourceType::KeyVault)));

    assert!(runtime.deploy_code(&function.id).await.is_ok());
    assert!(runtime.download_code(&function.id).await.is_ok());
    assert!(matches!(
        runtime.deploy_code(&vault.id).await,
        Err(SessionError::Unsupported { .. })
    ));
}
