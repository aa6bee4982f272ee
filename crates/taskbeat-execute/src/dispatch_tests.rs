use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::DateTime;
use parking_lot::Mutex;
use serde_json::Value;

use taskbeat_core::TaskRegistry;
use taskbeat_protocols::error::{JobError, PublishError, RegistryError};
use taskbeat_protocols::options::ExecOptions;
use taskbeat_protocols::publisher::Publisher;
use taskbeat_protocols::result::TaskState;

use super::*;

struct AddJob;

#[async_trait]
impl Job for AddJob {
    fn name(&self) -> &str {
        "math.add"
    }

    fn exec_options(&self) -> ExecOptions {
        ExecOptions::default()
            .with_routing_key("math")
            .with_priority(1)
    }

    async fn run(&self, args: TaskArgs, _kwargs: TaskKwargs) -> Result<Value, JobError> {
        Ok(Value::from(args.iter().filter_map(Value::as_i64).sum::<i64>()))
    }
}

struct FailJob;

#[async_trait]
impl Job for FailJob {
    fn name(&self) -> &str {
        "always.fails"
    }

    async fn run(&self, _args: TaskArgs, _kwargs: TaskKwargs) -> Result<Value, JobError> {
        Err(JobError::Failed("nope".to_string()))
    }
}

/// Echoes the keyword arguments it was called with.
struct EchoKwargs;

#[async_trait]
impl Job for EchoKwargs {
    fn name(&self) -> &str {
        "echo.kwargs"
    }

    fn accepted_context(&self) -> &[&'static str] {
        &["task_id", "task_is_eager", "loglevel"]
    }

    async fn run(&self, _args: TaskArgs, kwargs: TaskKwargs) -> Result<Value, JobError> {
        Ok(Value::Object(kwargs))
    }
}

#[derive(Default)]
struct RecordingPublisher {
    sent: Mutex<Vec<TaskMessage>>,
    closed: AtomicBool,
    reject: bool,
}

impl RecordingPublisher {
    fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn delay_task(&self, message: TaskMessage) -> Result<String, PublishError> {
        if self.reject {
            return Err(PublishError::Rejected("queue full".to_string()));
        }
        let id = message.id.clone().unwrap_or_else(|| "published-id".to_string());
        self.sent.lock().push(message);
        Ok(id)
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeConnector {
    publisher: Arc<RecordingPublisher>,
    acquired: AtomicUsize,
    exchanges: Mutex<Vec<Option<String>>>,
}

impl FakeConnector {
    fn new(publisher: RecordingPublisher) -> Self {
        Self {
            publisher: Arc::new(publisher),
            acquired: AtomicUsize::new(0),
            exchanges: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn publisher(&self, exchange: Option<&str>) -> Result<Arc<dyn Publisher>, PublishError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.exchanges.lock().push(exchange.map(str::to_string));
        let publisher: Arc<dyn Publisher> = self.publisher.clone();
        Ok(publisher)
    }
}

fn setup(always_eager: bool, publisher: RecordingPublisher) -> (Dispatcher, Arc<FakeConnector>) {
    let registry = TaskRegistry::new();
    registry.register(Arc::new(AddJob)).unwrap();
    registry.register(Arc::new(FailJob)).unwrap();
    registry.register(Arc::new(EchoKwargs)).unwrap();

    let connector = Arc::new(FakeConnector::new(publisher));
    let dispatcher = Dispatcher::new(Arc::new(registry), connector.clone()).with_config(
        DispatcherConfig {
            always_eager,
            logfile: None,
            loglevel: Some("debug".to_string()),
        },
    );
    (dispatcher, connector)
}

#[tokio::test]
async fn test_always_eager_runs_inline() {
    let (dispatcher, connector) = setup(true, RecordingPublisher::default());

    let request = ApplyRequest::new().with_args(vec![Value::from(1), Value::from(2)]);
    let result = dispatcher.apply_async(Arc::new(AddJob), request).await.unwrap();

    let eager = result.as_eager().unwrap();
    assert_eq!(eager.status, TaskState::Success);
    assert_eq!(eager.result, Some(Value::from(3)));
    assert_eq!(connector.acquired.load(Ordering::SeqCst), 0);
    assert!(connector.publisher.sent.lock().is_empty());
}

#[tokio::test]
async fn test_apply_captures_failure() {
    let (dispatcher, _) = setup(false, RecordingPublisher::default());

    let result = dispatcher
        .apply(Arc::new(FailJob), TaskArgs::new(), TaskKwargs::new(), 0)
        .await;

    assert_eq!(result.status, TaskState::Failure);
    assert!(result.traceback.unwrap().contains("nope"));
}

#[tokio::test]
async fn test_apply_generates_fresh_ids() {
    let (dispatcher, _) = setup(false, RecordingPublisher::default());

    let first = dispatcher
        .apply(Arc::new(AddJob), TaskArgs::new(), TaskKwargs::new(), 0)
        .await;
    let second = dispatcher
        .apply(Arc::new(AddJob), TaskArgs::new(), TaskKwargs::new(), 0)
        .await;

    assert_ne!(first.task_id, second.task_id);
}

#[tokio::test]
async fn test_apply_injects_accepted_context() {
    let (dispatcher, _) = setup(false, RecordingPublisher::default());

    let result = dispatcher
        .apply(Arc::new(EchoKwargs), TaskArgs::new(), TaskKwargs::new(), 3)
        .await;

    let kwargs = result.result.unwrap();
    assert_eq!(kwargs["task_id"], Value::from(result.task_id.clone()));
    assert_eq!(kwargs["task_is_eager"], Value::Bool(true));
    assert_eq!(kwargs["loglevel"], Value::from("debug"));
    assert!(kwargs.get("task_retries").is_none());
}

#[tokio::test]
async fn test_countdown_becomes_eta() {
    let (dispatcher, connector) = setup(false, RecordingPublisher::default());

    let before = Utc::now();
    let request = ApplyRequest::new().with_countdown(Duration::from_secs(30));
    let result = dispatcher.apply_async(Arc::new(AddJob), request).await.unwrap();
    let after = Utc::now();

    assert!(!result.is_eager());
    assert_eq!(result.task_id(), "published-id");

    let sent = connector.publisher.sent.lock();
    let eta = sent[0].eta.unwrap();
    assert!(eta >= before + chrono::Duration::seconds(30));
    assert!(eta <= after + chrono::Duration::seconds(30));
}

#[tokio::test]
async fn test_countdown_past_latest_time_rejected() {
    let (dispatcher, connector) = setup(false, RecordingPublisher::default());

    // Fits a chrono duration but lands beyond the last representable date.
    let request = ApplyRequest::new().with_countdown(Duration::from_secs(10_000_000_000_000));
    let err = dispatcher
        .apply_async(Arc::new(AddJob), request)
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::InvalidCountdown(_)));
    assert_eq!(connector.acquired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_countdown_too_large_for_duration_rejected() {
    let (dispatcher, connector) = setup(false, RecordingPublisher::default());

    let request = ApplyRequest::new().with_countdown(Duration::MAX);
    let err = dispatcher
        .apply_async(Arc::new(AddJob), request)
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::InvalidCountdown(_)));
    assert!(connector.publisher.sent.lock().is_empty());
}

#[tokio::test]
async fn test_explicit_eta_passed_through() {
    let (dispatcher, connector) = setup(false, RecordingPublisher::default());

    let eta = DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let request = ApplyRequest::new().with_eta(eta);
    dispatcher.apply_async(Arc::new(AddJob), request).await.unwrap();

    assert_eq!(connector.publisher.sent.lock()[0].eta, Some(eta));
}

#[tokio::test]
async fn test_countdown_and_eta_conflict() {
    let (dispatcher, connector) = setup(false, RecordingPublisher::default());

    let request = ApplyRequest::new()
        .with_countdown(Duration::from_secs(5))
        .with_eta(Utc::now());
    let err = dispatcher
        .apply_async(Arc::new(AddJob), request)
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::ConflictingSchedule));
    assert_eq!(connector.acquired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unregistered_job() {
    let (dispatcher, _) = setup(false, RecordingPublisher::default());

    struct Stranger;

    #[async_trait]
    impl Job for Stranger {
        fn name(&self) -> &str {
            "not.registered"
        }

        async fn run(&self, _args: TaskArgs, _kwargs: TaskKwargs) -> Result<Value, JobError> {
            Ok(Value::Null)
        }
    }

    let err = dispatcher
        .apply_async(Arc::new(Stranger), ApplyRequest::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Registry(RegistryError::NotRegistered(_))
    ));
}

#[tokio::test]
async fn test_options_merged_and_exchange_requested() {
    let (dispatcher, connector) = setup(false, RecordingPublisher::default());

    let request = ApplyRequest::new()
        .with_task_id("fixed")
        .with_options(ExecOptions::default().with_priority(7).with_exchange("fanout"));
    let result = dispatcher.apply_async(Arc::new(AddJob), request).await.unwrap();

    assert_eq!(result.task_id(), "fixed");
    let sent = connector.publisher.sent.lock();
    assert_eq!(sent[0].options.routing_key.as_deref(), Some("math"));
    assert_eq!(sent[0].options.priority, Some(7));
    assert_eq!(
        connector.exchanges.lock()[0].as_deref(),
        Some("fanout")
    );
}

#[tokio::test]
async fn test_acquired_publisher_closed() {
    let (dispatcher, connector) = setup(false, RecordingPublisher::default());

    dispatcher
        .apply_async(Arc::new(AddJob), ApplyRequest::new())
        .await
        .unwrap();

    assert_eq!(connector.acquired.load(Ordering::SeqCst), 1);
    assert!(connector.publisher.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_acquired_publisher_closed_on_failure() {
    let (dispatcher, connector) = setup(false, RecordingPublisher::rejecting());

    let err = dispatcher
        .apply_async(Arc::new(AddJob), ApplyRequest::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Publish(PublishError::Rejected(_))));
    assert!(connector.publisher.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_supplied_publisher_left_open() {
    let (dispatcher, connector) = setup(false, RecordingPublisher::default());
    let own = Arc::new(RecordingPublisher::default());

    dispatcher
        .apply_async(Arc::new(AddJob), ApplyRequest::new().with_publisher(own.clone()))
        .await
        .unwrap();

    assert_eq!(own.sent.lock().len(), 1);
    assert!(!own.closed.load(Ordering::SeqCst));
    assert_eq!(connector.acquired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_delay_task_by_name() {
    let (dispatcher, connector) = setup(false, RecordingPublisher::default());

    dispatcher
        .delay_task("math.add", vec![Value::from(4)], TaskKwargs::new())
        .await
        .unwrap();

    let sent = connector.publisher.sent.lock();
    assert_eq!(sent[0].task, "math.add");
    assert_eq!(sent[0].args, vec![Value::from(4)]);
    assert!(sent[0].eta.is_none());
}

#[tokio::test]
async fn test_delay_task_unknown_name() {
    let (dispatcher, _) = setup(false, RecordingPublisher::default());

    let err = dispatcher
        .delay_task("missing", TaskArgs::new(), TaskKwargs::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("missing"));
}
