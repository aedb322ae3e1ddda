//! Integration tests for the delivery engine against a live HTTP target

use hookrelay::*;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Engine {
    pool: WorkerPool,
    dispatcher: Dispatcher,
}

async fn start_engine(config: DeliveryConfig) -> Engine {
    let scheduler = Arc::new(RetryScheduler::new(config.backoff.clone()));
    let transport = Arc::new(HttpTransport::new(&config).unwrap());
    let executor = Arc::new(AttemptExecutor::new(transport, config.clone()));

    let mut pool = WorkerPool::new(scheduler.clone(), executor, config.clone());
    pool.start().await.unwrap();

    let dispatcher = Dispatcher::new(scheduler, WebhookRegistry::new(), config);
    Engine { pool, dispatcher }
}

fn fast_config() -> DeliveryConfig {
    DeliveryConfig::builder()
        .concurrency(4)
        .poll_interval(Duration::from_millis(20))
        .backoff_base(Duration::from_millis(50))
        .attempt_timeout(Duration::from_secs(2))
        .build()
}

async fn wait_terminal(dispatcher: &Dispatcher, id: TaskId, deadline: Duration) -> DeliveryTask {
    let give_up = Instant::now() + deadline;
    loop {
        let task = dispatcher.task(id).unwrap();
        if task.state.is_terminal() {
            return task;
        }
        assert!(
            Instant::now() < give_up,
            "task stuck in {:?} after {} attempts",
            task.state,
            task.attempt_count
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn delivers_on_first_attempt_when_target_returns_200() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("X-Api-Key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = start_engine(fast_config()).await;
    let headers = HashMap::from([("X-Api-Key".to_string(), "secret".to_string())]);

    let id = engine
        .dispatcher
        .submit(&format!("{}/hook", server.uri()), headers, b"{}".to_vec())
        .unwrap();

    let task = wait_terminal(&engine.dispatcher, id, Duration::from_secs(5)).await;
    assert_eq!(task.state, TaskState::Succeeded);
    assert_eq!(task.attempt_count, 1);
    assert_eq!(task.last_status_code, Some(200));
    assert_eq!(task.last_response_body.as_deref(), Some("ok"));

    engine.pool.stop().await.unwrap();
}

#[tokio::test]
async fn fails_after_max_attempts_when_target_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let base = Duration::from_millis(150);
    let config = DeliveryConfig::builder()
        .concurrency(2)
        .poll_interval(Duration::from_millis(20))
        .backoff_base(base)
        .attempt_timeout(Duration::from_millis(100))
        .max_attempts(3)
        .build();
    let mut engine = start_engine(config).await;

    let started = Instant::now();
    let id = engine
        .dispatcher
        .submit(
            &format!("{}/hook", server.uri()),
            HashMap::new(),
            b"{}".to_vec(),
        )
        .unwrap();

    let task = wait_terminal(&engine.dispatcher, id, Duration::from_secs(10)).await;
    assert_eq!(task.state, TaskState::Failed);
    assert_eq!(task.attempt_count, 3);
    assert!(task.last_error.is_some());

    // Attempts are spaced by base*1 then base*2
    let elapsed = started.elapsed();
    assert!(
        elapsed >= base * 3,
        "attempts not spaced by backoff: {:?}",
        elapsed
    );

    assert_eq!(server.received_requests().await.unwrap().len(), 3);

    engine.pool.stop().await.unwrap();
}

#[tokio::test]
async fn recovers_when_target_stops_returning_500() {
    let server = MockServer::start().await;
    // First two attempts see a 500, then the endpoint recovers
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = DeliveryConfig::builder()
        .concurrency(2)
        .poll_interval(Duration::from_millis(20))
        .backoff_base(Duration::from_millis(50))
        .max_attempts(5)
        .build();
    let mut engine = start_engine(config).await;

    let id = engine
        .dispatcher
        .submit(
            &format!("{}/hook", server.uri()),
            HashMap::new(),
            b"{}".to_vec(),
        )
        .unwrap();

    let task = wait_terminal(&engine.dispatcher, id, Duration::from_secs(10)).await;
    assert_eq!(task.state, TaskState::Succeeded);
    assert_eq!(task.attempt_count, 3);

    engine.pool.stop().await.unwrap();
}

#[tokio::test]
async fn independent_tasks_deliver_concurrently() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(100)))
        .mount(&server)
        .await;

    let mut engine = start_engine(fast_config()).await;

    let started = Instant::now();
    let ids: Vec<TaskId> = (0..4)
        .map(|i| {
            engine
                .dispatcher
                .submit(
                    &format!("{}/hook/{}", server.uri(), i),
                    HashMap::new(),
                    b"{}".to_vec(),
                )
                .unwrap()
        })
        .collect();

    for id in &ids {
        let task = wait_terminal(&engine.dispatcher, *id, Duration::from_secs(5)).await;
        assert_eq!(task.state, TaskState::Succeeded);
    }

    // Four 100ms targets across four workers finish well under the
    // ~400ms a serial pool would need
    assert!(started.elapsed() < Duration::from_millis(350));

    engine.pool.stop().await.unwrap();
}

#[tokio::test]
async fn event_fan_out_reaches_every_subscriber() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alpha"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/beta"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = start_engine(fast_config()).await;
    engine.dispatcher.registry().create(
        WebhookRecord::new("acme", format!("{}/alpha", server.uri()))
            .with_events(vec!["order.created"]),
    );
    engine.dispatcher.registry().create(
        WebhookRecord::new("acme", format!("{}/beta", server.uri()))
            .with_events(vec!["order.created"]),
    );
    engine.dispatcher.registry().create(
        WebhookRecord::new("acme", format!("{}/gamma", server.uri()))
            .with_events(vec!["user.created"]),
    );

    let ids = engine
        .dispatcher
        .dispatch_event("order.created", json!({"order_id": 42}))
        .unwrap();
    assert_eq!(ids.len(), 2);

    for id in &ids {
        let task = wait_terminal(&engine.dispatcher, *id, Duration::from_secs(5)).await;
        assert_eq!(task.state, TaskState::Succeeded);
    }

    // Both subscribers saw the same event envelope
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in requests {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["event"], "order.created");
        assert_eq!(body["data"]["order_id"], 42);
    }

    engine.pool.stop().await.unwrap();
}

#[tokio::test]
async fn admission_validation_is_synchronous() {
    let mut engine = start_engine(fast_config()).await;

    assert!(matches!(
        engine
            .dispatcher
            .submit("not a url", HashMap::new(), b"{}".to_vec()),
        Err(DeliveryError::InvalidTarget(_))
    ));
    assert!(matches!(
        engine
            .dispatcher
            .submit("https://example.com/hook", HashMap::new(), Vec::new()),
        Err(DeliveryError::EmptyPayload)
    ));

    engine.pool.stop().await.unwrap();
}

#[tokio::test]
async fn pool_lifecycle() {
    let mut engine = start_engine(fast_config()).await;
    assert!(engine.pool.is_running().await);

    assert!(matches!(
        engine.pool.start().await,
        Err(DeliveryError::WorkerAlreadyRunning)
    ));

    engine.pool.stop().await.unwrap();
    assert!(!engine.pool.is_running().await);
}
