//! End-to-end task delivery over the in-memory transport: producer to
//! consumer to handler, with the delivery guarantees the queue promises.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use storefront_core::messaging::{
    ConsumerConfig, ConsumerState, HandlerRegistry, InMemoryTransport, NotificationHandler,
    QueuedMessage, TaskConsumer, TaskEnvelope, TaskError, TaskHandler, TaskProducer,
    TransportManager, TransportProvider,
};

const QUEUE: &str = "email_queue";

fn manager() -> Arc<TransportManager> {
    Arc::new(TransportManager::with_provider(TransportProvider::InMemory(
        InMemoryTransport::new(),
    )))
}

fn consumer_config() -> ConsumerConfig {
    ConsumerConfig {
        queue_name: QUEUE.to_string(),
        prefetch: 1,
        poll_interval: Duration::from_millis(10),
        visibility_timeout: Duration::from_secs(30),
        handler_timeout: Duration::from_secs(5),
        retry_backoff: Duration::from_millis(5),
        retry_backoff_cap: Duration::from_millis(20),
    }
}

async fn wait_for_depth(transport: &TransportProvider, queue: &str, expected: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let stats = transport.queue_stats(queue).await.unwrap();
            if stats.message_count == expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("queue did not reach expected depth in time");
}

async fn wait_for_calls(calls: &AtomicUsize, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while calls.load(Ordering::SeqCst) != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("handler call count not reached in time");
}

async fn wait_for_state(consumer: &TaskConsumer, expected: ConsumerState) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while consumer.state().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("consumer state not reached in time");
}

/// Records every payload it sees
struct RecordingHandler {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TaskHandler for RecordingHandler {
    fn kind(&self) -> &'static str {
        "notify"
    }

    async fn handle(&self, payload: &Value) -> Result<(), TaskError> {
        payload
            .get("to")
            .and_then(Value::as_str)
            .ok_or_else(|| TaskError::Malformed("missing 'to'".to_string()))?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn notify_task_flows_from_producer_to_ack() {
    let manager = manager();
    let producer = TaskProducer::new(Arc::clone(&manager), 3);
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = HandlerRegistry::new().register(RecordingHandler {
        calls: Arc::clone(&calls),
    });
    let consumer = Arc::new(TaskConsumer::new(
        Arc::clone(&manager),
        registry,
        consumer_config(),
    ));

    producer
        .publish(QUEUE, "notify", json!({"to": "user@example.com"}))
        .await
        .unwrap();

    let runner = Arc::clone(&consumer);
    let handle = tokio::spawn(async move { runner.run().await });

    let transport = manager.transport().await.unwrap();
    wait_for_depth(&transport, QUEUE, 0).await;

    consumer.stop(Duration::from_secs(2)).await.unwrap();
    handle.await.unwrap().unwrap();

    // Exactly one dispatch, queue drained, nothing dead-lettered
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        transport
            .queue_stats("email_queue_dlq")
            .await
            .unwrap()
            .message_count,
        0
    );
    assert_eq!(consumer.state().await, ConsumerState::Stopped);
}

#[tokio::test]
async fn persistent_tasks_survive_broker_restart() {
    let manager = manager();
    let producer = TaskProducer::new(Arc::clone(&manager), 3);

    producer
        .publish(QUEUE, "notify", json!({"to": "user@example.com"}))
        .await
        .unwrap();

    // Broker restarts before any consumer sees the task
    let transport = manager.transport().await.unwrap();
    if let TransportProvider::InMemory(t) = transport.as_ref() {
        t.simulate_restart().await;
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let registry = HandlerRegistry::new().register(RecordingHandler {
        calls: Arc::clone(&calls),
    });
    let consumer = Arc::new(TaskConsumer::new(
        Arc::clone(&manager),
        registry,
        consumer_config(),
    ));

    let runner = Arc::clone(&consumer);
    let handle = tokio::spawn(async move { runner.run().await });

    wait_for_calls(&calls, 1).await;

    consumer.stop(Duration::from_secs(2)).await.unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn envelope_payload_round_trips_through_the_queue() {
    let manager = manager();
    let producer = TaskProducer::new(Arc::clone(&manager), 3);

    let payload = json!({
        "to": "user@example.com",
        "template": "order_shipped",
        "items": [{"sku": "W-1", "qty": 2}, {"sku": "W-2", "qty": 1}],
        "total_cents": 4998,
    });
    producer.publish(QUEUE, "notify", payload.clone()).await.unwrap();

    let transport = manager.transport().await.unwrap();
    let received: Vec<QueuedMessage<TaskEnvelope>> = transport
        .receive_messages(QUEUE, 1, Duration::from_secs(30))
        .await
        .unwrap();

    assert_eq!(received.len(), 1);
    assert_eq!(received[0].message.kind, "notify");
    assert_eq!(received[0].message.payload, payload);
}

#[tokio::test]
async fn failed_task_is_redelivered_then_dead_lettered() {
    struct AlwaysFails;

    #[async_trait]
    impl TaskHandler for AlwaysFails {
        fn kind(&self) -> &'static str {
            "notify"
        }

        async fn handle(&self, _payload: &Value) -> Result<(), TaskError> {
            Err(TaskError::Failed("smtp unreachable".to_string()))
        }
    }

    let manager = manager();
    let producer = TaskProducer::new(Arc::clone(&manager), 3);
    let registry = HandlerRegistry::new().register(AlwaysFails);
    let consumer = Arc::new(TaskConsumer::new(
        Arc::clone(&manager),
        registry,
        consumer_config(),
    ));

    producer
        .publish(QUEUE, "notify", json!({"to": "user@example.com"}))
        .await
        .unwrap();

    let runner = Arc::clone(&consumer);
    let handle = tokio::spawn(async move { runner.run().await });

    let transport = manager.transport().await.unwrap();
    wait_for_depth(&transport, "email_queue_dlq", 1).await;

    consumer.stop(Duration::from_secs(2)).await.unwrap();
    handle.await.unwrap().unwrap();

    // Main queue fully drained; the dead-lettered envelope records the attempts
    assert_eq!(transport.queue_stats(QUEUE).await.unwrap().message_count, 0);
    let dead: Vec<QueuedMessage<TaskEnvelope>> = transport
        .receive_messages("email_queue_dlq", 1, Duration::from_secs(30))
        .await
        .unwrap();
    assert_eq!(dead[0].message.metadata.retry_count, 2);
    assert_eq!(dead[0].message.metadata.max_retries, 3);
}

#[tokio::test]
async fn consumer_drains_in_flight_work_on_stop() {
    struct SlowButFinite;

    #[async_trait]
    impl TaskHandler for SlowButFinite {
        fn kind(&self) -> &'static str {
            "notify"
        }

        async fn handle(&self, _payload: &Value) -> Result<(), TaskError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        }
    }

    let manager = manager();
    let producer = TaskProducer::new(Arc::clone(&manager), 3);
    let registry = HandlerRegistry::new().register(SlowButFinite);
    let consumer = Arc::new(TaskConsumer::new(
        Arc::clone(&manager),
        registry,
        consumer_config(),
    ));

    producer
        .publish(QUEUE, "notify", json!({"to": "user@example.com"}))
        .await
        .unwrap();

    let runner = Arc::clone(&consumer);
    let handle = tokio::spawn(async move { runner.run().await });

    // Let the consumer claim the delivery, then stop mid-flight
    wait_for_state(&consumer, ConsumerState::Consuming).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    consumer.stop(Duration::from_secs(2)).await.unwrap();
    handle.await.unwrap().unwrap();

    // The in-flight delivery completed and was acked before the loop exited
    let transport = manager.transport().await.unwrap();
    assert_eq!(transport.queue_stats(QUEUE).await.unwrap().message_count, 0);
    assert_eq!(consumer.state().await, ConsumerState::Stopped);
}

#[tokio::test]
async fn publish_requires_initialized_transport() {
    use storefront_core::config::BrokerConfig;
    use storefront_core::messaging::MessagingError;

    let manager = Arc::new(TransportManager::new(BrokerConfig::default()));
    let producer = TaskProducer::new(manager, 3);

    let result = producer
        .publish(QUEUE, "notify", json!({"to": "user@example.com"}))
        .await;

    assert!(matches!(
        result,
        Err(MessagingError::NotInitialized { .. })
    ));
}

#[tokio::test]
async fn notification_handler_accepts_spec_payload() {
    let handler = NotificationHandler::new();
    handler
        .handle(&json!({"to": "user@example.com"}))
        .await
        .unwrap();
}
