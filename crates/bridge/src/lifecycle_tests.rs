// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use orb_delegate::MemoryDelegate;
use orb_wire::{CorrelationId, RequestEnvelope, WorkerMessage};
use serde_json::{json, Value};
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;

use super::*;
use crate::error::BridgeError;
use crate::transport::{port, DriverPort};

struct Running {
    driver: DriverPort,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<ShutdownReason, LifecycleError>>,
    phase: watch::Receiver<Phase>,
}

fn bridge() -> Bridge {
    Bridge::new(Arc::new(MemoryDelegate::new()))
}

fn start(bridge: Bridge) -> Running {
    let (transport, driver) = port::pair();
    let (stop, stopped) = oneshot::channel::<()>();
    let phase = bridge.phase();
    let handle = tokio::spawn(bridge.serve(transport, async move {
        let _ = stopped.await;
        ShutdownReason::Signal("SIGTERM")
    }));
    Running { driver, stop, handle, phase }
}

fn send(driver: &DriverPort, id: u64, method: &str, params: Value) {
    assert!(driver.request(&RequestEnvelope::new(id, method).with_params(params)));
}

async fn next(driver: &mut DriverPort) -> WorkerMessage {
    match driver.recv().await {
        Some(message) => message,
        None => panic!("bridge closed the port"),
    }
}

async fn response(driver: &mut DriverPort) -> ResponseEnvelope {
    loop {
        if let WorkerMessage::Response(response) = next(driver).await {
            return response;
        }
    }
}

#[tokio::test]
async fn readiness_is_the_first_message() {
    let mut running = start(bridge());
    let first = next(&mut running.driver).await;
    assert_eq!(serde_json::to_value(&first).unwrap(), json!({"id": 0, "result": {"ready": true}}));

    running.driver.close();
    let reason = running.handle.await.unwrap().unwrap();
    assert_eq!(reason, ShutdownReason::EndOfInput(EndOfInput::PortClosed));
    assert_eq!(*running.phase.borrow(), Phase::Terminated);
}

#[tokio::test]
async fn readiness_can_be_suppressed() {
    let config = BridgeConfig { announce_ready: false, ..BridgeConfig::default() };
    let mut running = start(bridge().with_config(config));
    send(&running.driver, 1, "ready", Value::Null);
    let response = response(&mut running.driver).await;
    assert_eq!(response.id, CorrelationId::from(1u64));
}

#[tokio::test]
async fn phases_advance_on_first_request() {
    let mut running = start(bridge());
    next(&mut running.driver).await;
    assert_eq!(*running.phase.borrow(), Phase::Ready);

    send(&running.driver, 1, "ready", Value::Null);
    response(&mut running.driver).await;
    assert_eq!(*running.phase.borrow(), Phase::Active);

    running.stop.send(()).unwrap();
    let reason = running.handle.await.unwrap().unwrap();
    assert_eq!(reason, ShutdownReason::Signal("SIGTERM"));
    assert_eq!(*running.phase.borrow(), Phase::Terminated);
}

#[tokio::test]
async fn responses_follow_completion_order() {
    let gate = Arc::new(Notify::new());
    let slow_gate = Arc::clone(&gate);
    let bridge = bridge().register("slow", move |_ctx: Arc<Context>, _params: Value| {
        let gate = Arc::clone(&slow_gate);
        async move {
            gate.notified().await;
            Ok::<_, BridgeError>(json!("slow"))
        }
    });
    let mut running = start(bridge);
    next(&mut running.driver).await;

    send(&running.driver, 1, "slow", Value::Null);
    send(&running.driver, 2, "ready", Value::Null);
    assert_eq!(response(&mut running.driver).await.id, CorrelationId::from(2u64));

    gate.notify_one();
    let slow = response(&mut running.driver).await;
    assert_eq!(slow.id, CorrelationId::from(1u64));
    assert_eq!(slow.result(), Some(&json!("slow")));
}

#[tokio::test]
async fn statement_logs_precede_their_response() {
    let mut running = start(bridge());
    next(&mut running.driver).await;

    // Requests run concurrently; wait for each before issuing the next.
    send(&running.driver, 1, "connect", json!({"config": {"logging": true}}));
    assert_eq!(response(&mut running.driver).await.id, CorrelationId::from(1u64));
    send(
        &running.driver,
        2,
        "defineModel",
        json!({"name": "User", "attributes": {"name": {"type": "STRING"}}}),
    );
    assert_eq!(response(&mut running.driver).await.id, CorrelationId::from(2u64));

    send(&running.driver, 3, "findAll", json!({"model": "User"}));
    let mut logged = false;
    loop {
        match next(&mut running.driver).await {
            WorkerMessage::Notification(n) if n.notification == "sql_log" => {
                logged |= n.payload["sql"].as_str().is_some_and(|s| s.starts_with("findAll"));
            }
            WorkerMessage::Notification(_) => {}
            WorkerMessage::Response(r) => {
                assert_eq!(r.id, CorrelationId::from(3u64));
                assert_eq!(r.result(), Some(&json!([])));
                break;
            }
        }
    }
    assert!(logged, "findAll statement must be logged before its response");
}

#[tokio::test]
async fn shutdown_silences_in_flight_requests() {
    let bridge = bridge().register("hang", |_ctx: Arc<Context>, _params: Value| async {
        std::future::pending::<()>().await;
        Ok::<_, BridgeError>(Value::Null)
    });
    let mut running = start(bridge);
    next(&mut running.driver).await;
    send(&running.driver, 1, "connect", json!({"config": {}}));
    response(&mut running.driver).await;

    send(&running.driver, 7, "hang", Value::Null);
    tokio::task::yield_now().await;
    running.stop.send(()).unwrap();

    let reason = running.handle.await.unwrap().unwrap();
    assert_eq!(reason, ShutdownReason::Signal("SIGTERM"));
    assert!(running.driver.recv().await.is_none(), "no response after shutdown");
}

#[tokio::test]
async fn malformed_values_do_not_stop_the_bridge() {
    let mut running = start(bridge());
    next(&mut running.driver).await;

    assert!(running.driver.post(json!("not a request")));
    let rejected = response(&mut running.driver).await;
    assert_eq!(rejected.id, CorrelationId::Null);
    assert_eq!(rejected.error().unwrap().code, orb_wire::INVALID_REQUEST);

    send(&running.driver, 2, "ready", Value::Null);
    assert_eq!(response(&mut running.driver).await.id, CorrelationId::from(2u64));
}

#[test]
fn reasons_render_for_logs() {
    assert_eq!(ShutdownReason::EndOfInput(EndOfInput::StreamEnded).to_string(), "end of input");
    assert_eq!(ShutdownReason::Signal("SIGINT").to_string(), "signal SIGINT");
    assert_eq!(ShutdownReason::TransportFailed.to_string(), "transport failure");
}
