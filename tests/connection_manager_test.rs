//! Connection manager: handler registry, channels, dispatch and lifecycle.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{connected, Fixture, MockConnector, MockWebSocket, Recorder};
use playground_realtime::connection::{ConnectionProvider, EventKey, Subscription};
use playground_realtime::websocket::{Frame, FrameType, WsClientConfig, WsConnectionState};

#[test]
fn test_send_reports_closed_socket() {
    let fixture = Fixture::connected();
    assert!(fixture.manager.send(Frame::ping()));

    fixture.socket.simulate_disconnect();
    assert!(!fixture.manager.is_connected());
    assert!(!fixture.manager.send(Frame::ping()));
    assert_eq!(fixture.socket.sent_frames().len(), 1);
}

#[test]
fn test_wildcard_handlers_run_before_typed() {
    let fixture = Fixture::connected();
    let order = Arc::new(Mutex::new(Vec::new()));

    let typed_order = order.clone();
    let _typed = fixture.manager.subscribe(FrameType::Pong, move |_| {
        typed_order.lock().unwrap().push("typed")
    });
    let any_order = order.clone();
    let _any = fixture
        .manager
        .subscribe(EventKey::Any, move |_| any_order.lock().unwrap().push("any"));

    fixture.manager.dispatch(&Frame::pong());

    assert_eq!(*order.lock().unwrap(), vec!["any", "typed"]);
}

#[test]
fn test_unsubscribe_removes_only_that_handler() {
    let fixture = Fixture::connected();
    let (first, second) = (Recorder::new(), Recorder::new());

    let mut sub_first = fixture.manager.subscribe(FrameType::Pong, first.handler());
    let _sub_second = fixture.manager.subscribe(FrameType::Pong, second.handler());

    sub_first.unsubscribe();
    sub_first.unsubscribe();
    fixture.manager.dispatch(&Frame::pong());

    assert_eq!(first.len(), 0);
    assert_eq!(second.len(), 1);
    assert!(!sub_first.is_active());
    assert_eq!(
        fixture.manager.subscriber_count(&EventKey::Type(FrameType::Pong)),
        1
    );
}

#[test]
fn test_handler_can_unsubscribe_itself_during_dispatch() {
    let fixture = Fixture::connected();
    let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
    let calls = Recorder::new();

    let own_slot = slot.clone();
    let record = calls.handler();
    let subscription = fixture.manager.subscribe(EventKey::Any, move |frame| {
        record(frame);
        own_slot.lock().unwrap().take();
    });
    *slot.lock().unwrap() = Some(subscription);
    let later = Recorder::new();
    let _later = fixture.manager.subscribe(FrameType::Ping, later.handler());

    fixture.manager.dispatch(&Frame::ping());
    fixture.manager.dispatch(&Frame::ping());

    assert_eq!(calls.len(), 1);
    assert_eq!(later.len(), 2);
}

#[test]
fn test_handler_removed_mid_dispatch_is_skipped() {
    let fixture = Fixture::connected();
    let victim = Recorder::new();
    let victim_slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    let slot = victim_slot.clone();
    let _killer = fixture.manager.subscribe(EventKey::Any, move |_| {
        slot.lock().unwrap().take();
    });
    *victim_slot.lock().unwrap() =
        Some(fixture.manager.subscribe(FrameType::Ping, victim.handler()));

    fixture.manager.dispatch(&Frame::ping());

    assert_eq!(victim.len(), 0);
}

#[test]
fn test_panicking_handler_does_not_stop_others() {
    let fixture = Fixture::connected();
    let survivor = Recorder::new();

    let _bad = fixture
        .manager
        .subscribe(EventKey::Any, |_| panic!("handler bug"));
    let _good = fixture.manager.subscribe(EventKey::Any, survivor.handler());

    fixture.manager.dispatch(&Frame::ping());
    fixture.manager.dispatch(&Frame::ping());

    assert_eq!(survivor.len(), 2);
}

#[test]
fn test_channels_are_reference_counted() {
    let fixture = Fixture::connected();

    fixture.manager.subscribe_to_channel("run-1");
    fixture.manager.subscribe_to_channel("run-1");
    assert_eq!(fixture.manager.channel_refcount("run-1"), 2);
    assert_eq!(fixture.socket.sent_frames(), vec![Frame::subscribe("run-1")]);

    fixture.manager.unsubscribe_from_channel("run-1");
    assert_eq!(fixture.socket.sent_frames().len(), 1);

    fixture.manager.unsubscribe_from_channel("run-1");
    fixture.manager.unsubscribe_from_channel("run-1");
    assert_eq!(
        fixture.socket.sent_frames(),
        vec![Frame::subscribe("run-1"), Frame::unsubscribe("run-1")]
    );
    assert!(fixture.manager.active_channels().is_empty());
}

#[test]
fn test_connected_frame_sets_connection_id() {
    let fixture = Fixture::connected();
    assert_eq!(fixture.manager.connection_id(), None);

    fixture.manager.dispatch(&connected("conn-7"));
    assert_eq!(fixture.manager.connection_id().as_deref(), Some("conn-7"));

    // Malformed greeting leaves it untouched
    fixture
        .manager
        .dispatch(&Frame::new(FrameType::Connected, serde_json::json!({ "id": 1 })));
    assert_eq!(fixture.manager.connection_id().as_deref(), Some("conn-7"));
}

#[tokio::test]
async fn test_pump_dispatches_and_resubscribes() {
    let fixture = Fixture::connected();
    let pump = fixture.manager.start();
    let recorder = Recorder::new();
    let _sub = fixture.manager.subscribe(EventKey::Any, recorder.handler());
    fixture.manager.subscribe_to_channel("run-1");

    fixture.socket.inject_frame(connected("conn-1"));
    wait_until(|| recorder.len() == 1).await;
    assert_eq!(fixture.manager.connection_id().as_deref(), Some("conn-1"));

    fixture.socket.simulate_reconnecting(1);
    wait_until(|| fixture.manager.connection_id().is_none()).await;

    fixture.socket.clear_sent_frames();
    fixture.socket.simulate_reconnected();
    wait_until(|| !fixture.socket.sent_frames().is_empty()).await;
    assert_eq!(fixture.socket.sent_frames(), vec![Frame::subscribe("run-1")]);

    pump.abort();
}

#[tokio::test]
async fn test_provider_owns_one_connection_per_session() {
    let socket = MockWebSocket::disconnected();
    let connector = MockConnector::new(socket.clone());
    let mut provider = ConnectionProvider::new(connector.clone(), WsClientConfig::default());

    assert!(provider.on_session(None).await.is_err());

    let manager = provider.on_session(Some("token-a")).await.unwrap();
    assert!(manager.is_connected());
    assert!(Arc::ptr_eq(
        &manager,
        &provider.on_session(Some("token-a")).await.unwrap()
    ));

    let replaced = provider.on_session(Some("token-b")).await.unwrap();
    assert!(!Arc::ptr_eq(&manager, &replaced));
    assert_eq!(connector.connect_calls().len(), 2);

    drop(provider);
    assert_eq!(socket.current_state(), WsConnectionState::Disconnected);
}

async fn wait_until<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}
