//! Event router mounted on a shared connection.

mod common;

use std::sync::{Arc, Mutex};

use common::{connected, Fixture, Recorder};
use playground_realtime::connection::EventKey;
use playground_realtime::router::{EventRouter, RouterOptions};
use playground_realtime::websocket::{Frame, FrameType};
use serde_json::json;

fn run_update(run: &str) -> Frame {
    Frame::new(
        FrameType::Other("RUN_UPDATE".into()),
        json!({ "run_id": run, "status": "running" }),
    )
}

#[test]
fn test_mount_joins_channels() {
    let fixture = Fixture::connected();
    let _router = EventRouter::mount(
        &fixture.manager,
        RouterOptions::new().channels(["run-1", "run-2"]),
    );

    assert_eq!(
        fixture.socket.sent_frames(),
        vec![Frame::subscribe("run-1"), Frame::subscribe("run-2")]
    );
}

#[test]
fn test_on_message_then_typed_handler() {
    let fixture = Fixture::connected();
    let order = Arc::new(Mutex::new(Vec::new()));
    let (all, typed) = (order.clone(), order.clone());

    let _router = EventRouter::mount(
        &fixture.manager,
        RouterOptions::new()
            .on_message(move |frame| all.lock().unwrap().push(format!("all:{}", frame.frame_type)))
            .on(FrameType::Other("RUN_UPDATE".into()), move |frame| {
                typed
                    .lock()
                    .unwrap()
                    .push(format!("typed:{}", frame.payload["run_id"].as_str().unwrap_or("")))
            }),
    );

    fixture.manager.dispatch(&run_update("run-1"));
    fixture.manager.dispatch(&Frame::pong());

    assert_eq!(
        *order.lock().unwrap(),
        vec!["all:RUN_UPDATE", "typed:run-1", "all:PONG"]
    );
}

#[test]
fn test_last_message_tracks_every_frame() {
    let fixture = Fixture::connected();
    let typed = Recorder::new();
    let router = EventRouter::mount(
        &fixture.manager,
        RouterOptions::new().on(FrameType::Pong, typed.handler()),
    );
    assert_eq!(router.last_message(), None);

    fixture.manager.dispatch(&Frame::pong());
    fixture.manager.dispatch(&connected("c-1"));

    assert_eq!(router.last_message(), Some(connected("c-1")));
    assert_eq!(typed.types(), vec![FrameType::Pong]);
}

#[test]
fn test_routers_share_channels() {
    let fixture = Fixture::connected();
    let first = EventRouter::mount(&fixture.manager, RouterOptions::new().channel("run-1"));
    let second = EventRouter::mount(&fixture.manager, RouterOptions::new().channel("run-1"));
    assert_eq!(fixture.manager.channel_refcount("run-1"), 2);

    drop(first);
    assert_eq!(fixture.socket.sent_frames(), vec![Frame::subscribe("run-1")]);

    drop(second);
    assert_eq!(
        fixture.socket.sent_frames().last(),
        Some(&Frame::unsubscribe("run-1"))
    );
}

#[test]
fn test_update_replaces_handlers() {
    let fixture = Fixture::connected();
    let (old, new) = (Recorder::new(), Recorder::new());
    let mut router = EventRouter::mount(
        &fixture.manager,
        RouterOptions::new().on_message(old.handler()),
    );

    router.update(RouterOptions::new().on_message(new.handler()));
    fixture.manager.dispatch(&Frame::ping());

    assert_eq!(old.len(), 0);
    assert_eq!(new.len(), 1);
    assert_eq!(fixture.manager.subscriber_count(&EventKey::Any), 1);
}

#[test]
fn test_send_through_router() {
    let fixture = Fixture::connected();
    let router = EventRouter::mount(&fixture.manager, RouterOptions::new());

    assert!(router.is_connected());
    assert!(router.send(Frame::ping()));

    fixture.socket.simulate_disconnect();
    assert!(!router.is_connected());
    assert!(!router.send(Frame::ping()));
}
