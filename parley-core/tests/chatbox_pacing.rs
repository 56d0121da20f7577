use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parley_core::{
    ChatboxConfig, EngineConfig, NotificationCategory, OscArg, OutboundEvent, Packet,
    ParleyEngine, ParleyError, Transport,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(Instant, String)>>,
    typing: Mutex<Vec<bool>>,
}

impl Transport for RecordingTransport {
    fn send(&self, packet: &Packet) -> Result<(), ParleyError> {
        let text = match packet.args().first() {
            Some(OscArg::String(s)) => s.clone(),
            other => panic!("unexpected chatbox payload {other:?}"),
        };
        self.sent.lock().push((Instant::now(), text));
        Ok(())
    }

    fn set_typing(&self, typing: bool) -> Result<(), ParleyError> {
        self.typing.lock().push(typing);
        Ok(())
    }
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        poll_interval: Duration::from_millis(2),
        chatbox: ChatboxConfig {
            minimum_timeout: Duration::from_millis(300),
            timeout_multiplier: Duration::from_millis(50),
            clear_guard: Duration::from_millis(50),
            notification_left: "[".into(),
            notification_right: "]".into(),
            max_length: 24,
            ..ChatboxConfig::default()
        },
        ..EngineConfig::default()
    }
}

fn recv_event_with_timeout(
    rx: &mut broadcast::Receiver<OutboundEvent>,
    timeout: Duration,
) -> OutboundEvent {
    let start = Instant::now();
    loop {
        match rx.try_recv() {
            Ok(ev) => return ev,
            Err(TryRecvError::Empty) => {
                if start.elapsed() >= timeout {
                    panic!("timed out waiting for outbound event");
                }
                thread::sleep(Duration::from_millis(2));
            }
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Closed) => panic!("event channel closed unexpectedly"),
        }
    }
}

#[test]
fn long_message_is_paced_chunk_by_chunk_then_cleared() {
    let transport = Arc::new(RecordingTransport::default());
    let engine = ParleyEngine::new(fast_config(), transport.clone());
    let mut events = engine.subscribe_events();
    engine.start().expect("start engine");

    engine
        .outbound()
        .enqueue("alpha bravo charlie delta echo foxtrot golf")
        .expect("enqueue");

    let mut chunks = Vec::new();
    loop {
        match recv_event_with_timeout(&mut events, Duration::from_secs(3)) {
            OutboundEvent::MessageSent { text, .. } => chunks.push(text),
            OutboundEvent::ChatboxCleared => break,
            other => panic!("unexpected event {other:?}"),
        }
    }
    engine.stop().expect("stop engine");

    assert!(chunks.len() >= 2, "chunks: {chunks:?}");
    assert!(chunks.iter().all(|c| c.chars().count() <= 24));

    let sent = transport.sent.lock();
    for pair in sent.windows(2).take(chunks.len() - 1) {
        let gap = pair[1].0.duration_since(pair[0].0);
        assert!(gap >= Duration::from_millis(290), "chunk paced too fast: {gap:?}");
    }
    assert_eq!(sent.last().map(|(_, t)| t.as_str()), Some(""));

    let diag = engine.diagnostics_snapshot();
    assert_eq!(diag.messages_sent, chunks.len());
    assert_eq!(diag.clears_sent, 1);
}

#[test]
fn same_category_notification_replaces_early() {
    let mut config = fast_config();
    config.chatbox.minimum_timeout = Duration::from_millis(2_000);

    let transport = Arc::new(RecordingTransport::default());
    let engine = ParleyEngine::new(config, transport.clone());
    let mut events = engine.subscribe_events();
    engine.start().expect("start engine");
    let outbound = engine.outbound();

    outbound
        .set_notification("song a", NotificationCategory::Media)
        .expect("notify");
    let first = recv_event_with_timeout(&mut events, Duration::from_secs(1));

    let replaced_at = Instant::now();
    outbound
        .set_notification("song b", NotificationCategory::Media)
        .expect("notify");
    let second = recv_event_with_timeout(&mut events, Duration::from_secs(1));
    let latency = replaced_at.elapsed();

    engine.stop().expect("stop engine");

    assert_eq!(
        first,
        OutboundEvent::NotificationSent {
            text: "[song a]".into(),
            category: NotificationCategory::Media,
            preempted: false,
        }
    );
    assert_eq!(
        second,
        OutboundEvent::NotificationSent {
            text: "[song b]".into(),
            category: NotificationCategory::Media,
            preempted: true,
        }
    );
    assert!(latency < Duration::from_millis(500), "pre-emption too slow: {latency:?}");
    assert_eq!(engine.diagnostics_snapshot().preemptions, 1);
}

#[test]
fn other_category_waits_for_display_time() {
    let transport = Arc::new(RecordingTransport::default());
    let engine = ParleyEngine::new(fast_config(), transport.clone());
    let mut events = engine.subscribe_events();
    engine.start().expect("start engine");
    let outbound = engine.outbound();

    outbound
        .set_notification("song", NotificationCategory::Media)
        .expect("notify");
    recv_event_with_timeout(&mut events, Duration::from_secs(1));
    let queued_at = Instant::now();
    outbound
        .set_notification("5 waves", NotificationCategory::Counter)
        .expect("notify");

    let next = recv_event_with_timeout(&mut events, Duration::from_secs(2));
    let waited = queued_at.elapsed();
    engine.stop().expect("stop engine");

    assert!(matches!(
        next,
        OutboundEvent::NotificationSent {
            category: NotificationCategory::Counter,
            preempted: false,
            ..
        }
    ));
    assert!(waited >= Duration::from_millis(250), "sent too early: {waited:?}");
}

#[test]
fn typing_signal_reaches_transport() {
    let transport = Arc::new(RecordingTransport::default());
    let engine = ParleyEngine::new(fast_config(), transport.clone());
    engine.start().expect("start engine");

    let outbound = engine.outbound();
    outbound.set_typing(true).expect("typing on");
    outbound.set_typing(true).expect("typing on again");
    outbound.set_typing(false).expect("typing off");
    thread::sleep(Duration::from_millis(100));
    engine.stop().expect("stop engine");

    assert_eq!(&*transport.typing.lock(), &vec![true, false]);
    let diag = engine.diagnostics_snapshot();
    assert_eq!(diag.typing_sent, 2);
    assert_eq!(diag.typing_suppressed, 1);
}
