//! End-to-end room scenarios over the in-process broker.

use std::time::Duration;

use frames::{Body, Envelope, decode_envelope};
use roomsync::broker::MemoryBroker;
use roomsync::code::Language;
use roomsync::topic::ChannelContext;
use roomsync::{ChannelEvent, ChannelManager, RoomId, RoomSession, RoomUpdate};
use tokio::time::timeout;

async fn next_event(channel: &mut ChannelManager) -> ChannelEvent {
    timeout(Duration::from_millis(500), channel.next_event())
        .await
        .expect("event timed out")
        .expect("event stream ended")
}

async fn update_until(session: &mut RoomSession, pred: impl Fn(&RoomUpdate) -> bool) {
    loop {
        let update = timeout(Duration::from_millis(500), session.next_update())
            .await
            .expect("update timed out")
            .expect("update stream ended");
        if pred(&update) {
            return;
        }
    }
}

async fn wait_for_subscribers(broker: &MemoryBroker, topic: &str, n: usize) {
    timeout(Duration::from_millis(500), async {
        while broker.subscriber_count(topic).await != n {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("subscription count timed out");
}

#[tokio::test]
async fn code_typed_by_one_client_arrives_verbatim_at_another() {
    let broker = MemoryBroker::new();
    let room = RoomId::new("abc123").expect("room id");

    // B is a bare subscriber on the room topic.
    let mut b = ChannelManager::new(broker.clone(), "memory", "bob");
    b.connect(&ChannelContext::room(&room)).await.expect("b connect");
    assert_eq!(b.topics(), ["/topic/code/abc123"]);
    wait_for_subscribers(&broker, "/topic/code/abc123", 1).await;

    // A joins through a full room session and types.
    let mut a = RoomSession::new(ChannelManager::new(broker.clone(), "memory", "alice"), &room, Language::Python);
    a.join().await.expect("a join");
    assert!(a.edit_code("print(1)"));

    let mut codes = Vec::new();
    while codes.is_empty() {
        if let ChannelEvent::Message { topic, envelope } = next_event(&mut b).await {
            assert_eq!(topic, "/topic/code/abc123");
            if let Body::Code(text) = envelope.body {
                codes.push(text);
            }
        }
    }
    assert_eq!(codes, ["print(1)"]);
    assert!(timeout(Duration::from_millis(80), b.next_event()).await.is_err());
}

#[tokio::test]
async fn late_joiner_sees_only_later_edits() {
    let broker = MemoryBroker::new();
    let room = RoomId::new("late").expect("room id");
    let channel = |who: &str| ChannelManager::new(broker.clone(), "memory", who);

    let mut a = RoomSession::new(channel("alice"), &room, Language::Python);
    a.join().await.expect("a join");
    assert!(a.edit_code("v1"));
    update_until(&mut a, |u| matches!(u, RoomUpdate::CodeChanged { text, .. } if text == "v1")).await;

    let mut b = RoomSession::new(channel("bob"), &room, Language::Python);
    b.join().await.expect("b join");
    update_until(&mut b, |u| matches!(u, RoomUpdate::Presence(_))).await;
    assert_eq!(b.code().text(), Language::Python.template());

    assert!(a.edit_code("v2"));
    update_until(&mut b, |u| matches!(u, RoomUpdate::CodeChanged { .. })).await;
    assert_eq!(b.code().text(), "v2");
}

#[tokio::test]
async fn wire_bodies_are_json_envelopes() {
    let broker = MemoryBroker::new();
    let room = RoomId::new("wire").expect("room id");
    let mut a = ChannelManager::new(broker.clone(), "memory", "alice");
    a.connect(&ChannelContext::room(&room)).await.expect("connect");
    assert!(a.send(&Envelope::chat("alice", "hi"), None));

    let raw = r#"{"type":"chat","from":"alice","content":"hi"}"#;
    let expected = decode_envelope(raw).expect("decode");
    loop {
        if let ChannelEvent::Message { envelope, .. } = next_event(&mut a).await {
            if envelope.kind() == expected.kind() {
                assert_eq!(envelope.body, expected.body);
                assert_eq!(envelope.sender(), expected.sender());
                break;
            }
        }
    }
}
