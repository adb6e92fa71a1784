use async_trait::async_trait;
use canvas::render::Rgb;
use frames::{Point, Tool};
use tokio::time::timeout;

use super::*;
use crate::broker::MemoryBroker;

fn room() -> RoomId {
    RoomId::new("abc123").expect("room id")
}

fn room_session(broker: &MemoryBroker, who: &str) -> RoomSession {
    let channel = ChannelManager::new(broker.clone(), "memory", who).with_reconnect_delay(Duration::from_millis(10));
    RoomSession::new(channel, &room(), Language::Python)
}

async fn joined(broker: &MemoryBroker, who: &str) -> RoomSession {
    let mut session = room_session(broker, who);
    session.join().await.expect("join");
    until(&mut session, |u| *u == RoomUpdate::Presence(PresenceChange::Joined(who.to_owned()))).await;
    session
}

/// Pull updates until one matches `pred`.
async fn until(session: &mut RoomSession, pred: impl Fn(&RoomUpdate) -> bool) -> RoomUpdate {
    loop {
        let update = timeout(Duration::from_millis(500), session.next_update())
            .await
            .expect("update timed out")
            .expect("update stream ended");
        if pred(&update) {
            return update;
        }
    }
}

struct FixedSource(Vec<String>);

#[async_trait]
impl ParticipantSource for FixedSource {
    async fn fetch_participants(&self, _room: &RoomId) -> Result<Vec<String>, ApiError> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn code_edit_reaches_peer() {
    let broker = MemoryBroker::new();
    let mut bob = joined(&broker, "bob").await;
    let mut alice = joined(&broker, "alice").await;

    assert!(alice.edit_code("print(1)"));
    let update = until(&mut bob, |u| matches!(u, RoomUpdate::CodeChanged { .. })).await;
    assert_eq!(update, RoomUpdate::CodeChanged { from: "alice".to_owned(), text: "print(1)".to_owned() });
    assert_eq!(bob.code().text(), "print(1)");
}

#[tokio::test]
async fn language_switch_stays_local() {
    let broker = MemoryBroker::new();
    let mut alice = joined(&broker, "alice").await;
    alice.set_language(Language::Rust);
    assert_eq!(alice.code().language(), Language::Rust);
    assert_eq!(alice.code().text(), Language::Rust.template());
    assert!(timeout(Duration::from_millis(80), alice.next_update()).await.is_err());
}

#[tokio::test]
async fn chat_is_trimmed_and_logged_in_order() {
    let broker = MemoryBroker::new();
    let mut bob = joined(&broker, "bob").await;
    let mut alice = joined(&broker, "alice").await;

    assert_eq!(alice.send_chat("   "), Err(ChatError::Empty));
    assert_eq!(alice.send_chat("  hello  "), Ok(true));
    assert_eq!(alice.send_chat("second"), Ok(true));

    until(&mut bob, |u| matches!(u, RoomUpdate::Chat(m) if m.content == "second")).await;
    let lines: Vec<&str> = bob.chat_log().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(lines, ["hello", "second"]);
    assert_eq!(bob.chat_log()[0].from, "alice");
}

#[tokio::test]
async fn presence_follows_join_and_leave() {
    let broker = MemoryBroker::new();
    let mut bob = joined(&broker, "bob").await;
    let mut alice = joined(&broker, "alice").await;

    until(&mut bob, |u| *u == RoomUpdate::Presence(PresenceChange::Joined("alice".to_owned()))).await;
    assert_eq!(bob.participants(), ["bob", "alice"]);

    alice.leave();
    alice.leave();
    until(&mut bob, |u| *u == RoomUpdate::Presence(PresenceChange::Left("alice".to_owned()))).await;
    assert_eq!(bob.participants(), ["bob"]);
}

#[tokio::test]
async fn submit_carries_current_code() {
    let broker = MemoryBroker::new();
    let mut bob = joined(&broker, "bob").await;
    let mut alice = joined(&broker, "alice").await;

    alice.edit_code("def solve(): pass");
    assert!(alice.submit());
    let update = until(&mut bob, |u| matches!(u, RoomUpdate::Submitted { .. })).await;
    assert_eq!(update, RoomUpdate::Submitted { from: "alice".to_owned(), content: "def solve(): pass".to_owned() });
}

#[tokio::test]
async fn periodic_refresh_replaces_participants() {
    let broker = MemoryBroker::new();
    let source = Arc::new(FixedSource(vec!["alice".to_owned(), "carol".to_owned()]));
    let mut alice = room_session(&broker, "alice").with_refresh(source, Duration::from_millis(20));
    alice.join().await.expect("join");

    let update = until(&mut alice, |u| matches!(u, RoomUpdate::Participants(_))).await;
    assert_eq!(update, RoomUpdate::Participants(vec!["alice".to_owned(), "carol".to_owned()]));
}

#[tokio::test]
async fn reconnects_while_refreshing_participants() {
    let broker = MemoryBroker::new();
    let source = Arc::new(FixedSource(vec!["alice".to_owned()]));
    let channel = ChannelManager::new(broker.clone(), "memory", "alice").with_reconnect_delay(Duration::from_millis(200));
    let mut alice = RoomSession::new(channel, &room(), Language::Python).with_refresh(source, Duration::from_millis(50));
    alice.join().await.expect("join");
    until(&mut alice, |u| *u == RoomUpdate::Presence(PresenceChange::Joined("alice".to_owned()))).await;

    broker.drop_connections().await;
    until(&mut alice, |u| *u == RoomUpdate::Disconnected).await;

    let mut refreshes = 0;
    timeout(Duration::from_secs(2), async {
        loop {
            match alice.next_update().await {
                Some(RoomUpdate::Connected) => break,
                Some(RoomUpdate::Participants(_)) => refreshes += 1,
                Some(other) => panic!("unexpected update while reconnecting: {other:?}"),
                None => panic!("update stream ended"),
            }
        }
    })
    .await
    .expect("reconnect within the delay despite refresh ticks");
    assert!(refreshes >= 2, "refresh kept running during the wait");
    assert_eq!(alice.connection_state(), ConnectionState::Connected);

    // The restored subscription carries a peer's join.
    let mut bob = joined(&broker, "bob").await;
    until(&mut alice, |u| *u == RoomUpdate::Presence(PresenceChange::Joined("bob".to_owned()))).await;
    assert!(bob.send_chat("back?").expect("chat"));
    until(&mut alice, |u| matches!(u, RoomUpdate::Chat(m) if m.content == "back?")).await;
}

#[tokio::test]
async fn permanent_failure_resets_document() {
    let broker = MemoryBroker::new();
    let mut alice = joined(&broker, "alice").await;
    assert_eq!(alice.sync_state(), SyncState::Synced);

    broker.set_available(false).await;
    broker.drop_connections().await;
    until(&mut alice, |u| matches!(u, RoomUpdate::Error(_))).await;
    assert_eq!(alice.sync_state(), SyncState::Idle);
    assert_eq!(alice.connection_state(), ConnectionState::Failed);
    assert!(!alice.edit_code("lost"));

    broker.set_available(true).await;
    alice.join().await.expect("rejoin");
    assert_eq!(alice.sync_state(), SyncState::Synced);
}

#[tokio::test]
async fn whiteboard_peers_converge() {
    let broker = MemoryBroker::new();
    let channel = |who: &str| ChannelManager::new(broker.clone(), "memory", who);
    let mut alice = WhiteboardSession::new(channel("alice"), &room(), 60, 60);
    let mut bob = WhiteboardSession::new(channel("bob"), &room(), 60, 60);
    alice.join().await.expect("alice join");
    bob.join().await.expect("bob join");
    for session in [&mut alice, &mut bob] {
        let update = timeout(Duration::from_millis(500), session.next_update()).await.expect("connected");
        assert_eq!(update, Some(WhiteboardUpdate::Connected));
    }
    timeout(Duration::from_millis(500), async {
        while broker.subscriber_count("/topic/drawing").await != 2 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("subscriptions");

    assert!(!alice.draw(WhiteboardEdit::PointerDown(Point::new(5.0, 5.0))));
    assert!(alice.draw(WhiteboardEdit::PointerMove(Point::new(50.0, 50.0))));
    assert!(!alice.draw(WhiteboardEdit::PointerUp(Point::new(50.0, 50.0))));
    alice.draw(WhiteboardEdit::SetTool(Tool::Circle));
    alice.draw(WhiteboardEdit::PointerDown(Point::new(30.0, 30.0)));
    assert!(alice.draw(WhiteboardEdit::PointerUp(Point::new(40.0, 30.0))));

    for _ in 0..2 {
        let update = timeout(Duration::from_millis(500), bob.next_update()).await.expect("replay");
        assert_eq!(update, Some(WhiteboardUpdate::Replayed { from: "alice".to_owned() }));
    }
    assert_eq!(bob.board().raster(), alice.board().raster());
    assert!(bob.board().raster().count(Rgb::BLACK) > 0);

    // Own echoes were skipped, so alice's op list holds each op once.
    assert!(timeout(Duration::from_millis(80), alice.next_update()).await.is_err());
    assert_eq!(alice.board().ops().len(), 2);
}
