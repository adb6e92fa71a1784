//! Two simulated participants sharing a room over the in-process broker.

use std::future::Future;
use std::time::Duration;

use frames::{Point, Tool};
use roomsync::broker::MemoryBroker;
use roomsync::code::Language;
use roomsync::presence::PresenceChange;
use roomsync::topic::WHITEBOARD_TOPIC;
use roomsync::whiteboard::WhiteboardEdit;
use roomsync::{ChannelManager, RoomId, RoomSession, RoomUpdate, WhiteboardSession, WhiteboardUpdate};
use tracing::info;

use crate::CliError;

const STEP_TIMEOUT: Duration = Duration::from_secs(2);
const BOARD_SIZE: usize = 120;

/// What the second participant observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoReport {
    pub room: RoomId,
    pub code_seen: String,
    pub chat_seen: Vec<String>,
    pub participants: Vec<String>,
    pub ops_replayed: usize,
    pub boards_match: bool,
}

pub async fn run(room: RoomId) -> Result<DemoReport, CliError> {
    let broker = MemoryBroker::new();
    let channel = |who: &str| ChannelManager::new(broker.clone(), "memory://demo", who);

    let mut alice = RoomSession::new(channel("alice"), &room, Language::Python);
    let mut bob = RoomSession::new(channel("bob"), &room, Language::Python);
    bob.join().await?;
    wait_room(&mut bob, "bob's join", |u| *u == RoomUpdate::Presence(PresenceChange::Joined("bob".to_owned()))).await?;
    alice.join().await?;
    wait_room(&mut bob, "alice's join", |u| *u == RoomUpdate::Presence(PresenceChange::Joined("alice".to_owned())))
        .await?;

    alice.edit_code("print('hello from alice')");
    alice.send_chat("hi bob, the code is up")?;
    wait_room(&mut bob, "code", |u| matches!(u, RoomUpdate::CodeChanged { .. })).await?;
    wait_room(&mut bob, "chat", |u| matches!(u, RoomUpdate::Chat(_))).await?;
    info!(room = %room, "demo: code and chat delivered");

    let mut alice_board = WhiteboardSession::new(channel("alice"), &room, BOARD_SIZE, BOARD_SIZE);
    let mut bob_board = WhiteboardSession::new(channel("bob"), &room, BOARD_SIZE, BOARD_SIZE);
    alice_board.join().await?;
    bob_board.join().await?;
    within("whiteboard subscriptions", async {
        while broker.subscriber_count(WHITEBOARD_TOPIC).await < 2 {
            tokio::task::yield_now().await;
        }
    })
    .await?;

    let gestures = [
        WhiteboardEdit::PointerDown(Point::new(10.0, 10.0)),
        WhiteboardEdit::PointerMove(Point::new(60.0, 40.0)),
        WhiteboardEdit::PointerMove(Point::new(100.0, 20.0)),
        WhiteboardEdit::PointerUp(Point::new(100.0, 20.0)),
        WhiteboardEdit::SetTool(Tool::Rectangle),
        WhiteboardEdit::SetColor("#1e88e5".to_owned()),
        WhiteboardEdit::PointerDown(Point::new(20.0, 60.0)),
        WhiteboardEdit::PointerUp(Point::new(90.0, 110.0)),
    ];
    let published = gestures.into_iter().filter(|edit| alice_board.draw(edit.clone())).count();

    let mut ops_replayed = 0;
    while ops_replayed < published {
        let update = within("drawing replay", bob_board.next_update()).await?;
        match update {
            Some(WhiteboardUpdate::Replayed { .. }) => ops_replayed += 1,
            Some(_) => {}
            None => return Err(CliError::Closed("drawing replay")),
        }
    }

    let report = DemoReport {
        code_seen: bob.code().text().to_owned(),
        chat_seen: bob.chat_log().iter().map(|m| format!("{}: {}", m.from, m.content)).collect(),
        participants: bob.participants().to_vec(),
        ops_replayed,
        boards_match: alice_board.board().raster() == bob_board.board().raster(),
        room,
    };

    alice_board.leave();
    bob_board.leave();
    alice.leave();
    bob.leave();
    Ok(report)
}

async fn within<T>(what: &'static str, fut: impl Future<Output = T>) -> Result<T, CliError> {
    tokio::time::timeout(STEP_TIMEOUT, fut).await.map_err(|_| CliError::Timeout(what))
}

async fn wait_room(
    session: &mut RoomSession,
    what: &'static str,
    pred: impl Fn(&RoomUpdate) -> bool,
) -> Result<RoomUpdate, CliError> {
    loop {
        match within(what, session.next_update()).await? {
            Some(update) if pred(&update) => return Ok(update),
            Some(_) => {}
            None => return Err(CliError::Closed(what)),
        }
    }
}

#[cfg(test)]
#[path = "demo_test.rs"]
mod tests;
