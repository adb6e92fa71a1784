use super::*;

fn room(id: &str) -> RoomId {
    RoomId::new(id).expect("room id")
}

#[test]
fn room_context_destinations() {
    let ctx = ChannelContext::room(&room("abc123"));
    assert_eq!(ctx.topic, "/topic/code/abc123");
    assert_eq!(ctx.publish, "/app/code/abc123");
    assert_eq!(ctx.join.as_deref(), Some("/app/code/abc123/join"));
    assert_eq!(ctx.leave.as_deref(), Some("/app/code/abc123/leave"));
    assert_eq!(ctx.submit(), "/app/code/abc123/submit");
}

#[test]
fn whiteboard_context_has_no_presence() {
    let ctx = ChannelContext::whiteboard(&room("abc123"));
    assert_eq!(ctx.topic, WHITEBOARD_TOPIC);
    assert_eq!(ctx.publish, WHITEBOARD_DESTINATION);
    assert_eq!(ctx.join, None);
    assert_eq!(ctx.leave, None);
}

#[test]
fn application_destinations_relay_to_topics() {
    assert_eq!(relay_topic("/app/code/r1"), "/topic/code/r1");
    assert_eq!(relay_topic("/app/code/r1/join"), "/topic/code/r1");
    assert_eq!(relay_topic("/app/code/r1/leave"), "/topic/code/r1");
    assert_eq!(relay_topic("/app/code/r1/submit"), "/topic/code/r1");
    assert_eq!(relay_topic("/app/drawing"), WHITEBOARD_TOPIC);
}

#[test]
fn topic_destinations_are_unchanged() {
    assert_eq!(relay_topic("/topic/code/r1"), "/topic/code/r1");
}
