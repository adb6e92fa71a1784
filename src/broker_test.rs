use frames::{HEADER_MESSAGE_ID, HEADER_SUBSCRIPTION};
use tokio::time::{Duration, timeout};

use super::*;

async fn recv_frame(link: &mut Link) -> StompFrame {
    let raw = timeout(Duration::from_millis(500), link.inbound.recv())
        .await
        .expect("frame receive timed out")
        .expect("link closed");
    decode_frame(&raw).expect("decode").expect("frame")
}

async fn assert_link_quiet(link: &mut Link) {
    assert!(
        timeout(Duration::from_millis(80), link.inbound.recv()).await.is_err(),
        "expected no frame"
    );
}

async fn assert_link_closed(link: &mut Link) {
    let next = timeout(Duration::from_millis(500), link.inbound.recv()).await.expect("close timed out");
    assert!(next.is_none(), "expected link to close, got {next:?}");
}

fn send(link: &Link, frame: &StompFrame) {
    link.outbound.send(encode_frame(frame)).expect("send");
}

async fn connected(broker: &MemoryBroker) -> Link {
    let mut link = broker.open("memory").await.expect("open");
    send(&link, &StompFrame::connect("memory"));
    assert_eq!(recv_frame(&mut link).await.command, Command::Connected);
    link
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
async fn connect_is_answered_with_connected() {
    let broker = MemoryBroker::new();
    let mut link = broker.open("memory").await.expect("open");
    send(&link, &StompFrame::connect("memory"));
    let frame = recv_frame(&mut link).await;
    assert_eq!(frame.command, Command::Connected);
    assert_eq!(frame.header("version"), Some("1.2"));
}

#[tokio::test]
async fn app_destination_is_relayed_to_topic_subscribers() {
    let broker = MemoryBroker::new();
    let mut alice = connected(&broker).await;
    let mut bob = connected(&broker).await;
    send(&alice, &StompFrame::subscribe("sub-a", "/topic/code/r1"));
    send(&bob, &StompFrame::subscribe("sub-b", "/topic/code/r1"));
    wait_for_subscribers(&broker, "/topic/code/r1", 2).await;

    send(&alice, &StompFrame::send("/app/code/r1", "{\"type\":\"code\"}"));

    let to_bob = recv_frame(&mut bob).await;
    assert_eq!(to_bob.command, Command::Message);
    assert_eq!(to_bob.destination(), Some("/topic/code/r1"));
    assert_eq!(to_bob.header(HEADER_SUBSCRIPTION), Some("sub-b"));
    assert_eq!(to_bob.body, "{\"type\":\"code\"}");

    let echo = recv_frame(&mut alice).await;
    assert_eq!(echo.header(HEADER_SUBSCRIPTION), Some("sub-a"));
    assert_eq!(echo.header(HEADER_MESSAGE_ID), to_bob.header(HEADER_MESSAGE_ID));
}

#[tokio::test]
async fn join_suffix_lands_on_room_topic() {
    let broker = MemoryBroker::new();
    let mut link = connected(&broker).await;
    send(&link, &StompFrame::subscribe("s", "/topic/code/r1"));
    wait_for_subscribers(&broker, "/topic/code/r1", 1).await;
    send(&link, &StompFrame::send("/app/code/r1/join", "{}"));
    assert_eq!(recv_frame(&mut link).await.destination(), Some("/topic/code/r1"));
}

#[tokio::test]
async fn other_topics_are_not_delivered() {
    let broker = MemoryBroker::new();
    let mut link = connected(&broker).await;
    send(&link, &StompFrame::subscribe("s", "/topic/code/r1"));
    wait_for_subscribers(&broker, "/topic/code/r1", 1).await;
    send(&link, &StompFrame::send("/app/code/r2", "{}"));
    assert_link_quiet(&mut link).await;
}

#[tokio::test]
async fn unsubscribe_stops_delivery() {
    let broker = MemoryBroker::new();
    let mut link = connected(&broker).await;
    send(&link, &StompFrame::subscribe("s", "/topic/drawing"));
    wait_for_subscribers(&broker, "/topic/drawing", 1).await;
    send(&link, &StompFrame::unsubscribe("s"));
    wait_for_subscribers(&broker, "/topic/drawing", 0).await;
    send(&link, &StompFrame::send("/app/drawing", "{}"));
    assert_link_quiet(&mut link).await;
}

#[tokio::test]
async fn disconnect_with_receipt_is_acknowledged_then_closed() {
    let broker = MemoryBroker::new();
    let mut link = connected(&broker).await;
    send(&link, &StompFrame::disconnect().with_header("receipt", "bye-1"));
    let receipt = recv_frame(&mut link).await;
    assert_eq!(receipt.command, Command::Receipt);
    assert_eq!(receipt.header("receipt-id"), Some("bye-1"));
    assert_link_closed(&mut link).await;
}

#[tokio::test]
async fn malformed_frame_gets_error_and_close() {
    let broker = MemoryBroker::new();
    let mut link = connected(&broker).await;
    link.outbound.send("BOGUS\n\n\0".to_owned()).expect("send");
    assert_eq!(recv_frame(&mut link).await.command, Command::Error);
    assert_link_closed(&mut link).await;
}

#[tokio::test]
async fn drop_connections_closes_links_and_clears_subscriptions() {
    let broker = MemoryBroker::new();
    let mut link = connected(&broker).await;
    send(&link, &StompFrame::subscribe("s", "/topic/drawing"));
    wait_for_subscribers(&broker, "/topic/drawing", 1).await;

    broker.drop_connections().await;
    assert_link_closed(&mut link).await;
    assert_eq!(broker.subscriber_count("/topic/drawing").await, 0);
    assert_eq!(broker.connection_count().await, 0);
}

#[tokio::test]
async fn unavailable_broker_refuses_open() {
    let broker = MemoryBroker::new();
    broker.set_available(false).await;
    let err = broker.open("memory").await.expect_err("should refuse");
    assert!(matches!(err, TransportError::Unavailable(_)));

    broker.set_available(true).await;
    assert!(broker.open("memory").await.is_ok());
}
