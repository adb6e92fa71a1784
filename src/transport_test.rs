use super::*;

#[tokio::test]
async fn pair_delivers_in_order_both_ways() {
    let (client, mut far) = Link::pair();
    client.outbound.send("a".to_owned()).expect("send");
    client.outbound.send("b".to_owned()).expect("send");
    assert_eq!(far.inbound.recv().await.as_deref(), Some("a"));
    assert_eq!(far.inbound.recv().await.as_deref(), Some("b"));

    let Link { outbound: _, mut inbound } = client;
    far.outbound.send("c".to_owned()).expect("send");
    assert_eq!(inbound.recv().await.as_deref(), Some("c"));
}

#[tokio::test]
async fn dropping_one_side_ends_the_other() {
    let (client, mut far) = Link::pair();
    drop(client);
    assert_eq!(far.inbound.recv().await, None);
    assert!(far.outbound.send("late".to_owned()).is_err());
}

#[tokio::test]
async fn websocket_connect_failure_names_endpoint() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let endpoint = format!("ws://{addr}/ws");
    let err = WsTransport.open(&endpoint).await.expect_err("nothing listens there");
    assert!(matches!(&err, TransportError::Connect { endpoint: e, .. } if *e == endpoint));
}
