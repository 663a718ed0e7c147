//! Multiple clients against one echo server.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use relink_echo::{EchoConfig, EchoServer};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[tokio::test]
async fn sessions_are_independent() {
    let config = EchoConfig::new(SocketAddr::from(([127, 0, 0, 1], 0)))
        .with_prefix("echo/")
        .with_greeting_interval(Duration::from_secs(60));
    let server = EchoServer::bind(config).await.expect("bind");
    let addr = server.local_addr();
    let shutdown = server.shutdown_handle();
    tokio::spawn(server.serve());

    let url = format!("ws://{addr}");
    let (mut first, _) = connect_async(url.as_str()).await.expect("connect first");
    let (mut second, _) = connect_async(url.as_str()).await.expect("connect second");

    second.send(Message::Text("b".into())).await.expect("send");
    first.send(Message::Text("a".into())).await.expect("send");

    let reply_a = tokio::time::timeout(Duration::from_secs(5), first.next())
        .await
        .expect("timed out")
        .expect("stream open")
        .expect("read");
    let reply_b = tokio::time::timeout(Duration::from_secs(5), second.next())
        .await
        .expect("timed out")
        .expect("stream open")
        .expect("read");

    assert_eq!(reply_a, Message::Text("echo/a".into()));
    assert_eq!(reply_b, Message::Text("echo/b".into()));

    shutdown.shutdown();
}
