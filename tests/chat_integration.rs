
use futures_util::future::join_all;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use chat_test_support::{ChatTestServer, TIMEOUT};
use chatcast::server::Server;

#[tokio::test(flavor = "multi_thread")]
async fn test_join_sequence_for_new_client() {
    let server = ChatTestServer::start().await;

    let mut alice = server.connect().await;
    alice.send_line("Alice").await;
    let received = alice.expect("[Alice]> ").await;

    assert_eq!(received, ">>> Alice joined the chat\n[Alice]> ");
    assert_eq!(server.registry().usernames(), vec!["Alice".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_join_announcement_reaches_others_once() {
    let server = ChatTestServer::start().await;

    let mut alice = server.join("Alice").await;
    let mut bob = server.join("Bob").await;

    alice.expect(">>> Bob joined the chat\n").await;

    bob.send_line("ping").await;
    let after_join = alice.expect("Bob: ping\n").await;
    assert!(
        !after_join.contains("joined the chat"),
        "join announced twice: {:?}",
        after_join
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_name_is_anonymous() {
    let server = ChatTestServer::start().await;

    let mut client = server.connect().await;
    client.send_line("").await;
    client.expect(">>> Anonymous joined the chat\n").await;
    client.expect("[Anonymous]> ").await;

    assert_eq!(server.registry().usernames(), vec!["Anonymous".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_broadcast_fan_out() {
    let server = ChatTestServer::start().await;

    let mut a = server.join("A").await;
    let mut b = server.join("B").await;
    let mut c = server.join("C").await;
    a.expect(">>> C joined the chat\n").await;
    b.expect(">>> C joined the chat\n").await;

    a.send_line("hello everyone").await;
    b.expect("A: hello everyone\n").await;
    c.expect("A: hello everyone\n").await;
    a.expect("A: hello everyone\n").await;

    // Anything arriving after the first copy must not repeat it.
    c.send_line("bye").await;
    let rest_b = b.expect("C: bye\n").await;
    let rest_a = a.expect("C: bye\n").await;
    assert!(!rest_b.contains("A: hello everyone"), "got {:?}", rest_b);
    assert!(!rest_a.contains("A: hello everyone"), "got {:?}", rest_a);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lines_from_one_client_keep_their_order() {
    let server = ChatTestServer::start().await;

    let mut a = server.join("A").await;
    let mut b = server.join("B").await;
    a.expect(">>> B joined the chat\n").await;

    for i in 0..20 {
        a.send_line(&format!("line {}", i)).await;
    }

    let received = b.expect("A: line 19\n").await;
    let expected: String = (0..20).map(|i| format!("A: line {}\n", i)).collect();
    assert_eq!(received, expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_quit_excludes_self_from_leave() {
    let server = ChatTestServer::start().await;

    let mut alice = server.join("Alice").await;
    let mut bob = server.join("Bob").await;
    alice.expect(">>> Bob joined the chat\n").await;

    alice.send_line("quit").await;
    bob.expect(">>> Alice left the chat\n").await;

    let rest = alice.read_to_close().await;
    assert!(!rest.contains("left the chat"), "got {:?}", rest);
    server.wait_for_members(1).await;
    assert_eq!(server.registry().usernames(), vec!["Bob".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_slash_quit_ends_session() {
    let server = ChatTestServer::start().await;

    let mut alice = server.join("Alice").await;
    alice.send_line("/quit").await;

    let rest = alice.read_to_close().await;
    assert!(!rest.contains("left the chat"), "got {:?}", rest);
    server.wait_for_members(0).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_broken_recipient_is_isolated() {
    let server = ChatTestServer::start().await;

    let mut a = server.join("A").await;
    let b = server.join("B").await;
    let mut c = server.join("C").await;
    a.expect(">>> C joined the chat\n").await;

    drop(b);

    // B's departure and A's line come from different sessions, so they may
    // arrive in either order.
    a.send_line("still here").await;
    c.expect_all(&["A: still here\n", ">>> B left the chat\n"]).await;
    a.expect_all(&["A: still here\n", ">>> B left the chat\n"]).await;
    server.wait_for_members(2).await;
    assert_eq!(
        server.registry().usernames(),
        vec!["A".to_string(), "C".to_string()]
    );

    a.send_line("after").await;
    c.expect("A: after\n").await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_joins() {
    let server = ChatTestServer::start().await;
    let server = &server;

    let clients = join_all((0..50).map(|i| async move {
        server.join(&format!("user{:02}", i)).await
    }))
    .await;

    assert_eq!(clients.len(), 50);
    assert_eq!(server.registry().len(), 50);

    let expected: Vec<String> = (0..50).map(|i| format!("user{:02}", i)).collect();
    assert_eq!(server.registry().usernames(), expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_long_line_is_not_truncated() {
    let server = ChatTestServer::start().await;

    let mut a = server.join("A").await;
    let mut b = server.join("B").await;
    a.expect(">>> B joined the chat\n").await;

    let long = "x".repeat(256 * 1024);
    a.send_line(&long).await;

    let received = b.expect("\n").await;
    assert_eq!(received, format!("A: {}\n", long));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_non_utf8_text_is_relayed() {
    let server = ChatTestServer::start().await;

    let mut a = server.join("A").await;
    let mut b = server.join("B").await;
    a.expect(">>> B joined the chat\n").await;

    a.send_raw(b"caf\xe9\n").await;
    a.send_line("still here").await;

    let received = b.expect("A: still here\n").await;
    assert_eq!(received, "A: caf\u{FFFD}\nA: still here\n");
    assert_eq!(
        server.registry().usernames(),
        vec!["A".to_string(), "B".to_string()]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_stops_accepting() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(Server::new(listener).serve_with_shutdown(async move {
        let _ = stop_rx.await;
    }));

    TcpStream::connect(addr).await.unwrap();

    stop_tx.send(()).unwrap();
    tokio::time::timeout(TIMEOUT, handle)
        .await
        .expect("accept loop should stop")
        .unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}
