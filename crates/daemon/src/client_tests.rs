// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SHORT: Duration = Duration::from_millis(200);

fn pair() -> (Client, UnixStream) {
    let (client, server) = UnixStream::pair().unwrap();
    let client = Client { stream: client, serial: 0, timeout: SHORT, pending_signals: VecDeque::new() };
    (client, server)
}

async fn expect_call(server: &mut UnixStream) -> u64 {
    match wire::receive(server).await.unwrap() {
        Message::MethodCall { serial, .. } => serial,
        other => panic!("expected a call, got {other:?}"),
    }
}

#[tokio::test]
async fn late_reply_to_a_timed_out_call_is_skipped() {
    let (mut client, mut server) = pair();

    let result = client.call("/a", "x.Iface", "Slow", Vec::new()).await;
    assert!(matches!(result, Err(CallError::Protocol(ProtocolError::Timeout))));
    let first = expect_call(&mut server).await;

    wire::send(&mut server, &Message::reply(first, Ok(Value::from("stale"))), SHORT).await.unwrap();
    let answer = tokio::spawn(async move {
        let second = expect_call(&mut server).await;
        wire::send(&mut server, &Message::reply(second, Ok(Value::from("fresh"))), SHORT).await.unwrap();
        server
    });

    let value = client.call("/a", "x.Iface", "Fast", Vec::new()).await.unwrap();
    assert_eq!(value, Value::from("fresh"));
    answer.await.unwrap();
}

#[tokio::test]
async fn stale_fault_is_skipped_too() {
    let (mut client, mut server) = pair();
    client.serial = 4;

    wire::send(&mut server, &Message::reply(3, Err(Fault::invalid_args("old"))), SHORT).await.unwrap();
    let answer = tokio::spawn(async move {
        let serial = expect_call(&mut server).await;
        wire::send(&mut server, &Message::reply(serial, Ok(Value::from(true))), SHORT).await.unwrap();
        server
    });

    assert_eq!(client.call("/a", "x.Iface", "M", Vec::new()).await.unwrap(), Value::from(true));
    answer.await.unwrap();
}

#[tokio::test]
async fn reply_from_the_future_is_unexpected() {
    let (mut client, mut server) = pair();

    wire::send(&mut server, &Message::reply(9, Ok(Value::from(1u64))), SHORT).await.unwrap();
    let result = client.call("/a", "x.Iface", "M", Vec::new()).await;
    assert!(matches!(result, Err(CallError::UnexpectedReply(_))));
}

#[tokio::test]
async fn signals_seen_while_waiting_are_buffered() {
    let (mut client, mut server) = pair();

    let signal = Message::Signal { path: "/a".into(), interface: "x.Iface".into(), member: "Changed".into(), args: Vec::new() };
    let sent = signal.clone();
    let answer = tokio::spawn(async move {
        let serial = expect_call(&mut server).await;
        wire::send(&mut server, &sent, SHORT).await.unwrap();
        wire::send(&mut server, &Message::reply(serial, Ok(Value::from(()))), SHORT).await.unwrap();
        server
    });

    client.call("/a", "x.Iface", "M", Vec::new()).await.unwrap();
    let _server = answer.await.unwrap();
    assert_eq!(client.next_signal().await.unwrap(), signal);
}
