#![allow(unused_crate_dependencies)]

use std::io::Write;
use std::thread;
use std::time::Duration;

use tiny_fileserver::{
    read_until, Endpoint, Error, Interest, Poll, Request, State, Transport, Type,
    HEADER_TERMINATOR,
};

#[allow(dead_code)]
mod support;

fn open_listener() -> (Transport, Endpoint) {
    let mut listener = Transport::create_bind(&Endpoint::localhost(0), Type::Stream).unwrap();
    listener.listen(8).unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

#[test]
fn accept_outside_listening_is_invalid_state() {
    let mut created = Transport::create(Type::Stream).unwrap();
    assert!(matches!(
        created.accept(),
        Err(Error::InvalidState {
            state: State::Created,
            ..
        })
    ));

    let (mut listener, _) = open_listener();
    listener.close();
    assert!(matches!(
        listener.accept(),
        Err(Error::InvalidState {
            state: State::Closed,
            ..
        })
    ));
}

#[test]
fn bind_to_taken_address_reports_os_error() {
    let (_listener, addr) = open_listener();
    let err = Transport::create_bind(&addr, Type::Stream).unwrap_err();
    assert_eq!(err.io_kind(), Some(std::io::ErrorKind::AddrInUse));
}

#[test]
fn double_close_releases_once() {
    let (mut listener, _) = open_listener();
    listener.close();
    // the freed descriptor number is reused by the next socket
    let (other, other_addr) = open_listener();
    listener.close();
    drop(listener);
    assert!(other.is_valid());
    assert_eq!(other.local_addr().unwrap(), other_addr);
}

#[test]
fn header_block_split_across_deliveries() {
    let (mut listener, addr) = open_listener();

    let writer = thread::spawn(move || {
        let mut client = support::create_client(addr, Some(Duration::from_secs(5)));
        for piece in [
            &b"GET /file1.html HTTP/1.0\r"[..],
            b"\nHost: x\r\n\r",
            b"\n",
            b"trailing",
        ] {
            client.write_all(piece).unwrap();
            client.flush().unwrap();
            thread::sleep(Duration::from_millis(20));
        }
    });

    let (mut accepted, _) = listener.accept().unwrap();
    let block = read_until(&mut accepted, HEADER_TERMINATOR, 4096).unwrap();
    assert_eq!(block, b"GET /file1.html HTTP/1.0\r\nHost: x\r\n\r\n");
    let request = Request::parse(&block).unwrap();
    assert_eq!(request.header("host"), Some("x"));

    writer.join().unwrap();
    let rest = accepted.read_until(b"\n", 4096).unwrap();
    assert_eq!(rest, b"trailing");
}

#[test]
fn poll_reports_pending_connection() {
    let (mut listener, addr) = open_listener();
    let mut poll = Poll::new().unwrap();
    poll.add_source(&listener, Interest::READABLE, |_, _| {}).unwrap();

    assert_eq!(poll.poll(Some(Duration::ZERO)).unwrap(), 0);

    let _client = Transport::create_connect(&addr, Type::Stream).unwrap();
    assert_eq!(poll.poll(Some(Duration::from_secs(5))).unwrap(), 1);
    let (accepted, peer) = listener.accept().unwrap();
    assert_eq!(accepted.state(), State::Connected);
    assert_eq!(peer.ip(), std::net::Ipv4Addr::LOCALHOST);
}
