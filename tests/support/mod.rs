use std::fs;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tiny_fileserver::{Endpoint, Server, ServerConfig, ShutdownToken};

/// Body of `file1.html` in every test root
pub(crate) const FILE1_BODY: &[u8] = b"0123456789";
/// Body of `image1.jpg` in every test root
pub(crate) const IMAGE1_BODY: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, 0x4a, 0x46];

/// Creates a [`TcpStream`] Client for `addr`
pub(crate) fn create_client(addr: Endpoint, timeout: Option<Duration>) -> TcpStream {
    let socket =
        socket2::Socket::new(socket2::Domain::IPV4, socket2::Type::STREAM, None).unwrap();
    if timeout.is_some() {
        socket.set_read_timeout(timeout).unwrap();
        socket.set_write_timeout(timeout).unwrap();
    }
    socket.connect(&addr.to_native()).unwrap();
    socket.into()
}

/// Fresh, empty directory below the system temp dir
pub(crate) fn temp_dir(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let dir = std::env::temp_dir().join(format!(
        "tiny-fileserver-{name}-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Server on a loopback port chosen by the OS, running in its own thread.
///
/// The serving root holds `file1.html` and `image1.jpg`. The server is
/// stopped and the root removed on drop.
pub(crate) struct TestServer {
    pub(crate) addr: Endpoint,
    pub(crate) root: PathBuf,
    token: ShutdownToken,
    handle: Option<JoinHandle<tiny_fileserver::Result<()>>>,
}

impl TestServer {
    pub(crate) fn start(name: &str) -> Self {
        let root = temp_dir(name);
        fs::write(root.join("file1.html"), FILE1_BODY).unwrap();
        fs::write(root.join("image1.jpg"), IMAGE1_BODY).unwrap();

        let token = ShutdownToken::new();
        let server = Server::new(
            ServerConfig {
                addr: Endpoint::localhost(0),
                root: root.clone(),
                ..ServerConfig::default()
            },
            token.clone(),
        )
        .unwrap();
        let addr = server.local_addr();
        let handle = thread::spawn(move || server.run());

        Self {
            addr,
            root,
            token,
            handle: Some(handle),
        }
    }

    /// Sends `raw`, half-closes and returns everything the server answered.
    pub(crate) fn exchange(&self, raw: &[u8]) -> Vec<u8> {
        let mut client = create_client(self.addr, Some(Duration::from_secs(5)));
        client.write_all(raw).unwrap();
        client.shutdown(Shutdown::Write).unwrap();
        let mut answer = Vec::new();
        let _ = client.read_to_end(&mut answer).unwrap();
        answer
    }

    /// Requests shutdown and waits for the accept loop to end.
    pub(crate) fn stop(&mut self) -> tiny_fileserver::Result<()> {
        self.token.cancel();
        match self.handle.take() {
            Some(handle) => handle.join().unwrap(),
            None => Ok(()),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.stop();
        let _ = fs::remove_dir_all(&self.root);
    }
}

/// Splits a response into header block (without the blank line) and body.
pub(crate) fn split_response(answer: &[u8]) -> (String, Vec<u8>) {
    let end = answer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response without header terminator");
    (
        String::from_utf8(answer[..end].to_vec()).unwrap(),
        answer[end + 4..].to_vec(),
    )
}
