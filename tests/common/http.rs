//! Minimal HTTP remotes for transport and authentication tests

use anyhow::Result;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct Held {
    closed: bool,
    streams: Vec<TcpStream>,
}

/// Accepts connections and never answers them
///
/// Dropping the server closes every held connection so clients blocked on a
/// read see end-of-file.
pub struct SilentServer {
    addr: SocketAddr,
    held: Arc<Mutex<Held>>,
}

impl SilentServer {
    pub fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let held = Arc::new(Mutex::new(Held::default()));
        let accepted = Arc::clone(&held);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let mut held = accepted.lock().unwrap();
                if held.closed {
                    let _ = stream.shutdown(Shutdown::Both);
                } else {
                    held.streams.push(stream);
                }
            }
        });
        Ok(Self { addr, held })
    }

    pub fn url(&self, repo: &str) -> String {
        format!("http://{}/{repo}", self.addr)
    }
}

impl Drop for SilentServer {
    fn drop(&mut self) {
        if let Ok(mut held) = self.held.lock() {
            held.closed = true;
            for stream in held.streams.drain(..) {
                let _ = stream.shutdown(Shutdown::Both);
            }
        }
    }
}

const UNAUTHORIZED_RESPONSE: &str = "HTTP/1.1 401 Unauthorized\r\n\
    WWW-Authenticate: Basic realm=\"git\"\r\n\
    Content-Type: text/plain\r\n\
    Content-Length: 0\r\n\
    Connection: close\r\n\r\n";

/// Answers every request with `401 Unauthorized` and records the request heads
pub struct UnauthorizedServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl UnauthorizedServer {
    pub fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for mut stream in listener.incoming().flatten() {
                let head = read_request_head(&mut stream);
                recorded.lock().unwrap().push(head);
                let _ = stream.write_all(UNAUTHORIZED_RESPONSE.as_bytes());
                let _ = stream.shutdown(Shutdown::Both);
            }
        });
        Ok(Self { addr, requests })
    }

    pub fn url(&self, repo: &str) -> String {
        format!("http://{}/{repo}", self.addr)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every `Authorization` header value received so far
    pub fn authorization_headers(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .flat_map(|head| head.lines().map(str::to_string).collect::<Vec<_>>())
            .filter_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.trim()
                    .eq_ignore_ascii_case("authorization")
                    .then(|| value.trim().to_string())
            })
            .collect()
    }
}

fn read_request_head(stream: &mut TcpStream) -> String {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}
