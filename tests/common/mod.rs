//! In-process stand-in for the bot's web service.
//!
//! Serves canned JSON from a `tiny_http` server on an ephemeral port and
//! records every request it sees.

#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use tiny_http::{Header, Method, Response, Server, StatusCode};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub url: String,
    pub body: String,
}

impl Recorded {
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }
}

pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockServer {
    /// Start a server answering each request with `handler(method, path)`.
    pub fn start(handler: impl Fn(&Method, &str) -> (u16, String) + Send + 'static) -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind mock server");
        let addr = server.server_addr().to_ip().expect("tcp listener");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let method = request.method().clone();
                let url = request.url().to_string();
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);

                let path = url.split('?').next().unwrap_or(&url).to_string();
                let (code, payload) = handler(&method, &path);
                log.lock().unwrap().push(Recorded { method, url, body });

                let resp = Response::from_data(payload.into_bytes())
                    .with_header(
                        Header::from_bytes("Content-Type", "application/json; charset=utf-8")
                            .unwrap(),
                    )
                    .with_status_code(StatusCode(code));
                let _ = request.respond(resp);
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    /// Serve the same status and body for every request.
    pub fn fixed(code: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::start(move |_, _| (code, body.clone()))
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path() == path).count()
    }
}
