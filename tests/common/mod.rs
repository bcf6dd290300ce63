#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub auth_header: String,
    pub accept_header: String,
    pub body: String,
}

pub struct MockResponse {
    pub status: u16,
    pub body: String,
}

impl MockResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// Serves exactly `expected_requests` requests, one connection each.
pub struct MockBambooServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MockBambooServer {
    pub fn start<F>(expected_requests: usize, responder: F) -> Self
    where
        F: Fn(&str, &RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let requests_for_thread = Arc::clone(&requests);
        let base_for_thread = base_url.clone();

        let handle = thread::spawn(move || {
            for _ in 0..expected_requests {
                let (mut stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

                let mut request_line = String::new();
                reader
                    .read_line(&mut request_line)
                    .expect("read request line");
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let path = parts.next().unwrap_or("/").to_string();

                let mut auth_header = String::new();
                let mut accept_header = String::new();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).expect("read header");
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                    let lower = line.to_ascii_lowercase();
                    let value = || {
                        line.split_once(':')
                            .map(|(_, v)| v.trim().to_string())
                            .unwrap_or_default()
                    };
                    if lower.starts_with("authorization:") {
                        auth_header = value();
                    }
                    if lower.starts_with("accept:") {
                        accept_header = value();
                    }
                    if lower.starts_with("content-length:") {
                        content_length = value().parse::<usize>().unwrap_or(0);
                    }
                }

                let mut body = vec![0_u8; content_length];
                if content_length > 0 {
                    reader.read_exact(&mut body).expect("read body");
                }

                let request = RecordedRequest {
                    method,
                    path,
                    auth_header,
                    accept_header,
                    body: String::from_utf8_lossy(&body).to_string(),
                };
                let response = responder(&base_for_thread, &request);
                requests_for_thread
                    .lock()
                    .expect("lock requests")
                    .push(request);

                let raw = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response.status,
                    if response.status < 400 { "OK" } else { "Error" },
                    response.body.len(),
                    response.body
                );
                stream.write_all(raw.as_bytes()).expect("write response");
            }
        });

        Self {
            base_url,
            requests,
            handle: Some(handle),
        }
    }

    pub fn finish(mut self) -> Vec<RecordedRequest> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("join mock server");
        }
        self.requests.lock().expect("lock requests").clone()
    }
}

pub fn plan_list_json(base_url: &str, keys: &[&str]) -> String {
    let plans = keys
        .iter()
        .map(|key| {
            format!(
                r#"{{"shortName":"{key}","key":"{key}","link":{{"href":"{base_url}/rest/api/latest/plan/{key}","rel":"self"}}}}"#
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#"{{"expand":"plans","plans":{{"size":{},"start-index":0,"max-result":25,"plan":[{plans}]}}}}"#,
        keys.len()
    )
}

pub fn plan_detail_json(key: &str, name: &str, description: Option<&str>, variables: &[&str]) -> String {
    let variables = variables
        .iter()
        .map(|v| format!(r#"{{"key":"{v}","value":"default","variableType":"PLAN"}}"#))
        .collect::<Vec<_>>()
        .join(",");
    let description = description
        .map(|d| format!(r#""description":"{d}","#))
        .unwrap_or_default();
    format!(
        r#"{{"key":"{key}","shortName":"{name}",{description}"enabled":true,"type":"chain","variableContext":{{"size":2,"variable":[{variables}]}}}}"#
    )
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
