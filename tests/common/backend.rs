//! In-process file backend speaking just enough HTTP for the transport.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Default)]
struct BackendState {
    files: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    hits: Mutex<HashMap<String, usize>>,
    delay: Mutex<Option<Duration>>,
}

/// Serves `GET /file/{route}/{id}` from an in-memory map.
pub struct TestBackend {
    pub base_url: String,
    state: Arc<BackendState>,
    task: JoinHandle<()>,
}

impl TestBackend {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test backend");
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(BackendState::default());

        let task_state = state.clone();
        let task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(handle_connection(socket, task_state.clone()));
            }
        });

        Self {
            base_url,
            state,
            task,
        }
    }

    pub fn put(&self, id: &str, bytes: &[u8]) {
        self.state
            .files
            .lock()
            .unwrap()
            .insert(id.to_string(), bytes.to_vec());
    }

    /// Make requests for `id` answer 500 until turned off again.
    pub fn set_failing(&self, id: &str, failing: bool) {
        let mut set = self.state.failing.lock().unwrap();
        if failing {
            set.insert(id.to_string());
        } else {
            set.remove(id);
        }
    }

    /// Hold every response for `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = Some(delay);
    }

    /// Number of requests received for `id`.
    pub fn hits(&self, id: &str) -> usize {
        self.state.hits.lock().unwrap().get(id).copied().unwrap_or(0)
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle_connection(mut socket: TcpStream, state: Arc<BackendState>) {
    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&chunk[..n]),
        }
        if request.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let request = String::from_utf8_lossy(&request);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");
    let path = path.split('?').next().unwrap_or(path);
    let id = path
        .strip_prefix("/file/")
        .and_then(|rest| rest.split('/').nth(1))
        .map(str::to_string);

    let delay = *state.delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let (status, body) = match id {
        Some(id) => {
            *state.hits.lock().unwrap().entry(id.clone()).or_insert(0) += 1;
            if state.failing.lock().unwrap().contains(&id) {
                ("500 Internal Server Error", Vec::new())
            } else {
                match state.files.lock().unwrap().get(&id) {
                    Some(bytes) => ("200 OK", bytes.clone()),
                    None => ("404 Not Found", Vec::new()),
                }
            }
        }
        None => ("400 Bad Request", Vec::new()),
    };

    let header = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = socket.write_all(header.as_bytes()).await;
    let _ = socket.write_all(&body).await;
    let _ = socket.flush().await;
}
