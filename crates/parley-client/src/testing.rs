//! Test doubles: a scripted in-memory transport and a canned HTTP server.

use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::{
    ChatReply, ChatTransport, DeleteStatus, ServiceStatus, ThreadId, ToolInfo, ToolsList,
    TransportError, TransportResult, Turn,
};

// ============================================================================
// Scripted transport
// ============================================================================

/// `ChatTransport` that answers `send_chat` from a queue.
///
/// When gated, each `send_chat` waits for a permit from `release`, which
/// lets a test observe the store while a request is outstanding.
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<TransportResult<ChatReply>>>,
    sent: Mutex<Vec<(String, ThreadId)>>,
    delete_result: Mutex<Option<TransportResult<DeleteStatus>>>,
    gate: Option<Semaphore>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            delete_result: Mutex::new(None),
            gate: None,
        }
    }

    pub(crate) fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub(crate) fn reply(self, final_response: &str) -> Self {
        self.push(Ok(chat_reply(final_response, Vec::new())));
        self
    }

    pub(crate) fn reply_with_turns(self, final_response: &str, turns: Vec<Turn>) -> Self {
        self.push(Ok(chat_reply(final_response, turns)));
        self
    }

    pub(crate) fn fail(self, error: TransportError) -> Self {
        self.push(Err(error));
        self
    }

    pub(crate) fn on_delete(self, result: TransportResult<DeleteStatus>) -> Self {
        *self.delete_result.lock().unwrap() = Some(result);
        self
    }

    pub(crate) fn push(&self, result: TransportResult<ChatReply>) {
        self.replies.lock().unwrap().push_back(result);
    }

    /// Let `n` gated sends proceed.
    pub(crate) fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Every `(message, thread_id)` pair received so far.
    pub(crate) fn sent(&self) -> Vec<(String, ThreadId)> {
        self.sent.lock().unwrap().clone()
    }
}

pub(crate) fn chat_reply(final_response: &str, turns: Vec<Turn>) -> ChatReply {
    ChatReply {
        thread_id: ThreadId::from_string("scripted"),
        turns,
        final_response: final_response.to_string(),
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn health(&self) -> TransportResult<ServiceStatus> {
        Ok(ServiceStatus {
            status: "healthy".into(),
            details: BTreeMap::new(),
        })
    }

    async fn ready(&self) -> TransportResult<ServiceStatus> {
        Ok(ServiceStatus {
            status: "ready".into(),
            details: BTreeMap::new(),
        })
    }

    async fn send_chat(&self, message: &str, thread_id: &ThreadId) -> TransportResult<ChatReply> {
        self.sent
            .lock()
            .unwrap()
            .push((message.to_string(), thread_id.clone()));

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(mut reply)) => {
                reply.thread_id = thread_id.clone();
                Ok(reply)
            }
            Some(Err(e)) => Err(e),
            None => Err(TransportError::Network("no scripted reply".into())),
        }
    }

    async fn delete_thread(&self, thread_id: &ThreadId) -> TransportResult<DeleteStatus> {
        self.delete_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| {
                Ok(DeleteStatus {
                    status: "deleted".into(),
                    thread_id: Some(thread_id.clone()),
                })
            })
    }

    async fn list_tools(&self) -> TransportResult<ToolsList> {
        Ok(ToolsList {
            tools: vec![arxiv()],
            total: 1,
        })
    }

    async fn get_tool(&self, name: &str) -> TransportResult<ToolInfo> {
        if name == "arxiv" {
            Ok(arxiv())
        } else {
            Err(TransportError::api(
                404,
                Some(format!("Tool '{name}' not found")),
            ))
        }
    }
}

fn arxiv() -> ToolInfo {
    ToolInfo {
        name: "arxiv".into(),
        description: "Search ArXiv for preprints".into(),
        requires_api_key: false,
        is_available: true,
    }
}

// ============================================================================
// Canned HTTP server
// ============================================================================

/// One request as seen by the test server.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
}

/// Minimal HTTP/1.1 server answering every request with the same status
/// and body, or never answering at all when stalled.
pub(crate) struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: tokio::sync::oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub(crate) async fn respond(status: u16, body: &str) -> Self {
        Self::start(Some((status, body.to_string()))).await
    }

    pub(crate) async fn stalled() -> Self {
        Self::start(None).await
    }

    async fn start(response: Option<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();

        let recorded = requests.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accept = listener.accept() => {
                        let Ok((socket, _)) = accept else { continue };
                        let response = response.clone();
                        let recorded = recorded.clone();
                        tokio::spawn(serve(socket, response, recorded));
                    }
                }
            }
        });

        Self {
            addr,
            requests,
            shutdown: shutdown_tx,
            handle,
        }
    }

    pub(crate) fn url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

async fn serve(
    mut socket: TcpStream,
    response: Option<(u16, String)>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    recorded.lock().unwrap().push(request);

    let Some((status, body)) = response else {
        tokio::time::sleep(Duration::from_secs(30)).await;
        return;
    };

    let reply = format!(
        "HTTP/1.1 {status} Canned\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    );
    let _ = socket.write_all(reply.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Read headers plus a `Content-Length` body.
async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let header = |name: &str| {
        head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    };
    let content_length: usize = header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let body_end = buf.len().min(header_end + content_length);

    Some(RecordedRequest {
        method,
        path,
        content_type: header("content-type"),
        body: String::from_utf8_lossy(&buf[header_end..body_end]).to_string(),
    })
}
