//! ChatTransport implementation for HttpTransport.

use async_trait::async_trait;

use crate::{
    ChatReply, ChatTransport, DeleteStatus, ServiceStatus, ThreadId, ToolInfo, ToolsList,
    TransportResult,
};

use super::client::HttpTransport;
use super::wire::{
    ChatRequestBody, ChatResponseBody, DeleteBody, StatusBody, ToolInfoBody, ToolsBody,
};

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn health(&self) -> TransportResult<ServiceStatus> {
        let request = self.http.get(self.url("/health"));
        let body: StatusBody = self.execute(request, "GET /health").await?;
        Ok(body.into())
    }

    async fn ready(&self) -> TransportResult<ServiceStatus> {
        let request = self.http.get(self.url("/ready"));
        let body: StatusBody = self.execute(request, "GET /ready").await?;
        Ok(body.into())
    }

    async fn send_chat(&self, message: &str, thread_id: &ThreadId) -> TransportResult<ChatReply> {
        let request = self.http.post(self.url("/chat")).json(&ChatRequestBody {
            message,
            thread_id: thread_id.as_str(),
        });
        let body: ChatResponseBody = self.execute(request, "POST /chat").await?;
        Ok(body.into())
    }

    async fn delete_thread(&self, thread_id: &ThreadId) -> TransportResult<DeleteStatus> {
        let path = format!("/chat/{}", urlencoding::encode(thread_id.as_str()));
        let request = self.http.delete(self.url(&path));
        let body: DeleteBody = self.execute(request, "DELETE /chat/{thread_id}").await?;
        Ok(body.into())
    }

    async fn list_tools(&self) -> TransportResult<ToolsList> {
        let request = self.http.get(self.url("/tools"));
        let body: ToolsBody = self.execute(request, "GET /tools").await?;
        Ok(body.into())
    }

    async fn get_tool(&self, name: &str) -> TransportResult<ToolInfo> {
        let path = format!("/tools/{}", urlencoding::encode(name));
        let request = self.http.get(self.url(&path));
        let body: ToolInfoBody = self.execute(request, "GET /tools/{name}").await?;
        Ok(body.into())
    }
}
