// MCP server: newline-delimited JSON-RPC over a byte stream

use crate::codec::{Frame, JsonLineCodec};
use crate::protocol::*;
use crate::tools::ToolRegistry;
use anyhow::Result;
use futures::{SinkExt, StreamExt};
use nexussync_core::config::ProtocolConfig;
use nexussync_core::CommandExecutor;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};

/// Lifecycle of a single request. Every request ends in `Responding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    AwaitingRequest,
    Dispatching,
    AwaitingSubprocess,
    Responding,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingRequest => "awaiting-request",
            Self::Dispatching => "dispatching",
            Self::AwaitingSubprocess => "awaiting-subprocess",
            Self::Responding => "responding",
        };
        f.write_str(name)
    }
}

fn transition(id: &serde_json::Value, state: RequestState) {
    tracing::debug!("request {}: {}", id, state);
}

pub struct McpServer {
    registry: Arc<ToolRegistry>,
    executor: Arc<CommandExecutor>,
    max_message_bytes: usize,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, executor: CommandExecutor) -> Self {
        Self {
            registry: Arc::new(registry),
            executor: Arc::new(executor),
            max_message_bytes: ProtocolConfig::default().max_message_bytes,
        }
    }

    pub fn with_protocol_config(mut self, config: &ProtocolConfig) -> Self {
        self.max_message_bytes = config.max_message_bytes;
        self
    }

    /// Serve stdin/stdout until EOF or until `shutdown` resolves
    pub async fn start(self: Arc<Self>, shutdown: impl Future<Output = ()>) -> Result<()> {
        tracing::info!("MCP server listening on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout(), shutdown)
            .await
    }

    /// Read requests from `reader` and write one response line per request to `writer`.
    ///
    /// Each request is handled in its own task, so a slow subprocess never blocks
    /// reading; responses are written as they complete and callers correlate them by id.
    /// On EOF in-flight requests are allowed to finish. When `shutdown` resolves,
    /// reading stops at once and pending responses are abandoned.
    pub async fn serve<R, W>(
        self: Arc<Self>,
        reader: R,
        writer: W,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut frames = FramedRead::new(reader, JsonLineCodec::new(self.max_message_bytes));
        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let mut writer_task = tokio::spawn(write_responses(writer, rx));

        tokio::pin!(shutdown);
        let mut shutting_down = false;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, no longer accepting requests");
                    shutting_down = true;
                    break;
                }
                frame = frames.next() => match frame {
                    Some(Ok(frame)) => {
                        let server = self.clone();
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            if let Some(response) = server.handle_frame(frame).await {
                                // Receiver is gone only after shutdown
                                let _ = tx.send(response);
                            }
                        });
                    }
                    Some(Err(e)) => {
                        tracing::error!("Failed to read from transport: {}", e);
                        break;
                    }
                    None => {
                        tracing::info!("Input closed, finishing in-flight requests");
                        break;
                    }
                },
            }
        }

        drop(tx);

        if shutting_down {
            writer_task.abort();
            return Ok(());
        }

        tokio::select! {
            result = &mut writer_task => result??,
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested, abandoning in-flight requests");
                writer_task.abort();
            }
        }
        Ok(())
    }

    async fn handle_frame(&self, frame: Frame) -> Option<JsonRpcResponse> {
        match frame {
            Frame::Message(bytes) => self.handle_message(&bytes).await,
            Frame::Oversized => {
                tracing::warn!(
                    "Discarded message larger than {} bytes",
                    self.max_message_bytes
                );
                Some(JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error().with_data(serde_json::json!({
                        "reason": format!("message exceeds {} bytes", self.max_message_bytes)
                    })),
                ))
            }
        }
    }

    /// Handle one complete message; `None` only for notifications
    pub async fn handle_message(&self, raw: &[u8]) -> Option<JsonRpcResponse> {
        transition(&serde_json::Value::Null, RequestState::AwaitingRequest);

        let request: JsonRpcRequest = match serde_json::from_slice(raw) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Failed to parse request: {}", e);
                transition(&serde_json::Value::Null, RequestState::Responding);
                return Some(JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error(),
                ));
            }
        };

        let id = request.response_id();
        transition(&id, RequestState::Dispatching);

        if request.is_notification() {
            tracing::debug!("Received notification {}", request.method);
            return None;
        }

        let response = if request.jsonrpc != JSONRPC_VERSION {
            JsonRpcResponse::error(
                id.clone(),
                JsonRpcError::invalid_request(format!(
                    "Unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
            )
        } else {
            self.dispatch(&id, &request).await
        };

        transition(&id, RequestState::Responding);
        Some(response)
    }

    async fn dispatch(&self, id: &serde_json::Value, request: &JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            METHOD_INITIALIZE => self.initialize(id, request.params.as_ref()),
            METHOD_PING => JsonRpcResponse::success(id.clone(), serde_json::json!({})),
            METHOD_TOOLS_LIST => JsonRpcResponse::success(
                id.clone(),
                ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            METHOD_TOOLS_CALL => self.call_tool(id, request.params.as_ref()).await,
            other => {
                tracing::debug!("Unknown method {}", other);
                JsonRpcResponse::error(id.clone(), JsonRpcError::method_not_found(other))
            }
        }
    }

    fn initialize(&self, id: &serde_json::Value, params: Option<&serde_json::Value>) -> JsonRpcResponse {
        let params: InitializeParams = params
            .and_then(|p| serde_json::from_value(p.clone()).ok())
            .unwrap_or_default();
        if let Some(client) = &params.client_info {
            tracing::info!("Client connected: {} {}", client.name, client.version);
        }

        JsonRpcResponse::success(
            id.clone(),
            InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability {
                        list_changed: false,
                    }),
                },
                server_info: ServerInfo {
                    name: "nexussync-mcp".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            },
        )
    }

    async fn call_tool(&self, id: &serde_json::Value, params: Option<&serde_json::Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(|p| serde_json::from_value(p.clone())) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id.clone(),
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)),
                )
            }
            None => {
                return JsonRpcResponse::error(
                    id.clone(),
                    JsonRpcError::invalid_params("Missing tools/call params"),
                )
            }
        };

        // Unknown tools and invalid arguments are reported as tool results, not protocol errors
        let argv = match self.registry.build_invocation(&params.name, &params.arguments) {
            Ok(argv) => argv,
            Err(e) => {
                tracing::info!("Rejected call to {}: {}", params.name, e);
                return JsonRpcResponse::success(id.clone(), CallToolResult::failure(e.to_string()));
            }
        };

        transition(id, RequestState::AwaitingSubprocess);
        tracing::info!("Calling tool {}", params.name);
        let result = self.executor.run(&argv).await;
        if !result.success {
            tracing::info!(
                "Tool {} failed (exit code {:?}, timed out: {})",
                params.name,
                result.exit_code,
                result.timed_out
            );
        }

        JsonRpcResponse::success(id.clone(), CallToolResult::from_execution(&result))
    }
}

async fn write_responses<W>(writer: W, mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut sink = FramedWrite::new(writer, LinesCodec::new());
    while let Some(response) = rx.recv().await {
        let line = match serde_json::to_string(&response) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to serialize response: {}", e);
                continue;
            }
        };
        sink.send(line).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{builtin_registry, ParamSpec, ParamType, ToolDefinition};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    fn server_with(registry: ToolRegistry) -> Arc<McpServer> {
        Arc::new(McpServer::new(registry, CommandExecutor::new(Duration::from_secs(10))))
    }

    fn server() -> Arc<McpServer> {
        server_with(builtin_registry("youtube-chat").unwrap())
    }

    async fn call(server: &McpServer, message: Value) -> Value {
        let response = server
            .handle_message(message.to_string().as_bytes())
            .await
            .unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[cfg(unix)]
    fn fake_program(dir: &std::path::Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-cli");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_tools_list_is_stable() {
        let server = server();
        let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" });

        let first = call(&server, request.clone()).await;
        let _ = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": { "name": "nope" } }),
        )
        .await;
        let second = call(&server, request).await;

        assert_eq!(first, second);
        let tools = first["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 5);
        assert_eq!(tools[2]["name"], "jaegis_ask");
        assert_eq!(tools[2]["inputSchema"]["required"], json!(["question"]));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_tool_result() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": "abc",
                "method": "tools/call",
                "params": { "name": "jaegis_delete_everything", "arguments": {} }
            }),
        )
        .await;

        assert_eq!(response["id"], "abc");
        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Unknown tool: jaegis_delete_everything"));
    }

    #[tokio::test]
    async fn test_missing_required_argument_is_tool_result() {
        let response = call(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": { "name": "jaegis_ask", "arguments": {} }
            }),
        )
        .await;

        assert_eq!(response["id"], 4);
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("question"));
    }

    #[tokio::test]
    async fn test_parse_error() {
        let server = server();
        let response = server
            .handle_message(br#"{"jsonrpc":"2.0","id":1,"method":"#)
            .await
            .unwrap();

        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, JsonRpcError::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_wrong_shape_is_parse_error() {
        let response = call(&server(), json!({ "hello": "world" })).await;
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_method_not_found_keeps_id() {
        let response = call(
            &server(),
            json!({ "jsonrpc": "2.0", "id": 9, "method": "resources/list" }),
        )
        .await;

        assert_eq!(response["id"], 9);
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["error"]["message"], "Method not found: resources/list");
    }

    #[tokio::test]
    async fn test_wrong_version_is_invalid_request() {
        let response = call(
            &server(),
            json!({ "jsonrpc": "1.0", "id": 3, "method": "tools/list" }),
        )
        .await;

        assert_eq!(response["id"], 3);
        assert_eq!(response["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_tools_call_without_name_is_invalid_params() {
        let response = call(
            &server(),
            json!({ "jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": { "arguments": {} } }),
        )
        .await;

        assert_eq!(response["id"], 5);
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_initialize_and_notification() {
        let server = server();
        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 0,
                "method": "initialize",
                "params": { "protocolVersion": "2024-11-05", "clientInfo": { "name": "test", "version": "1" } }
            }),
        )
        .await;

        assert_eq!(response["result"]["serverInfo"]["name"], "nexussync-mcp");
        assert_eq!(response["result"]["capabilities"]["tools"]["listChanged"], false);

        let none = server
            .handle_message(br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(none.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ask_runs_program_and_reports_success() {
        let dir = tempfile::tempdir().unwrap();
        let args_file = dir.path().join("args.txt");
        let program = fake_program(
            dir.path(),
            &format!(
                "printf '%s\\n' \"$@\" > '{}'\necho 'RAG is retrieval-augmented generation.'",
                args_file.display()
            ),
        );
        let server = server_with(builtin_registry(program).unwrap());

        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 11,
                "method": "tools/call",
                "params": { "name": "jaegis_ask", "arguments": { "question": "What is RAG?" } }
            }),
        )
        .await;

        assert_eq!(response["id"], 11);
        assert!(response["result"].get("isError").is_none());
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("✅"));
        assert!(text.contains("RAG is retrieval-augmented generation."));

        let args = std::fs::read_to_string(&args_file).unwrap();
        assert_eq!(args.lines().collect::<Vec<_>>(), vec!["ask", "What is RAG?"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_program(dir.path(), "echo 'no active source' >&2\nexit 2");
        let server = server_with(builtin_registry(program).unwrap());

        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 12,
                "method": "tools/call",
                "params": { "name": "jaegis_stats" }
            }),
        )
        .await;

        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("❌"));
        assert!(text.contains("no active source"));
    }

    #[tokio::test]
    async fn test_missing_program_reports_failure() {
        let server = server_with(builtin_registry("definitely-not-installed-cli").unwrap());
        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 13,
                "method": "tools/call",
                "params": { "name": "jaegis_stats", "arguments": {} }
            }),
        )
        .await;

        assert_eq!(response["id"], 13);
        assert_eq!(response["result"]["isError"], true);
    }

    #[tokio::test]
    async fn test_serve_buffers_partial_chunks() {
        let (mut client, server_io) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server_io);
        let server = server();
        let handle = tokio::spawn(server.serve(server_read, server_write, std::future::pending()));

        let request = json!({ "jsonrpc": "2.0", "id": 21, "method": "ping" }).to_string();
        let (head, tail) = request.split_at(10);

        client.write_all(head.as_bytes()).await.unwrap();
        client.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.write_all(tail.as_bytes()).await.unwrap();
        client.write_all(b"\nnot json\n").await.unwrap();

        let mut lines = BufReader::new(&mut client).lines();
        let mut responses = Vec::new();
        for _ in 0..2 {
            let line = lines.next_line().await.unwrap().unwrap();
            responses.push(serde_json::from_str::<Value>(&line).unwrap());
        }

        let ping = responses.iter().find(|r| r["id"] == 21).unwrap();
        assert_eq!(ping["result"], json!({}));
        let parse_error = responses.iter().find(|r| r["id"].is_null()).unwrap();
        assert_eq!(parse_error["error"]["code"], -32700);

        drop(lines);
        drop(client);
        handle.await.unwrap().unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_request_does_not_block_others() {
        let mut registry = ToolRegistry::new("sh");
        registry
            .register(
                ToolDefinition::new("run", "Run a script", &["-c"])
                    .with_parameter(ParamSpec::new("script", ParamType::String, "Script").required()),
            )
            .unwrap();
        let server = server_with(registry);

        let (mut client, server_io) = tokio::io::duplex(4096);
        let (server_read, server_write) = tokio::io::split(server_io);
        let handle = tokio::spawn(server.serve(server_read, server_write, std::future::pending()));

        let slow = json!({
            "jsonrpc": "2.0", "id": "slow", "method": "tools/call",
            "params": { "name": "run", "arguments": { "script": "sleep 1; echo slow" } }
        });
        let fast = json!({ "jsonrpc": "2.0", "id": "fast", "method": "tools/list" });
        client
            .write_all(format!("{}\n{}\n", slow, fast).as_bytes())
            .await
            .unwrap();

        let mut lines = BufReader::new(&mut client).lines();
        let first: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        let second: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();

        assert_eq!(first["id"], "fast");
        assert_eq!(second["id"], "slow");
        assert!(second["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("slow"));

        drop(lines);
        drop(client);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let (_client, server_io) = tokio::io::duplex(64);
        let (server_read, server_write) = tokio::io::split(server_io);

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            server().serve(server_read, server_write, async {}),
        )
        .await;

        assert!(result.is_ok());
        assert!(result.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_oversized_message_gets_parse_error() {
        let server = Arc::new(
            McpServer::new(
                builtin_registry("youtube-chat").unwrap(),
                CommandExecutor::default(),
            )
            .with_protocol_config(&ProtocolConfig {
                max_message_bytes: 48,
            }),
        );

        let (mut client, server_io) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server_io);
        let handle = tokio::spawn(server.serve(server_read, server_write, std::future::pending()));

        let big = format!("{{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"{}\"}}\n", "x".repeat(64));
        client.write_all(big.as_bytes()).await.unwrap();
        client
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n")
            .await
            .unwrap();

        let mut lines = BufReader::new(&mut client).lines();
        let mut ids = Vec::new();
        for _ in 0..2 {
            let line: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
            ids.push(line["id"].clone());
        }
        assert!(ids.contains(&Value::Null));
        assert!(ids.contains(&json!(2)));

        drop(lines);
        drop(client);
        handle.await.unwrap().unwrap();
    }
}
