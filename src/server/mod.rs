mod lsp;

use std::path::PathBuf;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use url::Url;

use balance_engine::balancer::{base::ResolveError, Balancer};

use lsp::{
    BalanceParams, BalanceResult, BaseMessage, BaseResponse, CanBalanceParams, CanBalanceResult,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    InitializeParams, InitializeResult, MessageReader, MessageWriter, ResponseError, ServerInfo,
};

/// Stdio service exposing the balancer to editor hosts.
pub struct BalanceServer<R, W> {
    reader: MessageReader<R>,
    writer: MessageWriter<W>,
    balancer: Balancer,
    initialized: bool,
}

impl<R: AsyncReadExt + Unpin, W: AsyncWriteExt + Unpin> BalanceServer<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: MessageReader::new(reader),
            writer: MessageWriter::new(writer),
            balancer: Balancer::new(),
            initialized: false,
        }
    }

    pub async fn run(&mut self) -> std::io::Result<()> {
        log::debug!("Balance server is running");

        loop {
            let message = self.reader.read_message().await?;
            log::debug!(
                "Received message: {}",
                serde_json::to_string(&message).unwrap_or("<None>".to_string())
            );

            match message.method.as_str() {
                "initialize" => {
                    if let Some(response) = self.handle_initialize(message) {
                        self.writer.write_message(&response).await?;
                    }
                }
                "initialized" => {
                    // do nothing
                }
                "shutdown" => {
                    if let Some(response) = self.handle_shutdown(message) {
                        self.writer.write_message(&response).await?;
                    }
                }
                "exit" => {
                    break;
                }
                "textDocument/didOpen" => {
                    self.did_open(message);
                }
                "textDocument/didChange" => {
                    self.did_change(message);
                }
                "textDocument/didClose" => {
                    self.did_close(message);
                }
                "textDocument/balance" => {
                    self.balance(message).await;
                }
                "textDocument/canBalance" => {
                    self.can_balance(message).await;
                }
                method => {
                    if method.starts_with("$/") {
                        if !message.is_notification() {
                            if let Some(response) = self.handle_method_not_found(message) {
                                self.writer.write_message(&response).await?;
                            }
                        }

                        continue;
                    }

                    if message.is_notification() {
                        log::warn!("Unhandled notification: {}", method);
                    } else {
                        log::warn!("Unhandled request: {}", method);
                    }
                }
            }
        }

        log::debug!("Balance server is stopped");
        Ok(())
    }

    fn handle_initialize(&mut self, message: BaseMessage) -> Option<BaseResponse> {
        let _params = serde_json::from_value::<InitializeParams>(message.params?).ok()?;
        if self.initialized {
            return Some(BaseResponse {
                jsonrpc: "2.0".to_string(),
                id: message.id,
                result: None,
                error: Some(ResponseError {
                    code: -32002,
                    message: "Server already initialized".to_string(),
                    data: None,
                }),
            });
        }

        self.initialized = true;

        let result = InitializeResult {
            capabilities: serde_json::json!({
                "textDocumentSync": 1, // documents are synced by always sending the full content
                "balanceProvider": true,
            }),
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        };

        Some(BaseResponse {
            jsonrpc: "2.0".to_string(),
            id: message.id,
            result: serde_json::to_value(result).ok(),
            error: None,
        })
    }

    fn handle_shutdown(&mut self, message: BaseMessage) -> Option<BaseResponse> {
        self.initialized = false;
        Some(BaseResponse {
            jsonrpc: "2.0".to_string(),
            id: message.id,
            result: None,
            error: None,
        })
    }

    fn handle_method_not_found(&self, message: BaseMessage) -> Option<BaseResponse> {
        Some(BaseResponse {
            jsonrpc: "2.0".to_string(),
            id: message.id,
            result: None,
            error: Some(ResponseError {
                code: -32601,
                message: "Method not found".to_string(),
                data: None,
            }),
        })
    }
}

impl<R: AsyncReadExt + Unpin, W: AsyncWriteExt + Unpin> BalanceServer<R, W> {
    fn did_open(&mut self, message: BaseMessage) {
        let params = match message.params {
            Some(params) => match serde_json::from_value::<DidOpenTextDocumentParams>(params) {
                Ok(params) => params,
                Err(e) => {
                    log::error!("Failed to parse didOpen params: {}", e);
                    return;
                }
            },
            None => {
                log::error!("Missing params in didOpen message");
                return;
            }
        };

        let path = match parse_uri_to_path(&params.text_document.uri) {
            Some(x) => x,
            None => return,
        };

        self.balancer.sync_document(&path, &params.text_document.text);
    }

    fn did_change(&mut self, message: BaseMessage) {
        let params = match message.params {
            Some(params) => match serde_json::from_value::<DidChangeTextDocumentParams>(params) {
                Ok(params) => params,
                Err(e) => {
                    log::error!("Failed to parse didChange params: {}", e);
                    return;
                }
            },
            None => {
                log::error!("Missing params in didChange message");
                return;
            }
        };

        let content = match params.content_changes.last() {
            Some(change) => &change.text,
            None => {
                log::warn!("Missing content in didChange message");
                return;
            }
        };

        let path = match parse_uri_to_path(&params.text_document.uri) {
            Some(x) => x,
            None => return,
        };

        self.balancer.sync_document(&path, content);
    }

    fn did_close(&mut self, message: BaseMessage) {
        let params = match message.params {
            Some(params) => match serde_json::from_value::<DidCloseTextDocumentParams>(params) {
                Ok(params) => params,
                Err(e) => {
                    log::error!("Failed to parse didClose params: {}", e);
                    return;
                }
            },
            None => {
                log::error!("Missing params in didClose message");
                return;
            }
        };

        let path = match parse_uri_to_path(&params.text_document.uri) {
            Some(x) => x,
            None => return,
        };

        self.balancer.remove_document(&path);
    }

    async fn balance(&mut self, message: BaseMessage) {
        let params = match message.params {
            Some(params) => match serde_json::from_value::<BalanceParams>(params) {
                Ok(params) => params,
                Err(e) => {
                    log::error!("Failed to parse balance params: {}", e);
                    return;
                }
            },
            None => {
                log::error!("Missing params in balance request");
                return;
            }
        };

        let path = match parse_uri_to_path(&params.text_document.uri) {
            Some(path) => path,
            None => return,
        };

        let response = match self
            .balancer
            .balance(&path, params.selection.into(), params.select)
        {
            Ok(ranges) => BaseResponse {
                jsonrpc: "2.0".to_string(),
                id: message.id,
                result: serde_json::to_value(BalanceResult {
                    ranges: ranges.into_iter().map(Into::into).collect(),
                })
                .ok(),
                error: None,
            },
            Err(error) => BaseResponse {
                jsonrpc: "2.0".to_string(),
                id: message.id,
                result: None,
                error: Some(ResponseError {
                    code: error_code(error),
                    message: error.to_string(),
                    data: None,
                }),
            },
        };

        if let Err(e) = self.writer.write_message(&response).await {
            log::error!("Failed to write response: {}", e);
        }
    }

    async fn can_balance(&mut self, message: BaseMessage) {
        let params = match message.params {
            Some(params) => match serde_json::from_value::<CanBalanceParams>(params) {
                Ok(params) => params,
                Err(e) => {
                    log::error!("Failed to parse canBalance params: {}", e);
                    return;
                }
            },
            None => {
                log::error!("Missing params in canBalance request");
                return;
            }
        };

        let path = match parse_uri_to_path(&params.text_document.uri) {
            Some(path) => path,
            None => return,
        };

        let can_balance = self.balancer.can_balance(&path, params.selection.into());
        let response = BaseResponse {
            jsonrpc: "2.0".to_string(),
            id: message.id,
            result: serde_json::to_value(CanBalanceResult { can_balance }).ok(),
            error: None,
        };

        if let Err(e) = self.writer.write_message(&response).await {
            log::error!("Failed to write response: {}", e);
        }
    }
}

// resolution failures map to request-failed; broken invariants are internal
fn error_code(error: ResolveError) -> i32 {
    match error {
        ResolveError::MalformedZoneTree => -32603,
        _ => -32803,
    }
}

fn parse_uri_to_path(uri: &str) -> Option<PathBuf> {
    let url = match Url::parse(uri) {
        Ok(url) => url,
        Err(e) => {
            log::error!("Parse uri failed, err: {}", e);
            return None;
        }
    };
    let path = match url.to_file_path() {
        Ok(path) => path,
        Err(_) => {
            log::error!("Convert url {} to path failed", url);
            return None;
        }
    };

    Some(path)
}
