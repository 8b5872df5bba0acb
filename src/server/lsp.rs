use std::io;

use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use balance_engine::balancer::base::{self, SelectMode};

// represents request message or notification message
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseMessage {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub method: String,
    pub params: Option<Value>,
}

impl BaseMessage {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

// represents response message
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResponse {
    pub jsonrpc: String,
    pub id: Option<i32>,
    pub result: Option<Value>,
    pub error: Option<ResponseError>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub process_id: Option<i64>,
    pub client_info: Option<ClientInfo>,
    pub locale: Option<String>,
    pub root_path: Option<String>,
    pub root_uri: Option<String>,
    pub initialization_options: Option<Value>,
    pub capabilities: Option<Value>,
    pub trace: Option<String>,
    pub workspace_folders: Option<Vec<Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub name: String,
    pub version: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub capabilities: Value,
    pub server_info: Option<ServerInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub name: String,
    pub version: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidOpenTextDocumentParams {
    pub text_document: TextDocumentItem,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentItem {
    pub uri: String,
    pub language_id: String,
    pub version: i32,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidChangeTextDocumentParams {
    pub text_document: VersionedTextDocumentIdentifier,
    pub content_changes: Vec<TextDocumentContentChangeEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedTextDocumentIdentifier {
    pub uri: String,
    pub version: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentContentChangeEvent {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidCloseTextDocumentParams {
    pub text_document: TextDocumentIdentifier,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentIdentifier {
    pub uri: String,
}

/// A character selection in a document, as hosts express it on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub location: u32,
    pub length: u32,
}

impl From<base::Range> for Selection {
    fn from(value: base::Range) -> Self {
        Selection {
            location: value.location as u32,
            length: value.length as u32,
        }
    }
}

impl Into<base::Range> for Selection {
    fn into(self) -> base::Range {
        base::Range {
            location: self.location as usize,
            length: self.length as usize,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceParams {
    pub text_document: TextDocumentIdentifier,
    pub selection: Selection,
    #[serde(default)]
    pub select: SelectMode,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResult {
    pub ranges: Vec<Selection>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanBalanceParams {
    pub text_document: TextDocumentIdentifier,
    pub selection: Selection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanBalanceResult {
    pub can_balance: bool,
}

/// A reader decoding Content-Length framed messages from a stream.
pub struct MessageReader<R> {
    reader: R,
    buffer: BytesMut,
}

impl<R: AsyncReadExt + Unpin> MessageReader<R> {
    /// Creates a new message reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: BytesMut::new(),
        }
    }

    /// Reads the next message from the stream.
    pub async fn read_message(&mut self) -> io::Result<BaseMessage> {
        loop {
            // the buffer may already hold a complete pipelined message
            if let Some(message) = self.try_decode_message()? {
                return Ok(message);
            }

            if self.reader.read_buf(&mut self.buffer).await? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "Input stream closed",
                ));
            }
        }
    }

    fn try_decode_message(&mut self) -> io::Result<Option<BaseMessage>> {
        // find the end of the header
        let header_end = match self
            .buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
        {
            Some(position) => position,
            None => return Ok(None),
        };

        let content_length = match parse_content_length(&self.buffer[..header_end]) {
            Some(length) => length,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Invalid Content-Length header",
                ))
            }
        };

        // wait until the whole body has arrived
        let body_start = header_end + 4;
        if self.buffer.len() < body_start + content_length {
            return Ok(None);
        }

        let framed = self.buffer.split_to(body_start + content_length);
        match serde_json::from_slice::<BaseMessage>(&framed[body_start..]) {
            Ok(message) => Ok(Some(message)),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid message format",
            )),
        }
    }
}

fn parse_content_length(header: &[u8]) -> Option<usize> {
    String::from_utf8_lossy(header)
        .lines()
        .find(|line| line.starts_with("Content-Length: "))
        .and_then(|line| line["Content-Length: ".len()..].trim().parse::<usize>().ok())
}

/// A writer encoding Content-Length framed messages onto a stream.
pub struct MessageWriter<W> {
    writer: W,
}

impl<W: AsyncWriteExt + Unpin> MessageWriter<W> {
    /// Creates a new message writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a message to the stream.
    pub async fn write_message(&mut self, message: &impl Serialize) -> io::Result<()> {
        let content = serde_json::to_string(message).unwrap_or_default();
        let framed = format!("Content-Length: {}\r\n\r\n{}", content.len(), content);

        self.writer.write_all(framed.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
