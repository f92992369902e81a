use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ControlError;

const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// HTTP-level failure answered to the client as `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ControlFailure {
    pub(crate) status: u16,
    pub(crate) message: String,
}

impl ControlFailure {
    #[must_use]
    pub(crate) fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct HttpRequest {
    pub(crate) method: String,
    pub(crate) path: String,
}

/// Reads one request head and discards its body. Only the request line
/// and `Content-Length` matter to the control routes.
pub(crate) async fn read_http_request<R>(socket: &mut R) -> Result<HttpRequest, ControlFailure>
where
    R: AsyncRead + Unpin,
{
    let mut buffer: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let bytes = socket
            .read(&mut chunk)
            .await
            .map_err(|err| ControlFailure::new(400, format!("Failed to read request: {}", err)))?;
        if bytes == 0 {
            return Err(ControlFailure::new(400, "Empty request"));
        }
        let read_slice = chunk
            .get(..bytes)
            .ok_or_else(|| ControlFailure::new(400, "Invalid read length"))?;
        buffer.extend_from_slice(read_slice);
        if buffer.len() > MAX_REQUEST_BYTES {
            return Err(ControlFailure::new(413, "Request too large"));
        }
        if let Some(pos) = find_header_end(&buffer) {
            break pos;
        }
    };

    let header_bytes = buffer
        .get(..header_end)
        .ok_or_else(|| ControlFailure::new(400, "Malformed request headers"))?;
    let header_text = std::str::from_utf8(header_bytes)
        .map_err(|err| ControlFailure::new(400, format!("Invalid request encoding: {}", err)))?;
    let mut lines = header_text.split("\r\n");
    let request_line = lines
        .next()
        .ok_or_else(|| ControlFailure::new(400, "Missing request line"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| ControlFailure::new(400, "Missing HTTP method"))?;
    let path = parts
        .next()
        .ok_or_else(|| ControlFailure::new(400, "Missing request path"))?;

    let mut content_length = 0usize;
    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            return Err(ControlFailure::new(400, "Malformed header"));
        };
        if key.trim().eq_ignore_ascii_case("content-length") {
            content_length = value
                .trim()
                .parse()
                .map_err(|_parse_err| ControlFailure::new(400, "Invalid Content-Length"))?;
        }
    }
    if content_length > MAX_REQUEST_BYTES {
        return Err(ControlFailure::new(413, "Request body too large"));
    }

    let body_start = header_end.saturating_add(4);
    let mut body_len = buffer.len().saturating_sub(body_start);
    while body_len < content_length {
        let bytes = socket
            .read(&mut chunk)
            .await
            .map_err(|err| ControlFailure::new(400, format!("Failed to read body: {}", err)))?;
        if bytes == 0 {
            break;
        }
        body_len = body_len.saturating_add(bytes);
    }

    Ok(HttpRequest {
        method: method.to_owned(),
        path: path.to_owned(),
    })
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

const fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "OK",
    }
}

pub(crate) async fn write_json_response<W, T>(
    socket: &mut W,
    status: u16,
    response: &T,
) -> Result<(), ControlError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(response).map_err(|err| ControlError::Serialize {
        context: "control response",
        source: err,
    })?;
    write_response(socket, status, &body).await
}

pub(crate) async fn write_error_response<W>(
    socket: &mut W,
    status: u16,
    message: &str,
) -> Result<(), ControlError>
where
    W: AsyncWrite + Unpin,
{
    #[derive(Serialize)]
    struct ErrorResponse<'msg> {
        error: &'msg str,
    }
    let body = serde_json::to_vec(&ErrorResponse { error: message }).map_err(|err| {
        ControlError::Serialize {
            context: "control error response",
            source: err,
        }
    })?;
    write_response(socket, status, &body).await
}

async fn write_response<W>(socket: &mut W, status: u16, body: &[u8]) -> Result<(), ControlError>
where
    W: AsyncWrite + Unpin,
{
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        status_text(status),
        body.len()
    );
    socket
        .write_all(head.as_bytes())
        .await
        .map_err(|err| ControlError::Write {
            context: "write control response",
            source: err,
        })?;
    socket.write_all(body).await.map_err(|err| ControlError::Write {
        context: "write control response body",
        source: err,
    })?;
    socket.flush().await.map_err(|err| ControlError::Write {
        context: "flush control response",
        source: err,
    })
}
