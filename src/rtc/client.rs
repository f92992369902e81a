use std::time::Duration;

use async_trait::async_trait;
use socket2::SockRef;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::ProtocolError;

use super::api::{CallOutcome, RtcApi};
use super::codec::{
    GET_QUEUE_REQUEST, decode_enqueue_response, decode_queue_response, encode_delete,
    encode_enqueue, encode_move,
};
use super::teardown::{Teardown, close_with_retry};
use super::timing::TimingRecord;
use super::types::{ConnectionTarget, Operation, QueueEntry, WashId};

/// Upper bound for a single response line.
const MAX_RESPONSE_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    pub connect: Duration,
    pub write: Duration,
    pub read: Duration,
    pub close_grace: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(3),
            write: Duration::from_millis(1500),
            read: Duration::from_secs(3),
            close_grace: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Reply {
    Line,
    Discard,
}

/// Client for the controller. Every operation opens its own connection
/// and tears it down before returning.
#[derive(Debug, Clone)]
pub struct RtcClient {
    target: ConnectionTarget,
    timeouts: ClientTimeouts,
}

impl RtcClient {
    #[must_use]
    pub const fn new(target: ConnectionTarget, timeouts: ClientTimeouts) -> Self {
        Self { target, timeouts }
    }

    #[must_use]
    pub const fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    #[must_use]
    pub async fn enqueue_wash(&self, package: u32) -> CallOutcome<Option<WashId>> {
        let mut record = TimingRecord::new(Operation::Queue);
        let result = match encode_enqueue(package) {
            Ok(request) => self
                .exchange(&mut record, &request, Reply::Line)
                .await
                .and_then(|payload| {
                    payload
                        .map(|text| decode_enqueue_response(&text))
                        .transpose()
                }),
            Err(err) => {
                record.fail(&err);
                Err(err)
            }
        };
        CallOutcome::new(record, result)
    }

    #[must_use]
    pub async fn move_wash(
        &self,
        wash: WashId,
        before: i64,
    ) -> CallOutcome<Option<Vec<QueueEntry>>> {
        let mut record = TimingRecord::new(Operation::Move);
        let result = match encode_move(wash, before) {
            Ok(request) => self
                .exchange(&mut record, &request, Reply::Line)
                .await
                .and_then(|payload| {
                    payload
                        .map(|text| decode_queue_response(Operation::Move, &text))
                        .transpose()
                }),
            Err(err) => {
                record.fail(&err);
                Err(err)
            }
        };
        CallOutcome::new(record, result)
    }

    /// The controller does not answer deletes; the retrieved column is
    /// stamped as soon as the request is written.
    #[must_use]
    pub async fn delete_wash(&self, wash: WashId) -> CallOutcome<()> {
        let mut record = TimingRecord::new(Operation::Delete);
        let result = match encode_delete(wash) {
            Ok(request) => self
                .exchange(&mut record, &request, Reply::Discard)
                .await
                .map(|_| ()),
            Err(err) => {
                record.fail(&err);
                Err(err)
            }
        };
        CallOutcome::new(record, result)
    }

    #[must_use]
    pub async fn list_queue(&self) -> CallOutcome<Option<Vec<QueueEntry>>> {
        let mut record = TimingRecord::new(Operation::Get);
        let result = self
            .exchange(&mut record, GET_QUEUE_REQUEST, Reply::Line)
            .await
            .and_then(|payload| {
                payload
                    .map(|text| decode_queue_response(Operation::Get, &text))
                    .transpose()
            });
        CallOutcome::new(record, result)
    }

    /// Connect, write, read, close. Returns the trimmed response line, or
    /// `None` when the controller closed the stream without sending one.
    async fn exchange(
        &self,
        record: &mut TimingRecord,
        request: &str,
        reply: Reply,
    ) -> Result<Option<String>, ProtocolError> {
        let mut conn = match RtcConnection::open(&self.target, self.timeouts.connect).await {
            Ok(conn) => conn,
            Err(err) => {
                record.fail(&err);
                return Err(err);
            }
        };
        record.mark_connected();

        if let Err(err) = conn.send(request, self.timeouts.write).await {
            warn!(
                operation = %record.operation(),
                error = %err,
                "Write to controller failed; continuing with read"
            );
        }
        record.mark_command_initiated();

        let payload = match reply {
            Reply::Line => match conn.read_line(self.timeouts.read).await {
                Ok(payload) => payload,
                Err(err) => {
                    record.fail(&err);
                    return Err(err);
                }
            },
            Reply::Discard => None,
        };
        record.mark_command_retrieved();

        close_with_retry(&mut conn, record, self.timeouts.close_grace).await?;
        Ok(payload)
    }
}

#[async_trait]
impl RtcApi for RtcClient {
    async fn enqueue_wash(&self, package: u32) -> CallOutcome<Option<WashId>> {
        RtcClient::enqueue_wash(self, package).await
    }

    async fn move_wash(&self, wash: WashId, before: i64) -> CallOutcome<Option<Vec<QueueEntry>>> {
        RtcClient::move_wash(self, wash, before).await
    }

    async fn delete_wash(&self, wash: WashId) -> CallOutcome<()> {
        RtcClient::delete_wash(self, wash).await
    }

    async fn list_queue(&self) -> CallOutcome<Option<Vec<QueueEntry>>> {
        RtcClient::list_queue(self).await
    }
}

struct RtcConnection {
    stream: BufReader<TcpStream>,
}

impl RtcConnection {
    async fn open(target: &ConnectionTarget, limit: Duration) -> Result<Self, ProtocolError> {
        let stream = match timeout(limit, TcpStream::connect((target.host(), target.port()))).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                return Err(ProtocolError::Connect {
                    target: target.to_string(),
                    source: err,
                });
            }
            Err(_) => {
                return Err(ProtocolError::ConnectTimeout {
                    target: target.to_string(),
                    timeout_ms: limit.as_millis(),
                });
            }
        };
        debug!(controller = %target, "Connection to controller opened");
        Ok(Self {
            stream: BufReader::new(stream),
        })
    }

    /// Requests go out without a line terminator; the controller parses
    /// the document as soon as it is complete.
    async fn send(&mut self, request: &str, limit: Duration) -> Result<(), ProtocolError> {
        let stream = self.stream.get_mut();
        let write = async {
            stream.write_all(request.as_bytes()).await?;
            stream.flush().await
        };
        match timeout(limit, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(ProtocolError::Write { source: err }),
            Err(_) => Err(ProtocolError::WriteTimeout {
                timeout_ms: limit.as_millis(),
            }),
        }
    }

    async fn read_line(&mut self, limit: Duration) -> Result<Option<String>, ProtocolError> {
        let mut buffer: Vec<u8> = Vec::with_capacity(1024);
        let mut bounded = (&mut self.stream).take(MAX_RESPONSE_BYTES.saturating_add(1));
        let bytes = match timeout(limit, bounded.read_until(b'\n', &mut buffer)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(err)) => return Err(ProtocolError::Read { source: err }),
            Err(_) => {
                return Err(ProtocolError::ReadTimeout {
                    timeout_ms: limit.as_millis(),
                });
            }
        };
        if u64::try_from(bytes).unwrap_or(u64::MAX) > MAX_RESPONSE_BYTES {
            return Err(ProtocolError::ResponseTooLarge {
                max_bytes: MAX_RESPONSE_BYTES,
            });
        }
        let line = String::from_utf8_lossy(&buffer);
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        Ok(Some(line.to_owned()))
    }
}

#[async_trait]
impl Teardown for RtcConnection {
    async fn close(&mut self) -> std::io::Result<()> {
        self.stream.get_mut().shutdown().await
    }

    fn force_deadline(&mut self) -> std::io::Result<()> {
        SockRef::from(self.stream.get_ref()).set_linger(Some(Duration::ZERO))
    }
}
