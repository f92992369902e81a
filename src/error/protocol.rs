use thiserror::Error;

/// Failures of a single controller operation, one variant per stage.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Failed to encode {operation} request: {source}")]
    Encode {
        operation: &'static str,
        #[source]
        source: quick_xml::SeError,
    },
    #[error("Failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Timed out connecting to {target} after {timeout_ms}ms")]
    ConnectTimeout { target: String, timeout_ms: u128 },
    #[error("Failed to write request: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },
    #[error("Timed out writing request after {timeout_ms}ms")]
    WriteTimeout { timeout_ms: u128 },
    #[error("Failed to read response: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },
    #[error("Timed out reading response after {timeout_ms}ms")]
    ReadTimeout { timeout_ms: u128 },
    #[error("Response exceeded max size ({max_bytes} bytes)")]
    ResponseTooLarge { max_bytes: u64 },
    #[error("Failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: quick_xml::DeError,
    },
    #[error("Failed to close connection after retry: {source}")]
    Close {
        #[source]
        source: std::io::Error,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
