use std::collections::VecDeque;
use std::fs;
use std::io;

use serde::Deserialize;
use serde_json::Value;

use crate::adapters::transport::{Connector, Transport, TransportError};

#[derive(Debug, Clone, Deserialize)]
struct ReplayScript {
    inbound: Vec<ReplayEvent>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReplayEvent {
    message: Option<Value>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReplayConnector {
    script: ReplayScript,
}

impl ReplayConnector {
    pub fn from_file(path: &str) -> Result<Self, TransportError> {
        let content = fs::read_to_string(path)?;
        let script: ReplayScript = serde_json::from_str(&content)?;

        if script.inbound.is_empty() {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "replay script must contain at least one inbound event",
            )));
        }

        Ok(Self { script })
    }
}

impl Connector for ReplayConnector {
    type Transport = ReplayTransport;

    fn open(&self) -> Result<Self::Transport, TransportError> {
        tracing::debug!(
            events = self.script.inbound.len(),
            "serving session from replay script"
        );
        Ok(ReplayTransport {
            pending: self.script.inbound.iter().cloned().collect(),
            closed: false,
        })
    }
}

#[derive(Debug)]
pub struct ReplayTransport {
    pending: VecDeque<ReplayEvent>,
    closed: bool,
}

impl Transport for ReplayTransport {
    fn send(&mut self, message: &Value) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        tracing::debug!(message_type = %message["type"], "replay transport accepted message");
        Ok(())
    }

    fn receive(&mut self) -> Result<Value, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let event = self.pending.pop_front().ok_or(TransportError::Closed)?;

        match (event.message, event.error) {
            (Some(message), None) => Ok(message),
            (None, Some(error)) => Err(map_script_error(&error)),
            _ => Err(TransportError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "replay event must contain exactly one of: message or error",
            ))),
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }
}

fn map_script_error(kind: &str) -> TransportError {
    let normalized = kind.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "timeout" => TransportError::Timeout,
        "closed" => TransportError::Closed,
        "connection_reset" => {
            TransportError::Io(io::Error::new(io::ErrorKind::ConnectionReset, kind.to_string()))
        }
        "broken_pipe" => TransportError::Io(io::Error::new(io::ErrorKind::BrokenPipe, kind.to_string())),
        "invalid_json" => match serde_json::from_str::<Value>("not json") {
            Err(parse_err) => TransportError::Json(parse_err),
            Ok(_) => TransportError::Closed,
        },
        _ => TransportError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unknown scripted error kind: {kind}"),
        )),
    }
}
