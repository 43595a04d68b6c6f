use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tungstenite::http::Uri;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

const WEBSOCKET_PATH: &str = "/api/websocket";

pub trait Transport {
    fn send(&mut self, message: &Value) -> Result<(), TransportError>;
    fn receive(&mut self) -> Result<Value, TransportError>;
    fn close(&mut self) -> Result<(), TransportError>;
}

pub trait Connector {
    type Transport: Transport;

    fn open(&self) -> Result<Self::Transport, TransportError>;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid service url `{0}`")]
    InvalidUrl(String),
    #[error("failed to resolve service endpoint: {0}")]
    Resolve(std::io::Error),
    #[error("websocket handshake failed: {0}")]
    Handshake(String),
    #[error("timed out waiting for the server")]
    Timeout,
    #[error("connection closed by the server")]
    Closed,
    #[error("websocket communication failed: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("socket io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode message as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn from_base_url(base_url: &str) -> Result<Self, TransportError> {
        let invalid = || TransportError::InvalidUrl(base_url.to_string());
        let uri: Uri = base_url.trim().parse().map_err(|_| invalid())?;

        let (scheme, default_port) = match uri.scheme_str() {
            Some("http" | "ws") => ("ws", 80),
            Some("https" | "wss") => ("wss", 443),
            _ => return Err(invalid()),
        };
        // IPv6 literals come back bracketed; the resolver wants them bare.
        let host = uri
            .host()
            .map(|host| host.trim_start_matches('[').trim_end_matches(']'))
            .filter(|host| !host.is_empty())
            .ok_or_else(invalid)?;
        let port = uri.port_u16().unwrap_or(default_port);

        let base_path = uri.path().trim_end_matches('/');
        let path = if base_path.ends_with(WEBSOCKET_PATH) {
            base_path.to_string()
        } else {
            format!("{base_path}{WEBSOCKET_PATH}")
        };

        let authority = if host.contains(':') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };

        Ok(Self {
            url: format!("{scheme}://{authority}{path}"),
            host: host.to_string(),
            port,
        })
    }
}

#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    endpoint: Endpoint,
    timeout: Duration,
}

impl WebSocketConnector {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            endpoint: Endpoint::from_base_url(base_url)?,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl Connector for WebSocketConnector {
    type Transport = WebSocketTransport;

    fn open(&self) -> Result<Self::Transport, TransportError> {
        let addresses = (self.endpoint.host.as_str(), self.endpoint.port)
            .to_socket_addrs()
            .map_err(TransportError::Resolve)?;

        let mut last_error = None;
        let mut connected = None;
        for address in addresses {
            match TcpStream::connect_timeout(&address, self.timeout) {
                Ok(stream) => {
                    connected = Some(stream);
                    break;
                }
                Err(error) => {
                    tracing::debug!(%address, error = %error, "connect attempt failed");
                    last_error = Some(error);
                }
            }
        }
        let stream = match (connected, last_error) {
            (Some(stream), _) => stream,
            (None, Some(error)) => return Err(error.into()),
            (None, None) => {
                return Err(TransportError::Resolve(std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "no socket address resolved for service endpoint",
                )));
            }
        };
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let (socket, _response) = tungstenite::client_tls(self.endpoint.url.as_str(), stream)
            .map_err(|error| TransportError::Handshake(error.to_string()))?;

        tracing::debug!(url = %self.endpoint.url, "websocket connected");
        Ok(WebSocketTransport { socket })
    }
}

pub struct WebSocketTransport {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl Transport for WebSocketTransport {
    fn send(&mut self, message: &Value) -> Result<(), TransportError> {
        self.socket
            .send(Message::text(message.to_string()))
            .map_err(TransportError::from)
    }

    fn receive(&mut self) -> Result<Value, TransportError> {
        loop {
            match self.socket.read() {
                Ok(Message::Text(text)) => return Ok(serde_json::from_str(text.as_str())?),
                Ok(Message::Binary(bytes)) => return Ok(serde_json::from_slice(&bytes)?),
                Ok(Message::Close(_)) => return Err(TransportError::Closed),
                Ok(_) => {}
                Err(tungstenite::Error::Io(error))
                    if matches!(
                        error.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(TransportError::Timeout);
                }
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return Err(TransportError::Closed);
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        match self.socket.close(None) {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    use serde_json::{Value, json};
    use tungstenite::Message;

    use super::{Connector, Endpoint, Transport, TransportError, WebSocketConnector};

    #[test]
    fn derives_websocket_endpoint_from_http_base() {
        let endpoint = Endpoint::from_base_url("http://homeassistant.local:8123/")
            .expect("url should parse");

        assert_eq!(
            endpoint,
            Endpoint {
                url: "ws://homeassistant.local:8123/api/websocket".to_string(),
                host: "homeassistant.local".to_string(),
                port: 8123,
            }
        );
    }

    #[test]
    fn keeps_explicit_websocket_path_and_defaults_tls_port() {
        let endpoint =
            Endpoint::from_base_url("wss://ha.example.org/api/websocket").expect("url should parse");

        assert_eq!(endpoint.url, "wss://ha.example.org:443/api/websocket");
        assert_eq!(endpoint.port, 443);
    }

    #[test]
    fn strips_brackets_from_ipv6_host() {
        let endpoint = Endpoint::from_base_url("http://[::1]:8123").expect("url should parse");

        assert_eq!(endpoint.host, "::1");
        assert_eq!(endpoint.port, 8123);
        assert_eq!(endpoint.url, "ws://[::1]:8123/api/websocket");
    }

    #[test]
    fn rejects_unsupported_scheme() {
        let result = Endpoint::from_base_url("ftp://ha.example.org");
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
        assert!(Endpoint::from_base_url("not a url").is_err());
    }

    #[test]
    fn exchanges_json_with_loopback_server() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let port = listener.local_addr().expect("addr should be available").port();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("client should connect");
            let mut socket = tungstenite::accept(stream).expect("handshake should succeed");
            socket
                .send(Message::text(json!({"type": "auth_required"}).to_string()))
                .expect("server send should succeed");
            let received = match socket.read().expect("server should receive") {
                Message::Text(text) => serde_json::from_str::<Value>(text.as_str())
                    .expect("client message should be JSON"),
                other => panic!("unexpected frame: {other:?}"),
            };
            let closing = socket.read().expect("server should see the close frame");
            assert!(closing.is_close());
            received
        });

        let connector =
            WebSocketConnector::new(&format!("http://127.0.0.1:{port}"), Duration::from_secs(2))
                .expect("connector should build");
        let mut transport = connector.open().expect("transport should open");

        let greeting = transport.receive().expect("greeting should arrive");
        transport
            .send(&json!({"type": "auth", "access_token": "secret"}))
            .expect("send should succeed");

        transport.close().expect("close should succeed");

        let received = server.join().expect("server thread should finish");
        assert_eq!(greeting["type"], "auth_required");
        assert_eq!(received["access_token"], "secret");
    }

    #[test]
    fn connects_to_ipv6_loopback() {
        // Hosts without IPv6 loopback have nothing to exercise.
        let Ok(listener) = TcpListener::bind("[::1]:0") else {
            return;
        };
        let port = listener.local_addr().expect("addr should be available").port();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("client should connect");
            let mut socket = tungstenite::accept(stream).expect("handshake should succeed");
            socket
                .send(Message::text(json!({"type": "auth_required"}).to_string()))
                .expect("server send should succeed");
            let closing = socket.read().expect("server should see the close frame");
            assert!(closing.is_close());
        });

        let connector =
            WebSocketConnector::new(&format!("http://[::1]:{port}"), Duration::from_secs(2))
                .expect("connector should build");
        let mut transport = connector.open().expect("transport should open over IPv6");

        let greeting = transport.receive().expect("greeting should arrive");
        transport.close().expect("close should succeed");

        server.join().expect("server thread should finish");
        assert_eq!(greeting["type"], "auth_required");
    }

    #[test]
    fn receive_times_out_when_server_stays_silent() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let port = listener.local_addr().expect("addr should be available").port();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("client should connect");
            let socket = tungstenite::accept(stream).expect("handshake should succeed");
            thread::sleep(Duration::from_millis(600));
            drop(socket);
        });

        let connector =
            WebSocketConnector::new(&format!("ws://127.0.0.1:{port}"), Duration::from_millis(200))
                .expect("connector should build");
        let mut transport = connector.open().expect("transport should open");

        assert!(matches!(transport.receive(), Err(TransportError::Timeout)));
        server.join().expect("server thread should finish");
    }
}
