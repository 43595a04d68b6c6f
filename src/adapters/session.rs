use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::adapters::protocol::{
    AUTH_OK, AUTH_REQUIRED, AuthMessage, InboundMessage, StatisticsRequest,
};
use crate::adapters::transport::{Connector, Transport, TransportError};
use crate::domain::aggregation::SensorStatistics;
use crate::domain::report_window::ReportWindow;
use crate::domain::session_state::{
    InvalidTransition, SessionEvent, SessionState, SessionStateMachine,
};

const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to connect: {0}")]
    Connection(#[source] TransportError),
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("API request failed: {message}")]
    Api {
        code: Option<String>,
        message: String,
    },
    #[error("transport failed: {0}")]
    Transport(#[source] TransportError),
    #[error("session is not ready (state: {0:?})")]
    NotReady(SessionState),
    #[error(transparent)]
    InvalidState(#[from] InvalidTransition),
}

pub struct SessionClient<C: Connector> {
    connector: C,
    access_token: String,
    machine: SessionStateMachine,
    transport: Option<C::Transport>,
    next_request_id: u64,
}

impl<C: Connector> SessionClient<C> {
    pub fn new(connector: C, access_token: &str) -> Self {
        Self {
            connector,
            access_token: access_token.to_string(),
            machine: SessionStateMachine::new(),
            transport: None,
            next_request_id: 1,
        }
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    pub fn connect(&mut self) -> Result<(), SessionError> {
        self.machine.observe(SessionEvent::Open)?;

        let transport = match self.connector.open() {
            Ok(transport) => transport,
            Err(error) => {
                self.fail();
                return Err(SessionError::Connection(error));
            }
        };
        self.transport = Some(transport);
        self.machine.observe(SessionEvent::TransportOpened)?;

        if let Err(error) = self.authenticate() {
            self.fail();
            return Err(error);
        }
        self.machine.observe(SessionEvent::Authenticated)?;

        tracing::info!("session authenticated");
        Ok(())
    }

    pub fn fetch_statistics(
        &mut self,
        statistic_ids: &[String],
        window: &ReportWindow,
    ) -> Result<SensorStatistics, SessionError> {
        let state = self.state();
        if state != SessionState::Ready {
            return Err(SessionError::NotReady(state));
        }

        let id = self.next_request_id;
        self.next_request_id += 1;

        let request = StatisticsRequest::hourly_change(
            id,
            statistic_ids,
            window.start_wire(),
            window.end_wire(),
        );
        tracing::debug!(
            request_id = id,
            sensors = statistic_ids.len(),
            start_time = %request.start_time,
            end_time = %request.end_time,
            "requesting statistics"
        );

        let result = self.exchange(id, &request);
        if matches!(
            result,
            Err(SessionError::Protocol(_) | SessionError::Transport(_))
        ) {
            self.fail();
        }
        result
    }

    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            match transport.close() {
                Ok(()) => tracing::debug!("session connection closed"),
                Err(error) => tracing::debug!(error = %error, "closing session connection failed"),
            }
        }
        // Close is accepted from every state.
        let _ = self.machine.observe(SessionEvent::Close);
    }

    fn authenticate(&mut self) -> Result<(), SessionError> {
        let greeting = self.receive()?;
        if greeting.kind != AUTH_REQUIRED {
            return Err(SessionError::Protocol(format!(
                "expected `{AUTH_REQUIRED}` as first message, got `{}`",
                greeting.kind
            )));
        }

        let token = self.access_token.clone();
        self.send(&AuthMessage::new(&token))?;

        let reply = self.receive()?;
        if reply.kind != AUTH_OK {
            return Err(SessionError::Authentication(
                reply.message.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            ));
        }

        Ok(())
    }

    fn exchange(
        &mut self,
        id: u64,
        request: &StatisticsRequest<'_>,
    ) -> Result<SensorStatistics, SessionError> {
        self.send(request)?;
        let response = self.receive()?;

        if response.id != Some(id) {
            return Err(SessionError::Protocol(format!(
                "expected response to request {id}, got {:?}",
                response.id
            )));
        }

        if !response.success {
            let error = response.error.unwrap_or_default();
            return Err(SessionError::Api {
                code: error.code,
                message: error.message.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            });
        }

        let result = response
            .result
            .ok_or_else(|| SessionError::Protocol("successful response without result".to_string()))?;
        serde_json::from_value(result)
            .map_err(|error| SessionError::Protocol(format!("malformed statistics result: {error}")))
    }

    fn send<M: Serialize>(&mut self, message: &M) -> Result<(), SessionError> {
        let value = serde_json::to_value(message)
            .map_err(|error| SessionError::Transport(TransportError::Json(error)))?;
        self.transport_mut()?
            .send(&value)
            .map_err(SessionError::Transport)
    }

    fn receive(&mut self) -> Result<InboundMessage, SessionError> {
        let value: Value = self
            .transport_mut()?
            .receive()
            .map_err(SessionError::Transport)?;
        serde_json::from_value(value)
            .map_err(|error| SessionError::Protocol(format!("unrecognised message: {error}")))
    }

    fn transport_mut(&mut self) -> Result<&mut C::Transport, SessionError> {
        let state = self.machine.state();
        self.transport.as_mut().ok_or(SessionError::NotReady(state))
    }

    fn fail(&mut self) {
        let _ = self.machine.observe(SessionEvent::Violation);
        if let Some(mut transport) = self.transport.take()
            && let Err(error) = transport.close()
        {
            tracing::debug!(error = %error, "closing failed session connection failed");
        }
    }
}

impl<C: Connector> Drop for SessionClient<C> {
    fn drop(&mut self) {
        self.close();
    }
}
