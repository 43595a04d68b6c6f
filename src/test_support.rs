use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::adapters::transport::{Connector, Transport, TransportError};
use crate::domain::report_window::Clock;

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct ScriptLog {
    pub sent: Vec<Value>,
    pub close_calls: usize,
}

#[derive(Debug, Clone)]
pub struct ScriptedConnector {
    inbound: Vec<Value>,
    refuse: bool,
    log: Rc<RefCell<ScriptLog>>,
}

impl ScriptedConnector {
    pub fn new(inbound: Vec<Value>) -> Self {
        Self {
            inbound,
            refuse: false,
            log: Rc::default(),
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn log(&self) -> Rc<RefCell<ScriptLog>> {
        Rc::clone(&self.log)
    }
}

impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    fn open(&self) -> Result<Self::Transport, TransportError> {
        if self.refuse {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "scripted connection refused",
            )));
        }

        Ok(ScriptedTransport {
            pending: self.inbound.iter().cloned().collect(),
            log: Rc::clone(&self.log),
        })
    }
}

#[derive(Debug)]
pub struct ScriptedTransport {
    pending: VecDeque<Value>,
    log: Rc<RefCell<ScriptLog>>,
}

impl Transport for ScriptedTransport {
    fn send(&mut self, message: &Value) -> Result<(), TransportError> {
        self.log.borrow_mut().sent.push(message.clone());
        Ok(())
    }

    fn receive(&mut self) -> Result<Value, TransportError> {
        self.pending.pop_front().ok_or(TransportError::Closed)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.log.borrow_mut().close_calls += 1;
        Ok(())
    }
}
