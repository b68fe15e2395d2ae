//! Scripted in-memory transport for exercising the coordinator.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::Instant;
use tonic::Status;

use super::stream::{InboundHalf, OutboundHalf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Send(String),
    CloseSend,
}

/// Shared, timestamped record of what the coordinator did to the transport.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<(Event, Instant)>>>);

impl Journal {
    fn record(&self, event: Event) {
        self.0.lock().unwrap().push((event, Instant::now()));
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
    }

    pub fn timed_events(&self) -> Vec<(Event, Instant)> {
        self.0.lock().unwrap().clone()
    }

    pub fn sends(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Send(name) => Some(name),
                Event::CloseSend => None,
            })
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| **event == Event::CloseSend)
            .count()
    }
}

type Script = mpsc::UnboundedSender<Result<Option<String>, Status>>;

pub struct MockOutbound {
    journal: Journal,
    attempts: usize,
    fail_on_attempt: Option<usize>,
    echo: Option<Script>,
}

impl MockOutbound {
    /// Fail the `attempt`-th send (1-based) instead of accepting it.
    pub fn failing_on(mut self, attempt: usize) -> Self {
        self.fail_on_attempt = Some(attempt);
        self
    }
}

#[tonic::async_trait]
impl OutboundHalf for MockOutbound {
    type Request = String;

    async fn send(&mut self, request: String) -> Result<(), Status> {
        self.attempts += 1;
        if self.fail_on_attempt == Some(self.attempts) {
            return Err(Status::unavailable("injected send failure"));
        }

        if let Some(echo) = &self.echo {
            let _ = echo.send(Ok(Some(format!("Hello {request}"))));
        }
        self.journal.record(Event::Send(request));
        Ok(())
    }

    fn close_send(&mut self) {
        self.journal.record(Event::CloseSend);
        // Dropping the echo script ends the inbound stream once the peer sees the half-close.
        self.echo.take();
    }
}

pub struct MockInbound {
    script: mpsc::UnboundedReceiver<Result<Option<String>, Status>>,
}

#[tonic::async_trait]
impl InboundHalf for MockInbound {
    type Response = String;

    async fn receive(&mut self) -> Result<Option<String>, Status> {
        match self.script.recv().await {
            Some(next) => next,
            None => Ok(None),
        }
    }
}

/// A transport whose peer replies `Hello {name}` to every send and ends its stream after the
/// half-close.
pub fn echo_transport() -> (MockOutbound, MockInbound, Journal) {
    let (tx, rx) = mpsc::unbounded_channel();
    let journal = Journal::default();
    let outbound = MockOutbound {
        journal: journal.clone(),
        attempts: 0,
        fail_on_attempt: None,
        echo: Some(tx),
    };
    (outbound, MockInbound { script: rx }, journal)
}

/// A transport whose inbound side is driven entirely by the returned script.
pub fn scripted_transport() -> (MockOutbound, MockInbound, Script, Journal) {
    let (tx, rx) = mpsc::unbounded_channel();
    let journal = Journal::default();
    let outbound = MockOutbound {
        journal: journal.clone(),
        attempts: 0,
        fail_on_attempt: None,
        echo: None,
    };
    (outbound, MockInbound { script: rx }, tx, journal)
}

/// Collects responses for assertions after the exchange.
#[derive(Debug, Clone, Default)]
pub struct Recorder(pub Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn responses(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl super::observer::ResponseObserver<String> for Recorder {
    fn on_response(&mut self, _index: u64, response: &String) {
        self.0.lock().unwrap().push(response.clone());
    }
}
