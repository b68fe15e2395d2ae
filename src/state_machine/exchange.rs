use std::collections::VecDeque;
use std::fmt;

use super::StateMachine;

/// Lifecycle phase of a single duplex exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    Init,
    /// Both drivers are active.
    Streaming,
    /// Half-close was sent, the inbound direction may still be active.
    OutboundDone,
    /// The inbound direction reached end-of-stream, the outbound driver may still be sending.
    InboundDone,
    /// Both directions terminated cleanly.
    Complete,
    /// A driver failed, or the exchange was cancelled.
    Aborted,
}

impl ExchangePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExchangePhase::Complete | ExchangePhase::Aborted)
    }
}

impl fmt::Display for ExchangePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExchangePhase::Init => "INIT",
            ExchangePhase::Streaming => "STREAMING",
            ExchangePhase::OutboundDone => "OUT_DONE",
            ExchangePhase::InboundDone => "IN_DONE",
            ExchangePhase::Complete => "COMPLETE",
            ExchangePhase::Aborted => "ABORTED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeInput {
    Started,
    OutboundClosed,
    InboundDrained,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutput {
    PhaseChanged(ExchangePhase),
}

/// Tracks the phase of a duplex exchange from the events the coordinator observes.
///
/// Events that do not apply to the current phase (a second half-close, anything after a terminal
/// phase) leave the phase unchanged.
#[derive(Debug)]
pub struct ExchangeMachine {
    phase: ExchangePhase,
    outbound_closed: bool,
    inbound_drained: bool,
    pending: VecDeque<ExchangePhase>,
}

impl ExchangeMachine {
    pub fn new() -> Self {
        Self {
            phase: ExchangePhase::Init,
            outbound_closed: false,
            inbound_drained: false,
            pending: VecDeque::new(),
        }
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    fn transition(&mut self, next: ExchangePhase) {
        if self.phase != next {
            self.phase = next;
            self.pending.push_back(next);
        }
    }

    fn start(&mut self) {
        if self.phase == ExchangePhase::Init {
            self.transition(ExchangePhase::Streaming);
        }
    }

    fn close_outbound(&mut self) {
        if self.phase.is_terminal() || self.phase == ExchangePhase::Init || self.outbound_closed {
            return;
        }
        self.outbound_closed = true;
        self.settle();
    }

    fn drain_inbound(&mut self) {
        if self.phase.is_terminal() || self.phase == ExchangePhase::Init || self.inbound_drained {
            return;
        }
        self.inbound_drained = true;
        self.settle();
    }

    fn fail(&mut self) {
        if !self.phase.is_terminal() {
            self.transition(ExchangePhase::Aborted);
        }
    }

    fn settle(&mut self) {
        let next = match (self.outbound_closed, self.inbound_drained) {
            (true, true) => ExchangePhase::Complete,
            (true, false) => ExchangePhase::OutboundDone,
            (false, true) => ExchangePhase::InboundDone,
            (false, false) => ExchangePhase::Streaming,
        };
        self.transition(next);
    }
}

impl Default for ExchangeMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine for ExchangeMachine {
    type Input = ExchangeInput;
    type Output = ExchangeOutput;

    fn process_input(&mut self, input: Self::Input) {
        match input {
            ExchangeInput::Started => self.start(),
            ExchangeInput::OutboundClosed => self.close_outbound(),
            ExchangeInput::InboundDrained => self.drain_inbound(),
            ExchangeInput::Failed => self.fail(),
        }
    }

    fn poll_output(&mut self) -> Option<Self::Output> {
        self.pending.pop_front().map(ExchangeOutput::PhaseChanged)
    }
}
