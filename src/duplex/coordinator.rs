use std::future::{Future, pending};
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::duplex::cancel::CancellationSignal;
use crate::duplex::completion::{
    CompletionSignal, CompletionWaiter, DrainOutcome, DrainReport, completion_channel,
};
use crate::duplex::config::ExchangeConfig;
use crate::duplex::error::ExchangeError;
use crate::duplex::observer::ResponseObserver;
use crate::duplex::stream::{DuplexStream, InboundHalf, OutboundHalf, StreamOpener};
use crate::state_machine::StateMachine;
use crate::state_machine::exchange::{ExchangeInput, ExchangeMachine, ExchangeOutput};

/// Counts reported by a successful exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeSummary {
    pub sent: usize,
    pub received: u64,
}

/// Drives one bidirectional exchange over a duplex stream.
///
/// The inbound drainer is spawned as its own task before the first send. The outbound driver runs
/// on the caller's task, sends each request in order with the configured delay between them, then
/// half-closes. [`run`](Self::run) returns only once the drainer has signalled completion.
///
/// On any failure both drivers unwind: the outbound side stops sending, the drainer stops
/// receiving, and the error is returned after the drainer has confirmed it stopped.
///
/// # Example
///
/// ```ignore
/// let coordinator = DuplexCoordinator::new(ExchangeConfig::default());
/// let summary = coordinator
///     .open_and_run(&mut opener, requests, LogObserver::new())
///     .await?;
/// info!(sent = summary.sent, received = summary.received, "Exchange finished");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DuplexCoordinator {
    config: ExchangeConfig,
    cancellation: Option<CancellationSignal>,
}

enum OutboundEnd {
    Finished { sent: usize },
    Failed { sent: usize, source: tonic::Status },
    Unwound { sent: usize },
    Stopped(StopReason),
}

#[derive(Debug, Clone, Copy)]
enum StopReason {
    Cancelled,
    Deadline(Duration),
}

impl From<StopReason> for ExchangeError {
    fn from(reason: StopReason) -> Self {
        match reason {
            StopReason::Cancelled => ExchangeError::Cancelled,
            StopReason::Deadline(timeout) => ExchangeError::TimedOut(timeout),
        }
    }
}

impl DuplexCoordinator {
    pub fn new(config: ExchangeConfig) -> Self {
        Self {
            config,
            cancellation: None,
        }
    }

    /// Abort the exchange when `signal` is cancelled.
    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancellation = Some(signal);
        self
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Open a duplex stream with `opener` and run the exchange on it.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::StreamOpen`] without starting either driver if the stream could not
    /// be opened, otherwise any error of [`run`](Self::run). The timeout and cancellation already
    /// apply while opening, and the timeout covers opening and the exchange together.
    pub async fn open_and_run<O, I, R>(
        &self,
        opener: &mut O,
        requests: I,
        observer: R,
    ) -> Result<ExchangeSummary, ExchangeError>
    where
        O: StreamOpener,
        I: IntoIterator<Item = <<O::Stream as DuplexStream>::Sender as OutboundHalf>::Request>,
        I::IntoIter: Send,
        R: ResponseObserver<<<O::Stream as DuplexStream>::Receiver as InboundHalf>::Response>
            + Send
            + 'static,
    {
        let stop = stop_requested(self.cancellation.clone(), self.config.timeout);
        tokio::pin!(stop);

        let opened = tokio::select! {
            biased;
            reason = &mut stop => {
                warn!(reason = ?reason, "Stopped while opening duplex stream");
                return Err(reason.into());
            }
            opened = opener.open() => opened,
        };
        let stream = opened.map_err(|status| {
            warn!(code = ?status.code(), message = %status.message(), "Failed to open duplex stream");
            ExchangeError::StreamOpen(status)
        })?;

        self.run_until(requests, stream, observer, stop).await
    }

    /// Run the exchange on an already open duplex stream.
    ///
    /// # Errors
    ///
    /// * [`ExchangeError::Send`] if the transport rejected a send
    /// * [`ExchangeError::Receive`] if the inbound direction failed
    /// * [`ExchangeError::Cancelled`] or [`ExchangeError::TimedOut`] if the exchange was stopped
    /// * [`ExchangeError::DrainerLost`] if the drainer died without signalling completion
    pub async fn run<S, I, R>(
        &self,
        requests: I,
        stream: S,
        observer: R,
    ) -> Result<ExchangeSummary, ExchangeError>
    where
        S: DuplexStream,
        I: IntoIterator<Item = <S::Sender as OutboundHalf>::Request>,
        I::IntoIter: Send,
        R: ResponseObserver<<S::Receiver as InboundHalf>::Response> + Send + 'static,
    {
        let stop = stop_requested(self.cancellation.clone(), self.config.timeout);
        tokio::pin!(stop);

        self.run_until(requests, stream, observer, stop).await
    }

    async fn run_until<S, I, R, F>(
        &self,
        requests: I,
        stream: S,
        observer: R,
        mut stop: Pin<&mut F>,
    ) -> Result<ExchangeSummary, ExchangeError>
    where
        S: DuplexStream,
        I: IntoIterator<Item = <S::Sender as OutboundHalf>::Request>,
        I::IntoIter: Send,
        R: ResponseObserver<<S::Receiver as InboundHalf>::Response> + Send + 'static,
        F: Future<Output = StopReason>,
    {
        let (mut outbound, inbound) = stream.split();
        let unwind = CancellationSignal::new();
        let (signal, mut completion) = completion_channel();
        let mut machine = ExchangeMachine::new();

        tokio::spawn(drain_inbound(inbound, observer, unwind.clone(), signal));
        advance(&mut machine, ExchangeInput::Started);

        let end = tokio::select! {
            biased;
            reason = &mut stop => OutboundEnd::Stopped(reason),
            end = drive_outbound(
                &mut outbound,
                requests,
                self.config.inter_message_delay,
                &unwind,
            ) => end,
        };

        match &end {
            OutboundEnd::Finished { sent } => {
                outbound.close_send();
                debug!(sent = *sent, "Outbound half-closed");
                advance(&mut machine, ExchangeInput::OutboundClosed);
            }
            OutboundEnd::Failed { .. } | OutboundEnd::Stopped(_) => {
                unwind.cancel();
                advance(&mut machine, ExchangeInput::Failed);
            }
            OutboundEnd::Unwound { .. } => {}
        }

        let drained = match end {
            OutboundEnd::Stopped(_) => completion.wait().await,
            _ => await_drainer(&mut completion, &mut stop, &unwind).await,
        };

        // Release the request side on every path before reporting.
        drop(outbound);

        let result = match (end, drained) {
            (OutboundEnd::Stopped(reason), _) => Err(reason.into()),
            (OutboundEnd::Failed { sent, source }, _) => Err(ExchangeError::Send { sent, source }),
            (_, Err(error)) => Err(error),
            (OutboundEnd::Finished { sent }, Ok(report)) if !report.unwound => Ok(ExchangeSummary {
                sent,
                received: report.received,
            }),
            // The drainer only unwinds without an error of its own when told to stop.
            (OutboundEnd::Finished { .. } | OutboundEnd::Unwound { .. }, Ok(_)) => {
                Err(ExchangeError::Cancelled)
            }
        };

        match &result {
            Ok(summary) => {
                advance(&mut machine, ExchangeInput::InboundDrained);
                info!(
                    sent = summary.sent,
                    received = summary.received,
                    phase = %machine.phase(),
                    "Duplex exchange finished"
                );
            }
            Err(error) => {
                advance(&mut machine, ExchangeInput::Failed);
                warn!(
                    error = %error,
                    direction = ?error.direction(),
                    phase = %machine.phase(),
                    "Duplex exchange aborted"
                );
            }
        }

        result
    }
}

fn advance(machine: &mut ExchangeMachine, input: ExchangeInput) {
    machine.process_input(input);
    while let Some(ExchangeOutput::PhaseChanged(phase)) = machine.poll_output() {
        debug!(phase = %phase, "Exchange phase changed");
    }
}

/// Resolves when the caller cancels or the exchange deadline passes.
async fn stop_requested(
    cancellation: Option<CancellationSignal>,
    timeout: Option<Duration>,
) -> StopReason {
    let cancelled = async {
        match &cancellation {
            Some(signal) => signal.cancelled().await,
            None => pending::<()>().await,
        }
    };
    let deadline = async {
        match timeout {
            Some(timeout) => {
                tokio::time::sleep(timeout).await;
                timeout
            }
            None => pending::<Duration>().await,
        }
    };

    tokio::select! {
        _ = cancelled => StopReason::Cancelled,
        timeout = deadline => StopReason::Deadline(timeout),
    }
}

/// Wait for the drainer while still honouring a stop request.
///
/// A stop request while waiting tells the drainer to unwind and still waits for its
/// confirmation, so the drainer task never outlives the exchange.
async fn await_drainer<F>(
    completion: &mut CompletionWaiter,
    stop: &mut Pin<&mut F>,
    unwind: &CancellationSignal,
) -> DrainOutcome
where
    F: Future<Output = StopReason>,
{
    let reason = tokio::select! {
        biased;
        outcome = completion.wait() => return outcome,
        reason = stop.as_mut() => reason,
    };

    debug!(reason = ?reason, "Stop requested while draining");
    unwind.cancel();
    match completion.wait().await {
        Ok(_) => Err(reason.into()),
        Err(error) => Err(error),
    }
}

async fn drive_outbound<O, I>(
    outbound: &mut O,
    requests: I,
    delay: Duration,
    unwind: &CancellationSignal,
) -> OutboundEnd
where
    O: OutboundHalf,
    I: IntoIterator<Item = O::Request>,
{
    let mut requests = requests.into_iter().peekable();
    let mut sent = 0;

    while let Some(request) = requests.next() {
        tokio::select! {
            biased;
            _ = unwind.cancelled() => {
                debug!(sent, "Outbound driver unwinding");
                return OutboundEnd::Unwound { sent };
            }
            result = outbound.send(request) => {
                if let Err(source) = result {
                    warn!(sent, code = ?source.code(), message = %source.message(), "Send failed");
                    return OutboundEnd::Failed { sent, source };
                }
            }
        }

        sent += 1;
        debug!(sent, "Request sent");

        if requests.peek().is_some() && !delay.is_zero() {
            tokio::select! {
                biased;
                _ = unwind.cancelled() => {
                    debug!(sent, "Outbound driver unwinding");
                    return OutboundEnd::Unwound { sent };
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    OutboundEnd::Finished { sent }
}

async fn drain_inbound<I, R>(
    mut inbound: I,
    mut observer: R,
    unwind: CancellationSignal,
    signal: CompletionSignal,
) where
    I: InboundHalf,
    R: ResponseObserver<I::Response>,
{
    // Dying before the signal fires (a panicking observer) must still stop the outbound driver.
    let guard = unwind.drop_guard();
    let mut received = 0u64;

    let outcome = loop {
        tokio::select! {
            biased;
            _ = unwind.cancelled() => {
                debug!(received, "Inbound drainer unwinding");
                break Ok(DrainReport { received, unwound: true });
            }
            next = inbound.receive() => match next {
                Ok(Some(response)) => {
                    observer.on_response(received, &response);
                    received += 1;
                }
                Ok(None) => {
                    debug!(received, "Inbound end-of-stream");
                    break Ok(DrainReport { received, unwound: false });
                }
                Err(source) => {
                    warn!(received, code = ?source.code(), message = %source.message(), "Receive failed");
                    unwind.cancel();
                    break Err(ExchangeError::Receive { received, source });
                }
            },
        }
    };

    signal.fire(outcome);
    guard.disarm();
}
