use std::fmt::Debug;

use impl_trait_for_tuples::impl_for_tuples;
use tracing::info;

/// Receives each inbound response as the drainer reads it, in receipt order.
///
/// Observers compose as tuples: `(LogObserver, recorder)` hands every response to both.
pub trait ResponseObserver<Resp> {
    /// `index` counts responses from zero in the order they arrived.
    fn on_response(&mut self, index: u64, response: &Resp);
}

#[impl_for_tuples(1, 8)]
impl<Resp> ResponseObserver<Resp> for Tuple {
    for_tuples!( where #( Tuple: ResponseObserver<Resp> )* );

    fn on_response(&mut self, index: u64, response: &Resp) {
        for_tuples!( #( Tuple.on_response(index, response); )* );
    }
}

/// Logs every response at `info` level.
#[derive(Debug, Clone, Default)]
pub struct LogObserver {
    label: Option<&'static str>,
}

impl LogObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag each log line with the name of the call being observed.
    pub fn labelled(label: &'static str) -> Self {
        Self { label: Some(label) }
    }
}

impl<Resp: Debug> ResponseObserver<Resp> for LogObserver {
    fn on_response(&mut self, index: u64, response: &Resp) {
        info!(
            call = self.label.unwrap_or("duplex"),
            index = index,
            response = ?response,
            "Received response"
        );
    }
}
