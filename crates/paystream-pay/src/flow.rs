/// Observable progress of one paid request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentPhase {
    /// Unpaid request in flight.
    Probing,
    /// Server answered 402 asking for `amount`.
    PaymentRequired { amount: u64 },
    /// Waiting on the wallet.
    Signing,
    /// Paid request in flight.
    Submitting,
    Completed,
}

/// Receives [`PaymentPhase`] transitions as they happen.
pub trait FlowObserver: Send + Sync {
    fn on_phase(&self, phase: &PaymentPhase);
}

impl<F> FlowObserver for F
where
    F: Fn(&PaymentPhase) + Send + Sync,
{
    fn on_phase(&self, phase: &PaymentPhase) {
        self(phase);
    }
}

/// Observer that ignores every transition.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl FlowObserver for NoopObserver {
    fn on_phase(&self, _phase: &PaymentPhase) {}
}
