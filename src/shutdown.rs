use tokio::sync::broadcast;

/// Process-wide stop signal, fanned out to the scheduler and the control server.
pub type ShutdownSender = broadcast::Sender<()>;
pub type ShutdownReceiver = broadcast::Receiver<()>;
