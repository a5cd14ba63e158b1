use crate::model::alert::AlertEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum WsConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting { attempt: u32, delay_ms: u64 },
}

/// Out-of-band events from feed workers and the engine task.
#[derive(Debug, Clone)]
pub enum AppEvent {
    WsStatus {
        stream: String,
        status: WsConnectionStatus,
    },
    Alert(AlertEvent),
}
