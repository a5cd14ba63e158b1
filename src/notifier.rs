use std::io::Write;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::model::alert::AlertEvent;
use crate::model::signal::SignalKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertCopy {
    pub title: String,
    pub body: String,
}

pub fn alert_copy(kind: SignalKind, symbol: &str, price: f64) -> AlertCopy {
    let (title, detail) = match kind {
        SignalKind::BullishCross => ("Golden cross", "fast EMA crossed above slow EMA"),
        SignalKind::BearishCross => ("Dead cross", "fast EMA crossed below slow EMA"),
        SignalKind::Touch => ("EMA touch", "fast and slow EMA are converging"),
    };
    AlertCopy {
        title: format!("{} {}", symbol, title),
        body: format!("{} at {}", detail, format_price(price)),
    }
}

fn format_price(price: f64) -> String {
    if price.abs() >= 1.0 {
        format!("{:.2}", price)
    } else {
        format!("{:.6}", price)
    }
}

/// A best-effort side effect for a recorded alert.
pub trait AlertNotifier: Send + Sync {
    fn name(&self) -> &'static str;
    fn notify(&self, alert: &AlertEvent) -> Result<()>;
}

pub struct LogNotifier;

impl AlertNotifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    fn notify(&self, alert: &AlertEvent) -> Result<()> {
        let copy = alert_copy(alert.kind, &alert.symbol, alert.price);
        tracing::info!(
            id = %alert.id,
            timestamp_ms = alert.timestamp_ms,
            title = %copy.title,
            body = %copy.body,
            "Alert"
        );
        Ok(())
    }
}

/// Runs an external command (e.g. `notify-send`) with title and body as the
/// last two arguments. The child is not awaited.
pub struct DesktopNotifier {
    program: String,
    args: Vec<String>,
}

impl DesktopNotifier {
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl AlertNotifier for DesktopNotifier {
    fn name(&self) -> &'static str {
        "desktop"
    }

    fn notify(&self, alert: &AlertEvent) -> Result<()> {
        let copy = alert_copy(alert.kind, &alert.symbol, alert.price);
        tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&copy.title)
            .arg(&copy.body)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.program))?;
        Ok(())
    }
}

/// Terminal bell on stderr.
pub struct BellNotifier;

impl AlertNotifier for BellNotifier {
    fn name(&self) -> &'static str {
        "bell"
    }

    fn notify(&self, _alert: &AlertEvent) -> Result<()> {
        let mut err = std::io::stderr().lock();
        err.write_all(b"\x07").context("bell write failed")?;
        err.flush().context("bell flush failed")?;
        Ok(())
    }
}

#[derive(Default)]
pub struct NotifierSet {
    notifiers: Vec<Box<dyn AlertNotifier>>,
}

impl NotifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, notifier: Box<dyn AlertNotifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Fans out to every notifier. Failures are logged and counted, never
    /// returned.
    pub fn dispatch(&self, alert: &AlertEvent) -> usize {
        let mut failures = 0;
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(alert) {
                failures += 1;
                tracing::warn!(
                    notifier = notifier.name(),
                    id = %alert.id,
                    error = %e,
                    "Alert notification failed"
                );
            }
        }
        failures
    }
}

/// Moves notification work off the tick path. Feed alerts with `try_send`;
/// the task ends when every sender is dropped.
pub fn spawn_dispatcher(
    notifiers: NotifierSet,
    capacity: usize,
) -> (mpsc::Sender<AlertEvent>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<AlertEvent>(capacity.max(1));
    let handle = tokio::spawn(async move {
        while let Some(alert) = rx.recv().await {
            notifiers.dispatch(&alert);
        }
        tracing::debug!("Alert dispatcher exiting");
    });
    (tx, handle)
}
