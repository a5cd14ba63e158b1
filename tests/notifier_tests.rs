use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ema_sentinel::model::alert::AlertEvent;
use ema_sentinel::model::signal::SignalKind;
use ema_sentinel::notifier::{
    alert_copy, spawn_dispatcher, AlertNotifier, DesktopNotifier, LogNotifier, NotifierSet,
};

fn alert(kind: SignalKind) -> AlertEvent {
    AlertEvent {
        id: "a-1".to_string(),
        symbol: "BTC/USDT".to_string(),
        timestamp_ms: 0,
        price: 65_432.1,
        kind,
    }
}

struct Failing;

impl AlertNotifier for Failing {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn notify(&self, _alert: &AlertEvent) -> anyhow::Result<()> {
        anyhow::bail!("no permission")
    }
}

struct Counting(Arc<AtomicUsize>);

impl AlertNotifier for Counting {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn notify(&self, _alert: &AlertEvent) -> anyhow::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn copy_differs_per_kind() {
    let bull = alert_copy(SignalKind::BullishCross, "BTC/USDT", 65_432.1);
    let bear = alert_copy(SignalKind::BearishCross, "BTC/USDT", 65_432.1);
    let touch = alert_copy(SignalKind::Touch, "BTC/USDT", 0.000123);
    assert_eq!(bull.title, "BTC/USDT Golden cross");
    assert_eq!(bull.body, "fast EMA crossed above slow EMA at 65432.10");
    assert_eq!(bear.title, "BTC/USDT Dead cross");
    assert!(bear.body.contains("below"));
    assert_eq!(touch.title, "BTC/USDT EMA touch");
    assert!(touch.body.ends_with("0.000123"));
}

#[test]
fn failures_do_not_stop_other_notifiers() {
    let count = Arc::new(AtomicUsize::new(0));
    let set = NotifierSet::new()
        .with(Box::new(Failing))
        .with(Box::new(LogNotifier))
        .with(Box::new(Counting(count.clone())));
    assert_eq!(set.len(), 3);
    assert_eq!(set.dispatch(&alert(SignalKind::Touch)), 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn desktop_command_parsing() {
    let desktop = DesktopNotifier::from_command_line("notify-send -u critical").unwrap();
    assert_eq!(desktop.program(), "notify-send");
    assert!(DesktopNotifier::from_command_line("   ").is_none());
}

#[test]
fn dispatcher_drains_queue_until_senders_drop() {
    let count = Arc::new(AtomicUsize::new(0));
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(async {
        let set = NotifierSet::new().with(Box::new(Counting(count.clone())));
        let (tx, handle) = spawn_dispatcher(set, 4);
        tx.try_send(alert(SignalKind::Touch)).unwrap();
        tx.try_send(alert(SignalKind::BullishCross)).unwrap();
        drop(tx);
        handle.await.unwrap();
    });
    assert_eq!(count.load(Ordering::SeqCst), 2);
}
