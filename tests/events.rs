//! Event, unexpected error and unknown message notifications.

mod common;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use webdriver_bidi::{Driver, EventReceived, LogLevel, LogMessage};

use common::{RemoteEnd, TEST_WAIT, TestCommand, TestEventArgs, init_tracing};

async fn connected_driver(remote: &RemoteEnd) -> anyhow::Result<Driver> {
    let driver = Driver::builder().build()?;
    driver.start(remote.url()).await?;
    Ok(driver)
}

/// Runs one command round trip. Inbound messages sent before the reply are
/// classified before the command completes.
async fn flush(driver: &Driver, remote: &mut RemoteEnd) -> anyhow::Result<()> {
    let command = TestCommand::new("flush");
    let (result, answered) = tokio::join!(driver.execute_command(&command), async {
        let id = remote.next_command_id().await?;
        remote.reply_value(id, "flushed")
    });
    answered?;
    result?;
    Ok(())
}

#[tokio::test]
async fn test_registered_event_fires_once() -> anyhow::Result<()> {
    init_tracing();
    let mut remote = RemoteEnd::bind().await?;
    let driver = connected_driver(&remote).await?;
    driver.register_event::<TestEventArgs>("module.event");

    let (tx, mut rx) = mpsc::unbounded_channel();
    driver.event_received().add_observer(move |event: &EventReceived| {
        let _ = tx.send(event.clone());
    });

    remote.send(r#"{"method":"module.event","params":{"paramName":"x"}}"#)?;
    flush(&driver, &mut remote).await?;

    let event = tokio::time::timeout(TEST_WAIT, rx.recv())
        .await?
        .expect("observer alive");
    assert_eq!(event.name, "module.event");
    assert_eq!(event.module(), "module");
    let args = event
        .payload()
        .downcast_ref::<TestEventArgs>()
        .expect("registered payload type");
    assert_eq!(args.param_name, "x");
    assert!(rx.try_recv().is_err());

    driver.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_events_raised_in_arrival_order() -> anyhow::Result<()> {
    init_tracing();
    let mut remote = RemoteEnd::bind().await?;
    let driver = connected_driver(&remote).await?;
    driver.register_event::<TestEventArgs>("module.event");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    driver.event_received().add_observer(move |event: &EventReceived| {
        if let Some(args) = event.payload().downcast_ref::<TestEventArgs>() {
            seen_clone.lock().push(args.param_name.clone());
        }
    });

    for i in 0..50 {
        remote.send(format!(
            r#"{{"type":"event","method":"module.event","params":{{"paramName":"e{i}"}}}}"#
        ))?;
    }
    flush(&driver, &mut remote).await?;

    let expected: Vec<String> = (0..50).map(|i| format!("e{i}")).collect();
    assert_eq!(*seen.lock(), expected);

    driver.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_invalid_json_is_one_unknown_message_and_one_error_log() -> anyhow::Result<()> {
    init_tracing();
    let mut remote = RemoteEnd::bind().await?;
    let driver = connected_driver(&remote).await?;

    let unknown = Arc::new(Mutex::new(Vec::new()));
    let unknown_clone = Arc::clone(&unknown);
    driver
        .unknown_message()
        .add_observer(move |message: &webdriver_bidi::UnknownMessage| {
            unknown_clone.lock().push(message.message.clone());
        });

    let errors = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = Arc::clone(&errors);
    driver.log_message().add_observer(move |log: &LogMessage| {
        if log.level == LogLevel::Error {
            errors_clone.lock().push(log.clone());
        }
    });

    remote.send("{definitely not json")?;
    flush(&driver, &mut remote).await?;

    assert_eq!(*unknown.lock(), vec!["{definitely not json".to_string()]);
    assert_eq!(errors.lock().len(), 1);
    assert!(driver.is_connected());

    driver.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_unregistered_event_is_unknown_message() -> anyhow::Result<()> {
    init_tracing();
    let mut remote = RemoteEnd::bind().await?;
    let driver = connected_driver(&remote).await?;

    let events = Arc::new(Mutex::new(0usize));
    let events_clone = Arc::clone(&events);
    driver
        .event_received()
        .add_observer(move |_: &EventReceived| *events_clone.lock() += 1);

    let unknown = Arc::new(Mutex::new(0usize));
    let unknown_clone = Arc::clone(&unknown);
    driver
        .unknown_message()
        .add_observer(move |_: &webdriver_bidi::UnknownMessage| *unknown_clone.lock() += 1);

    remote.send(r#"{"type":"event","method":"log.entryAdded","params":{}}"#)?;
    flush(&driver, &mut remote).await?;

    assert_eq!(*events.lock(), 0);
    assert_eq!(*unknown.lock(), 1);

    driver.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_out_of_band_error_raises_unexpected_error() -> anyhow::Result<()> {
    init_tracing();
    let mut remote = RemoteEnd::bind().await?;
    let driver = connected_driver(&remote).await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    driver
        .unexpected_error()
        .add_observer(move |error: &webdriver_bidi::ErrorResponse| {
            let _ = tx.send(error.clone());
        });

    remote.send(r#"{"type":"error","id":null,"error":"unknown error","message":"boom"}"#)?;
    flush(&driver, &mut remote).await?;

    let error = tokio::time::timeout(TEST_WAIT, rx.recv())
        .await?
        .expect("observer alive");
    assert_eq!(error.id, None);
    assert_eq!(error.error, "unknown error");
    assert_eq!(error.message, "boom");

    driver.stop().await;
    Ok(())
}
