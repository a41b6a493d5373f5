//! Command execution against an in-process remote end.

mod common;

use std::time::Duration;

use serde_json::json;
use tokio_test::assert_ok;
use webdriver_bidi::{CommandId, CommandResponse, Driver, Error, Transport, TransportOptions};

use common::{RemoteEnd, TestCommand, TestResult, init_tracing};

async fn connected_driver(remote: &RemoteEnd) -> anyhow::Result<Driver> {
    let driver = Driver::builder()
        .command_timeout(Duration::from_secs(5))
        .build()?;
    driver.start(remote.url()).await?;
    Ok(driver)
}

#[tokio::test]
async fn test_execute_command_returns_typed_result() -> anyhow::Result<()> {
    init_tracing();
    let mut remote = RemoteEnd::bind().await?;
    let driver = connected_driver(&remote).await?;

    let command = TestCommand::new("p");
    let (result, frame) = tokio::join!(driver.execute_command(&command), async {
        let frame = remote.next_command().await?;
        remote.send(r#"{"id":1,"result":{"value":"v"}}"#)?;
        anyhow::Ok(frame)
    });

    let frame = frame?;
    assert_eq!(frame["id"], json!(1));
    assert_eq!(frame["method"], json!("module.command"));
    assert_eq!(frame["params"], json!({"paramName": "p"}));
    assert_eq!(
        assert_ok!(result),
        TestResult {
            value: "v".to_string()
        }
    );

    driver.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_error_response_fails_command() -> anyhow::Result<()> {
    init_tracing();
    let mut remote = RemoteEnd::bind().await?;
    let driver = connected_driver(&remote).await?;

    let command = TestCommand::new("p");
    let (result, answered) = tokio::join!(driver.execute_command(&command), async {
        let id = remote.next_command_id().await?;
        remote.send(format!(
            r#"{{"id":{id},"error":"unknown command","message":"bad"}}"#
        ))
    });
    answered?;

    let err = result.expect_err("error response must fail the command");
    assert!(err.is_remote_error());
    let message = err.to_string();
    assert!(message.contains("unknown command"));
    assert!(message.contains("bad"));

    driver.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_session_status_round_trip() -> anyhow::Result<()> {
    init_tracing();
    let mut remote = RemoteEnd::bind().await?;
    let driver = connected_driver(&remote).await?;
    let session = driver.session()?;

    let (status, answered) = tokio::join!(session.status(), async {
        let frame = remote.next_command().await?;
        assert_eq!(frame["method"], json!("session.status"));
        assert_eq!(frame["params"], json!({}));
        remote.send(
            json!({
                "type": "success",
                "id": frame["id"],
                "result": {"ready": true, "message": "ok"},
            })
            .to_string(),
        )
    });
    answered?;

    let status = status?;
    assert!(status.ready);
    assert_eq!(status.message, "ok");

    driver.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_concurrent_commands_correlate_with_reversed_replies() -> anyhow::Result<()> {
    init_tracing();
    let mut remote = RemoteEnd::bind().await?;
    let transport = Transport::new(TransportOptions::default());
    transport.connect(remote.url()).await?;

    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(transport.send_command(&TestCommand::new(format!("p{i}"))).await?);
    }

    let mut wire_ids = Vec::new();
    for _ in 0..5 {
        wire_ids.push(remote.next_command_id().await?);
    }
    for id in wire_ids.iter().rev() {
        remote.reply_value(*id, &format!("r{id}"))?;
    }

    for id in ids {
        transport
            .wait_for_command_complete(id, Some(common::TEST_WAIT))
            .await?;
        let CommandResponse::Success(success) = transport.get_command_response(id)? else {
            panic!("command {id} resolved with an error response");
        };
        assert_eq!(success.into_result::<TestResult>()?.value, format!("r{id}"));
    }
    assert_eq!(transport.pending_count(), 0);

    transport.disconnect().await;
    Ok(())
}

#[tokio::test]
async fn test_command_timeout_leaves_entry_resolvable() -> anyhow::Result<()> {
    init_tracing();
    let mut remote = RemoteEnd::bind().await?;
    let transport = Transport::new(TransportOptions::default());
    transport.connect(remote.url()).await?;

    let id = transport.send_command(&TestCommand::new("p")).await?;
    remote.next_command().await?;

    let waited = transport
        .wait_for_command_complete(id, Some(Duration::from_millis(100)))
        .await;
    assert!(matches!(waited, Err(Error::CommandTimeout { .. })));
    assert_eq!(transport.pending_count(), 1);

    let response = transport.get_command_response(id);
    assert!(response.is_err_and(|e| e.is_timeout()));

    // A late reply is ignored without disturbing the pipeline.
    remote.reply_value(id.as_u64(), "late")?;

    let next = transport.send_command(&TestCommand::new("q")).await?;
    let next_wire = remote.next_command_id().await?;
    remote.reply_value(next_wire, "fresh")?;
    transport
        .wait_for_command_complete(next, Some(common::TEST_WAIT))
        .await?;
    assert!(!transport.get_command_response(next)?.is_error());

    transport.disconnect().await;
    Ok(())
}

#[tokio::test]
async fn test_execute_command_times_out() -> anyhow::Result<()> {
    init_tracing();
    let mut remote = RemoteEnd::bind().await?;
    let driver = Driver::builder()
        .command_timeout(Duration::from_millis(150))
        .build()?;
    driver.start(remote.url()).await?;

    let command = TestCommand::new("p");
    let (result, received) = tokio::join!(driver.execute_command(&command), remote.next_command());
    received?;

    let err = result.expect_err("no reply was sent");
    assert!(err.is_timeout());

    driver.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_wait_for_unknown_command_id() -> anyhow::Result<()> {
    init_tracing();
    let transport = Transport::new(TransportOptions::default());

    let result = transport
        .wait_for_command_complete(CommandId::new(999), None)
        .await;

    let err = result.expect_err("id was never sent");
    assert!(matches!(err, Error::UnknownCommandId { .. }));
    assert!(err.to_string().to_lowercase().contains("unknown command id"));
    Ok(())
}
