//! End-to-end tests over real TCP connections
//!
//! Broadcast ticks are driven explicitly so each test controls exactly when
//! output is produced.


use airsense::protocol::OutputFormat;
use airsense::session::StreamMode;
use test_helpers::TestServer;

const SAMPLE: [f64; 6] = [21.5, 3.0, 4.0, 5.0, 6.0, 7.0];

#[tokio::test]
async fn test_start_streams_csv_reading() {
    let server = TestServer::start(OutputFormat::Csv).await;
    server.publish(100, &SAMPLE).await;

    let mut client = server.connect().await;
    client.send("start").await;
    server.wait_for_modes(StreamMode::is_real_time).await;

    let summary = server.broadcast.tick().await;
    assert_eq!(summary.real_time_sent, 1);
    assert_eq!(client.line().await, "r100,21.5,3,4,5,6,7");

    server.shutdown().await;
}

#[tokio::test]
async fn test_start_streams_json_reading() {
    let server = TestServer::start(OutputFormat::Json).await;
    server.publish(100, &SAMPLE).await;

    let mut client = server.connect().await;
    client.send("start").await;
    server.wait_for_modes(StreamMode::is_real_time).await;

    server.broadcast.tick().await;
    let line = client.line().await;
    let payload = line.strip_prefix('r').expect("real-time tag");
    let value: serde_json::Value = serde_json::from_str(payload).unwrap();
    assert_eq!(value["time"], 100);
    assert_eq!(value["Temp"], 21.5);
    assert_eq!(value["PM25"], 7.0);

    // Keys follow channel order
    let time = payload.find("\"time\"").unwrap();
    let temp = payload.find("\"Temp\"").unwrap();
    let pm = payload.find("\"PM25\"").unwrap();
    assert!(time < temp && temp < pm, "{payload}");

    server.shutdown().await;
}

#[tokio::test]
async fn test_every_tick_sends_latest_reading() {
    let server = TestServer::start(OutputFormat::Csv).await;
    server.publish(100, &SAMPLE).await;

    let mut client = server.connect().await;
    client.send("start").await;
    server.wait_for_modes(StreamMode::is_real_time).await;

    server.broadcast.tick().await;
    assert!(client.line().await.starts_with("r100,"));

    server.publish(103, &SAMPLE).await;
    server.broadcast.tick().await;
    assert!(client.line().await.starts_with("r103,"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_stop_ends_streaming() {
    let server = TestServer::start(OutputFormat::Csv).await;
    server.publish(100, &SAMPLE).await;

    let mut client = server.connect().await;
    client.send("start").await;
    server.wait_for_modes(StreamMode::is_real_time).await;
    server.broadcast.tick().await;
    client.line().await;

    client.send("stop").await;
    server.wait_for_modes(|mode| mode == StreamMode::Idle).await;
    server.broadcast.tick().await;
    client.assert_quiet().await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_history_replays_range_then_marker() {
    let server = TestServer::start(OutputFormat::Csv).await;
    for t in [10, 20, 30] {
        server.publish(t, &SAMPLE).await;
    }

    let mut client = server.connect().await;
    client.send("history 15 30").await;
    server
        .wait_for_modes(|mode| matches!(mode, StreamMode::HistoryPending(_)))
        .await;

    let summary = server.broadcast.tick().await;
    assert_eq!(summary.replays, 1);
    assert_eq!(client.line().await, "h20,21.5,3,4,5,6,7");
    assert_eq!(client.line().await, "h30,21.5,3,4,5,6,7");
    assert_eq!(client.line().await, "h");

    // Back to idle: the next tick sends nothing
    server.broadcast.tick().await;
    client.assert_quiet().await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_history_is_csv_even_in_json_mode() {
    let server = TestServer::start(OutputFormat::Json).await;
    server.publish(10, &SAMPLE).await;

    let mut client = server.connect().await;
    client.send("history 0 10").await;
    server
        .wait_for_modes(|mode| matches!(mode, StreamMode::HistoryPending(_)))
        .await;

    server.broadcast.tick().await;
    assert_eq!(client.line().await, "h10,21.5,3,4,5,6,7");
    assert_eq!(client.line().await, "h");

    server.shutdown().await;
}

#[tokio::test]
async fn test_inverted_history_sends_nothing() {
    let server = TestServer::start(OutputFormat::Csv).await;
    server.publish(20, &SAMPLE).await;

    let mut client = server.connect().await;
    client.send("history 30 15").await;
    server
        .wait_for_modes(|mode| matches!(mode, StreamMode::HistoryPending(_)))
        .await;

    server.broadcast.tick().await;
    server.wait_for_modes(|mode| mode == StreamMode::Idle).await;

    // The first line the client sees is the real-time one
    client.send("start").await;
    server.wait_for_modes(StreamMode::is_real_time).await;
    server.broadcast.tick().await;
    assert_eq!(client.line().await, "r20,21.5,3,4,5,6,7");

    server.shutdown().await;
}

#[tokio::test]
async fn test_garbage_is_ignored() {
    let server = TestServer::start(OutputFormat::Csv).await;
    server.publish(100, &SAMPLE).await;

    let mut client = server.connect().await;
    client.send("START").await;
    client.send("history").await;
    client.send("history 1").await;
    client.send_raw(b"\xff\xfe\n").await;
    client.send_raw(&[b'x'; 2000]).await;
    client.send_raw(b"\r\nstart\r\n").await;
    server.wait_for_modes(StreamMode::is_real_time).await;

    server.broadcast.tick().await;
    assert_eq!(client.line().await, "r100,21.5,3,4,5,6,7");
    assert_eq!(server.registry.len(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_command_split_across_writes() {
    let server = TestServer::start(OutputFormat::Csv).await;
    server.publish(100, &SAMPLE).await;

    let mut client = server.connect().await;
    client.send_raw(b"st").await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    client.send_raw(b"art\n").await;
    server.wait_for_modes(StreamMode::is_real_time).await;

    server.broadcast.tick().await;
    assert!(client.line().await.starts_with("r100,"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_no_output_before_first_reading() {
    let server = TestServer::start(OutputFormat::Csv).await;

    let mut client = server.connect().await;
    client.send("start").await;
    server.wait_for_modes(StreamMode::is_real_time).await;

    let summary = server.broadcast.tick().await;
    assert!(summary.skipped);
    client.assert_quiet().await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_disconnect_unregisters() {
    let server = TestServer::start(OutputFormat::Csv).await;
    let client = server.connect().await;
    assert_eq!(server.registry.len(), 1);

    drop(client);
    server.wait_for_connections(0).await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_clients_are_independent() {
    let server = TestServer::start(OutputFormat::Csv).await;
    server.publish(100, &SAMPLE).await;

    let mut streaming = server.connect().await;
    let mut idle = server.connect().await;
    let leaving = server.connect().await;

    streaming.send("start").await;
    tokio::time::timeout(test_helpers::LINE_TIMEOUT, async {
        while !server
            .registry
            .snapshot()
            .iter()
            .any(|h| h.mode().mode().is_real_time())
        {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    drop(leaving);
    server.wait_for_connections(2).await;

    let summary = server.broadcast.tick().await;
    assert_eq!(summary.real_time_sent, 1);
    assert_eq!(streaming.line().await, "r100,21.5,3,4,5,6,7");
    idle.assert_quiet().await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_closes_clients() {
    let server = TestServer::start(OutputFormat::Csv).await;
    let mut client = server.connect().await;

    server.shutdown().await;
    client.expect_eof().await;
}
