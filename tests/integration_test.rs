use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sensorflow_dashboard::{
    routes, BatchFn, Cadence, DashboardController, DashboardSession, DashboardSettings, Producer,
    Reading, RetentionPolicy, SharedDashboard, Subscription,
};

#[derive(Debug, Deserialize)]
struct Card {
    sensor_id: String,
    timestamp: DateTime<Utc>,
    air_quality: f64,
    air_quality_level: String,
}

#[derive(Debug, Deserialize)]
struct View {
    visible_readings: Vec<Card>,
    current_page: usize,
    total_pages: usize,
    paused: bool,
    time_window_ms: Option<i64>,
    retained_count: usize,
    filtered_count: usize,
}

/// Producer driven by the test through a channel instead of a timer.
struct ChannelProducer {
    batches: Mutex<Option<mpsc::UnboundedReceiver<Vec<Reading>>>>,
}

impl Producer for ChannelProducer {
    fn subscribe(&self, _cadence: Cadence, mut on_batch: BatchFn) -> Result<Subscription> {
        // ---
        let mut rx = self
            .batches
            .lock()
            .take()
            .ok_or_else(|| anyhow::anyhow!("already subscribed"))?;
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    batch = rx.recv() => match batch {
                        Some(batch) => on_batch(batch),
                        None => break,
                    },
                }
            }
        });

        Ok(Subscription::new(cancel, handle))
    }
}

fn reading(sensor_id: &str, age_secs: i64, air_quality: f64) -> Reading {
    // ---
    Reading {
        sensor_id: sensor_id.to_string(),
        timestamp: Utc::now() - TimeDelta::seconds(age_secs),
        temperature: 22.0,
        humidity: 45.0,
        air_quality,
    }
}

/// Serve the dashboard routes on an ephemeral port.
async fn serve(dashboard: SharedDashboard) -> Result<String> {
    // ---
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, routes::router(dashboard)).await;
    });
    Ok(format!("http://{}", addr))
}

fn settings(page_size: usize) -> DashboardSettings {
    DashboardSettings {
        policy: RetentionPolicy::time_window(TimeDelta::seconds(300)),
        page_size: std::num::NonZeroUsize::new(page_size).unwrap(),
        ..DashboardSettings::default()
    }
}

/// Wait until the producer task has merged everything sent so far.
async fn settle(dashboard: &SharedDashboard, expected: usize) {
    for _ in 0..100 {
        if dashboard.lock().retained().len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn health_endpoint_ok() -> Result<()> {
    // ---
    let controller = DashboardController::new(settings(12));
    let base = serve(Arc::new(Mutex::new(controller))).await?;

    let body: serde_json::Value = Client::new()
        .get(format!("{}/health", base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body, json!({ "status": "ok" }));
    Ok(())
}

#[tokio::test]
async fn batches_flow_into_paginated_view() -> Result<()> {
    // ---
    let (tx, rx) = mpsc::unbounded_channel();
    let producer = ChannelProducer {
        batches: Mutex::new(Some(rx)),
    };
    let cadence = Cadence {
        batch_interval: Duration::from_millis(1000),
        max_batch_size: 100,
    };
    let controller = DashboardController::new(settings(10));
    let session = DashboardSession::start(controller, &producer, cadence, None);
    let dashboard = session.dashboard();
    let base = serve(session.dashboard()).await?;
    let client = Client::new();

    tx.send((0..15).map(|i| reading("sensor-001", i, 40.0)).collect())?;
    tx.send(Vec::new())?;
    tx.send((15..25).map(|i| reading("sensor-002", i, 150.0)).collect())?;
    settle(&dashboard, 25).await;

    let view: View = client
        .get(format!("{}/dashboard", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(view.retained_count, 25);
    assert_eq!(view.total_pages, 3);
    assert_eq!(view.current_page, 1);
    assert_eq!(view.visible_readings.len(), 10);
    assert_eq!(view.time_window_ms, Some(300_000));
    for pair in view.visible_readings.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp, "view not newest first");
    }

    // Navigate to the last page, then past it
    let view: View = client
        .post(format!("{}/dashboard/page?to=last", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(view.current_page, 3);
    assert_eq!(view.visible_readings.len(), 5);
    let view: View = client
        .post(format!("{}/dashboard/page?to=next", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(view.current_page, 3);

    // Changing the filter goes back to page one
    let view: View = client
        .post(format!("{}/dashboard/filter/critical-aqi", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(view.current_page, 1);
    assert_eq!(view.filtered_count, 10);
    assert!(view.visible_readings.iter().all(|c| c.sensor_id == "sensor-002"));
    assert!(view.visible_readings.iter().all(|c| c.air_quality >= 100.0));
    assert!(view.visible_readings.iter().all(|c| c.air_quality_level == "bad"));

    session.end().await;
    Ok(())
}

#[tokio::test]
async fn pause_drops_batches_until_resumed() -> Result<()> {
    // ---
    let (tx, rx) = mpsc::unbounded_channel();
    let producer = ChannelProducer {
        batches: Mutex::new(Some(rx)),
    };
    let cadence = Cadence {
        batch_interval: Duration::from_millis(1000),
        max_batch_size: 10,
    };
    let controller = DashboardController::new(settings(12));
    let session = DashboardSession::start(controller, &producer, cadence, None);
    let dashboard = session.dashboard();
    let base = serve(session.dashboard()).await?;
    let client = Client::new();

    let view: View = client
        .post(format!("{}/dashboard/pause", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(view.paused);

    tx.send(vec![reading("sensor-001", 1, 20.0)])?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(dashboard.lock().retained().len(), 0);

    let view: View = client
        .post(format!("{}/dashboard/pause", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(!view.paused);

    tx.send(vec![reading("sensor-001", 0, 20.0)])?;
    settle(&dashboard, 1).await;
    assert_eq!(dashboard.lock().retained().len(), 1);

    session.end().await;
    Ok(())
}

#[tokio::test]
async fn filter_and_time_window_updates() -> Result<()> {
    // ---
    let mut controller = DashboardController::new(settings(12));
    controller.on_batch(
        vec![reading("sensor-001", 5, 20.0), reading("sensor-002", 120, 20.0)],
        Utc::now(),
    );
    let base = serve(Arc::new(Mutex::new(controller))).await?;
    let client = Client::new();

    // Inverted bounds match nothing
    let view: View = client
        .put(format!("{}/dashboard/filter", base))
        .json(&json!({
            "temp": { "min": 20.0, "max": 10.0 },
            "humidity": { "min": 30.0, "max": 90.0 },
            "aqi": { "min": 0.0, "max": 200.0 }
        }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(view.filtered_count, 0);
    assert_eq!(view.total_pages, 0);
    assert_eq!(view.current_page, 1);

    let view: View = client
        .post(format!("{}/dashboard/filter/reset", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(view.filtered_count, 2);

    // Narrowing the window prunes immediately
    let view: View = client
        .put(format!("{}/dashboard/time-window", base))
        .json(&json!({ "time_window_ms": 30_000 }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(view.time_window_ms, Some(30_000));
    assert_eq!(view.retained_count, 1);
    assert_eq!(view.visible_readings[0].sensor_id, "sensor-001");

    let response = client
        .put(format!("{}/dashboard/time-window", base))
        .json(&json!({ "time_window_ms": 0 }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/dashboard/page?to=sideways", base))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}
