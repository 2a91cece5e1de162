//! Common test utilities for integration tests
//!
//! Provides an in-memory tracker gateway, fixtures and logging setup shared
//! across the integration test files.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use faultline::domain::models::FaultsConfig;
use faultline::domain::ports::ManualClock;
use faultline::{CreatedTicket, FaultManager, FaultReport, GatewayError, TicketRequest, TrackerGateway};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Tracker gateway that records every call and hands out sequential
/// identifiers (`ENG-1`, `ENG-2`, ...).
///
/// `create_delay` makes ticket creation suspend like a slow tracker would,
/// so concurrent reports can interleave.
#[derive(Default)]
pub struct RecordingGateway {
    tickets: Mutex<Vec<TicketRequest>>,
    comments: Mutex<Vec<(String, String)>>,
    fail_comments: AtomicBool,
    fail_creates: AtomicBool,
    return_no_ticket: AtomicBool,
    create_delay_ms: AtomicU64,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn tickets(&self) -> Vec<TicketRequest> {
        self.tickets.lock().unwrap().clone()
    }

    pub fn comments(&self) -> Vec<(String, String)> {
        self.comments.lock().unwrap().clone()
    }

    pub fn fail_comments(&self, fail: bool) {
        self.fail_comments.store(fail, Ordering::SeqCst);
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub fn return_no_ticket(&self, empty: bool) {
        self.return_no_ticket.store(empty, Ordering::SeqCst);
    }

    pub fn create_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.create_delay_ms.store(millis, Ordering::SeqCst);
    }
}

#[async_trait]
impl TrackerGateway for RecordingGateway {
    async fn create_ticket(
        &self,
        request: &TicketRequest,
    ) -> Result<Option<CreatedTicket>, GatewayError> {
        let delay = self.create_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(GatewayError::Status {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        if self.return_no_ticket.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let mut tickets = self.tickets.lock().unwrap();
        tickets.push(request.clone());
        let n = tickets.len();
        Ok(Some(CreatedTicket {
            id: format!("issue-uuid-{n}"),
            identifier: format!("ENG-{n}"),
            url: format!("https://linear.app/acme/issue/ENG-{n}"),
        }))
    }

    async fn create_comment(&self, ticket_id: &str, body: &str) -> Result<(), GatewayError> {
        if self.fail_comments.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("connection reset".to_string()));
        }
        self.comments
            .lock()
            .unwrap()
            .push((ticket_id.to_string(), body.to_string()));
        Ok(())
    }
}

/// Manager over `gateway` with a manual clock.
pub fn manager(
    gateway: Arc<RecordingGateway>,
    config: FaultsConfig,
) -> (FaultManager, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let manager = FaultManager::new(
        config,
        "team-1",
        vec!["label-bug".to_string()],
        gateway,
        clock.clone(),
    )
    .expect("valid manager");
    (manager, clock)
}

pub fn duplicate_report() -> FaultReport {
    FaultReport::new("Duplicate error").with_stack("Error: Duplicate\n    at test.js:1:1")
}
