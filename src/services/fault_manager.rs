//! Fault lifecycle controller.
//!
//! One call to [`FaultManager::report`] runs a single pass:
//!
//! 1. fingerprint the report,
//! 2. consult the [`FaultCache`] (when deduplication is enabled),
//! 3. either append a recurrence comment to the known ticket, or open a new
//!    ticket and remember it.
//!
//! Tracker failures are settled by a fixed policy per step (see
//! [`TrackerStep::failure_policy`]): a failed recurrence comment is logged
//! and swallowed because the sighting is already recorded locally, while a
//! failed ticket creation is returned to the caller since nothing local can
//! stand in for the missing ticket. Nothing here retries.

use std::panic::{Location, PanicHookInfo};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::errors::{FaultError, FaultResult, GatewayError};
use crate::domain::models::{
    FaultFingerprint, FaultRecord, FaultReport, FaultsConfig, LinearConfig, ReportOutcome,
    TicketRequest,
};
use crate::domain::ports::{Clock, SystemClock, TrackerGateway};
use crate::services::error_capture::{self, ErrorContext, RequestLike};
use crate::services::fault_cache::FaultCache;
use crate::services::fingerprint::fingerprint;
use crate::services::priority::priority_for;
use crate::services::report_formatter::{
    format_description, format_recurrence_comment, format_title,
};

/// Side-effecting tracker calls made while handling a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStep {
    /// Opening a ticket for a new fault.
    CreateTicket,
    /// Commenting on the ticket of a known fault.
    AppendComment,
}

/// What to do when a tracker step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Return the error to the caller.
    Propagate,
    /// Log the error and carry on as if the step had no result.
    LogAndContinue,
}

impl TrackerStep {
    /// How a failure of this step is handled.
    pub const fn failure_policy(self) -> FailurePolicy {
        match self {
            Self::CreateTicket => FailurePolicy::Propagate,
            Self::AppendComment => FailurePolicy::LogAndContinue,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTicket => "create_ticket",
            Self::AppendComment => "append_comment",
        }
    }
}

/// Apply the step's failure policy to its result.
///
/// `Ok(None)` means the step failed and the policy chose to continue.
fn settle<T>(step: TrackerStep, result: Result<T, GatewayError>) -> FaultResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) => match step.failure_policy() {
            FailurePolicy::Propagate => {
                error!(step = step.as_str(), error = %err, "tracker call failed");
                Err(err.into())
            }
            FailurePolicy::LogAndContinue => {
                warn!(step = step.as_str(), error = %err, "tracker call failed, continuing");
                Ok(None)
            }
        },
    }
}

/// Deduplicating fault reporter.
///
/// Owns its [`FaultCache`]; share the manager itself (usually behind an
/// `Arc`) rather than the cache.
pub struct FaultManager {
    config: FaultsConfig,
    team_id: String,
    label_ids: Vec<String>,
    gateway: Arc<dyn TrackerGateway>,
    clock: Arc<dyn Clock>,
    cache: FaultCache,
}

impl std::fmt::Debug for FaultManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultManager")
            .field("config", &self.config)
            .field("team_id", &self.team_id)
            .field("label_ids", &self.label_ids)
            .field("cached_faults", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl FaultManager {
    /// Create a manager that files tickets into `team_id`.
    ///
    /// Fails with [`FaultError::Configuration`] when `team_id` is blank.
    pub fn new(
        config: FaultsConfig,
        team_id: impl Into<String>,
        label_ids: Vec<String>,
        gateway: Arc<dyn TrackerGateway>,
        clock: Arc<dyn Clock>,
    ) -> FaultResult<Self> {
        let team_id = team_id.into();
        if team_id.trim().is_empty() {
            return Err(FaultError::Configuration(
                "default team id is not set (LINEAR_DEFAULT_TEAM_ID)".to_string(),
            ));
        }

        let cache = if config.dedupe_enabled {
            FaultCache::new(config.dedupe_window())
        } else {
            FaultCache::disabled()
        };

        Ok(Self {
            config,
            team_id,
            label_ids,
            gateway,
            clock,
            cache,
        })
    }

    /// Create a manager from loaded configuration using the wall clock.
    pub fn from_config(
        faults: FaultsConfig,
        linear: &LinearConfig,
        gateway: Arc<dyn TrackerGateway>,
    ) -> FaultResult<Self> {
        Self::new(
            faults,
            linear.team_id.clone().unwrap_or_default(),
            linear.label_ids.clone(),
            gateway,
            Arc::new(SystemClock),
        )
    }

    /// Active fault settings.
    pub const fn config(&self) -> &FaultsConfig {
        &self.config
    }

    /// Number of faults currently remembered (expired ones included until read).
    pub fn cached_faults(&self) -> usize {
        self.cache.len()
    }

    /// Report a fault, opening a ticket or commenting on the known one.
    #[instrument(skip(self, report), fields(fingerprint = tracing::field::Empty))]
    pub async fn report(&self, report: &FaultReport) -> FaultResult<ReportOutcome> {
        let fingerprint = fingerprint(report);
        tracing::Span::current().record("fingerprint", fingerprint.as_str());

        let now = self.clock.now();
        let known = self
            .cache
            .lookup(&fingerprint, now)
            .and_then(|_| self.cache.touch(&fingerprint, now));

        match known {
            Some(record) => self.report_duplicate(record, now).await,
            None => self.report_fresh(report, fingerprint).await,
        }
    }

    async fn report_duplicate(
        &self,
        record: FaultRecord,
        now: DateTime<Utc>,
    ) -> FaultResult<ReportOutcome> {
        debug!(
            ticket_id = %record.ticket_id,
            identifier = %record.identifier,
            count = record.count,
            "fault already tracked"
        );

        let body = format_recurrence_comment(record.count, now);
        let commented = settle(
            TrackerStep::AppendComment,
            self.gateway.create_comment(&record.ticket_id, &body).await,
        )?;
        if commented.is_none() {
            warn!(
                identifier = %record.identifier,
                count = record.count,
                "recurrence recorded locally but not on the ticket"
            );
        }

        Ok(ReportOutcome::duplicate_of(&record))
    }

    async fn report_fresh(
        &self,
        report: &FaultReport,
        fingerprint: FaultFingerprint,
    ) -> FaultResult<ReportOutcome> {
        let request = TicketRequest {
            team_id: self.team_id.clone(),
            title: format_title(&self.config.app_name, report),
            description: format_description(report, &self.config.environment, self.clock.now()),
            priority: priority_for(report.severity, self.config.default_priority),
            label_ids: self.label_ids.clone(),
        };

        let created = settle(
            TrackerStep::CreateTicket,
            self.gateway.create_ticket(&request).await,
        )?;
        let ticket = created.flatten().ok_or_else(|| {
            error!(title = %request.title, "tracker returned no ticket");
            GatewayError::MissingTicket
        })?;

        // Only remember tickets the tracker confirmed.
        self.cache.insert(fingerprint, &ticket, self.clock.now());

        info!(
            identifier = %ticket.identifier,
            ticket_id = %ticket.id,
            priority = request.priority,
            "created fault ticket"
        );

        Ok(ReportOutcome {
            ticket_id: ticket.id,
            identifier: ticket.identifier,
            url: ticket.url,
            is_duplicate: false,
        })
    }

    /// Report an error value.
    ///
    /// The message comes from `Display`, the stack from the caller's
    /// location and the `source()` chain; severity is `error`.
    #[track_caller]
    pub fn report_error<E>(
        &self,
        error: &E,
        context: ErrorContext,
    ) -> BoxFuture<'_, FaultResult<ReportOutcome>>
    where
        E: std::error::Error + ?Sized,
    {
        let report = error_capture::error_report(error, context, Location::caller());
        self.report_owned(report)
    }

    /// Report an error raised while serving `request`; URL, method and body
    /// land in the report context.
    #[track_caller]
    pub fn report_request_error<E, R>(
        &self,
        error: &E,
        request: &R,
    ) -> BoxFuture<'_, FaultResult<ReportOutcome>>
    where
        E: std::error::Error + ?Sized,
        R: RequestLike + ?Sized,
    {
        let report = error_capture::request_report(error, request, Location::caller());
        self.report_owned(report)
    }

    fn report_owned(&self, report: FaultReport) -> BoxFuture<'_, FaultResult<ReportOutcome>> {
        Box::pin(async move { self.report(&report).await })
    }

    /// Report in the background, swallowing every error.
    ///
    /// Returns `None` when called outside a tokio runtime.
    pub fn report_detached(self: &Arc<Self>, report: FaultReport) -> Option<JoinHandle<()>> {
        let handle = tokio::runtime::Handle::try_current().ok();
        self.spawn_report(handle.as_ref(), report)
    }

    fn spawn_report(
        self: &Arc<Self>,
        runtime: Option<&tokio::runtime::Handle>,
        report: FaultReport,
    ) -> Option<JoinHandle<()>> {
        let Some(runtime) = runtime else {
            warn!(message = %report.message, "no async runtime, dropping fault report");
            return None;
        };

        let manager = Arc::clone(self);
        Some(runtime.spawn(async move {
            if let Err(err) = manager.report(&report).await {
                warn!(error = %err, message = %report.message, "background fault report failed");
            }
        }))
    }

    /// Build a panic hook that reports panics as critical faults.
    ///
    /// The runtime handle is captured here, so call this from inside the
    /// runtime that should carry the reports. The hook never panics itself.
    /// Reports from a panic that aborts the process may not complete.
    pub fn panic_handler(self: &Arc<Self>) -> impl Fn(&PanicHookInfo<'_>) + Send + Sync + 'static {
        let manager = Arc::clone(self);
        let runtime = tokio::runtime::Handle::try_current().ok();
        move |info: &PanicHookInfo<'_>| {
            let report = error_capture::panic_report(info);
            manager.spawn_report(runtime.as_ref(), report);
        }
    }

    /// Install [`panic_handler`](Self::panic_handler) in front of the
    /// current panic hook.
    pub fn install_panic_hook(self: &Arc<Self>) {
        let handler = self.panic_handler();
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            handler(info);
            previous(info);
        }));
    }

    /// Forget every tracked fault; the next sighting of any fault opens a
    /// new ticket.
    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!("fault cache cleared");
    }
}
