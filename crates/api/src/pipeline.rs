//! Wires the event listeners to their delivery channels.

use std::sync::Arc;

use rollcall_db::DbPool;
use rollcall_events::delivery::email::{EmailConfig, Mailer, SmtpMailer};
use rollcall_events::delivery::sms::{HttpSmsGateway, SimulatedSmsGateway, SmsConfig, SmsGateway};
use rollcall_events::delivery::store::PgNotificationSink;
use rollcall_events::listeners::{AlertListener, AttendanceSmsListener, RealtimeRelayListener};
use rollcall_events::{DispatchWorker, Dispatcher, DispatcherBuilder, PgDirectory};
use tokio_util::task::TaskTracker;

use crate::ws::WsManager;

/// A ready-to-run event pipeline.
pub struct Pipeline {
    pub dispatcher: Dispatcher,
    /// Must be spawned; events queue up until it runs.
    pub worker: DispatchWorker,
    /// Queued email sends, drained at shutdown.
    pub mail_queue: TaskTracker,
}

/// Register every listener against Postgres and the push hub.
pub fn build_pipeline(
    pool: DbPool,
    ws_manager: Arc<WsManager>,
    sms: Arc<dyn SmsGateway>,
    mailer: Option<Arc<dyn Mailer>>,
) -> Pipeline {
    let directory = Arc::new(PgDirectory::new(pool.clone()));
    let sink = Arc::new(PgNotificationSink::new(pool));

    let mut alerts = AlertListener::new(directory.clone(), sink, ws_manager.clone());
    if let Some(mailer) = mailer {
        alerts = alerts.with_mailer(mailer);
    }
    let mail_queue = alerts.mail_queue();

    let (dispatcher, worker) = DispatcherBuilder::new()
        .listen(AttendanceSmsListener::new(directory.clone(), sms))
        .listen(alerts)
        .listen(RealtimeRelayListener::new(directory, ws_manager))
        .build();

    Pipeline {
        dispatcher,
        worker,
        mail_queue,
    }
}

/// The HTTP gateway when `SMS_API_URL` is set, otherwise the simulated one.
pub fn sms_gateway_from_env() -> Arc<dyn SmsGateway> {
    let Some(config) = SmsConfig::from_env() else {
        tracing::warn!("SMS_API_URL not set, SMS messages will only be logged");
        return Arc::new(SimulatedSmsGateway);
    };

    match HttpSmsGateway::new(config) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build SMS HTTP client, falling back to simulation");
            Arc::new(SimulatedSmsGateway)
        }
    }
}

/// An SMTP mailer when `SMTP_HOST` is set; `None` disables the mail channel.
pub fn mailer_from_env() -> Option<Arc<dyn Mailer>> {
    let config = EmailConfig::from_env()?;
    let host = config.smtp_host.clone();
    match SmtpMailer::new(config) {
        Ok(mailer) => {
            tracing::info!(smtp_host = %host, "Mail channel enabled");
            Some(Arc::new(mailer))
        }
        Err(e) => {
            tracing::error!(smtp_host = %host, error = %e, "Invalid SMTP configuration, mail channel disabled");
            None
        }
    }
}
