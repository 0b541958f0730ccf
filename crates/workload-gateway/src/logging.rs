//! provides logging helpers

use std::fmt::{self};
use std::path::Path;

use chrono::SecondsFormat;
use chrono::Utc;
use tracing::field::Field;
use tracing::field::Visit;
use tracing::Event;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::FilterExt;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

use crate::controller::AUDIT_TARGET;

/// One audit record per line: timestamp, `key=value` pairs, then the message.
struct AuditFormatter;

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(&'static str, String)>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name(), format!("{value:?}")));
        }
    }
}

impl<S, N> FormatEvent<S, N> for AuditFormatter
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        write!(
            writer,
            "{}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        )?;
        for (key, value) in &visitor.fields {
            write!(writer, " {key}={value}")?;
        }
        writeln!(writer, " {}", visitor.message)
    }
}

/// initiate the global tracing subscriber
///
/// Audit events go to `audit_log_file` when given and are left out of the
/// main log; otherwise they are logged like any other event. The returned
/// guards must be held until shutdown.
pub fn init(audit_log_file: Option<&Path>) -> Vec<WorkerGuard> {
    let log_path = std::env::var(utils::logging::LOG_PATH_ENV_VAR).ok();
    let (fmt_layer, fmt_guard) = utils::logging::get_fmt_layer(log_path);
    let mut guards: Vec<WorkerGuard> = fmt_guard.into_iter().collect();

    let audit_layer = audit_log_file.and_then(|path| {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let prefix = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(AUDIT_TARGET);

        match utils::logging::rolling_appender(dir, prefix) {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                guards.push(guard);
                Some(
                    layer()
                        .event_format(AuditFormatter)
                        .fmt_fields(tracing_subscriber::fmt::format::DefaultFields::new())
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_filter(filter::filter_fn(|metadata| {
                            metadata.target() == AUDIT_TARGET
                        })),
                )
            }
            Err(e) => {
                eprintln!("failed to open audit log {}: {e}", path.display());
                None
            }
        }
    });

    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();
    let split_audit = audit_layer.is_some();
    let fmt_layer = fmt_layer.with_filter(env_filter.and(filter::filter_fn(move |metadata| {
        !(split_audit && metadata.target() == AUDIT_TARGET)
    })));

    registry().with(fmt_layer).with(audit_layer).init();
    guards
}
