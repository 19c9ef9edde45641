use std::fmt::Write;

use jiff::{Zoned, tz::TimeZone};
use log::{Level, Record};
use logforth::{
    append::Stderr,
    diagnostic::Diagnostic,
    layout::{JsonLayout, Layout},
};

use crate::args::{Args, LogStyle};

/// `<utc time> <level> [<crate>] <message>`, one record per line.
///
/// The crate tag tells apart limiter decisions (`rate_limit`), configuration warnings
/// (`config`) and exporter problems (`telemetry`) in a mixed replay log.
#[derive(Debug, Clone, Copy)]
struct ReplayLayout {
    colored: bool,
}

impl ReplayLayout {
    fn level(&self, level: Level) -> String {
        if !self.colored {
            return format!("{level:>5}");
        }

        let color = match level {
            Level::Error => 31,
            Level::Warn => 33,
            Level::Info => 32,
            Level::Debug => 34,
            Level::Trace => 35,
        };

        format!("\x1b[{color}m{level:>5}\x1b[0m")
    }
}

/// First path segment of a log target: `rate_limit::manager` becomes `rate_limit`.
fn crate_tag(target: &str) -> &str {
    target.split("::").next().unwrap_or(target)
}

impl Layout for ReplayLayout {
    fn format(&self, record: &Record<'_>, _diagnostics: &[Box<dyn Diagnostic>]) -> anyhow::Result<Vec<u8>> {
        let now = Zoned::now().with_time_zone(TimeZone::UTC);
        let mut line = String::new();

        write!(
            line,
            "{} {} [{}] {}",
            now.strftime("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.level(record.level()),
            crate_tag(record.target()),
            record.args()
        )?;

        Ok(line.into_bytes())
    }
}

/// Logs go to stderr, stdout carries the replay decisions.
pub(super) fn init(args: &Args) {
    logforth::builder()
        .dispatch(|d| {
            let d = d.filter(args.log_level.env_filter());

            match args.log_style {
                LogStyle::Color => d.append(Stderr::default().with_layout(ReplayLayout { colored: true })),
                LogStyle::Text => d.append(Stderr::default().with_layout(ReplayLayout { colored: false })),
                LogStyle::Json => d.append(Stderr::default().with_layout(JsonLayout::default())),
            }
        })
        .apply();
}
