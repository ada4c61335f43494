//! Compact, colourised single-line event formatter for terminals.

use chrono::Local;
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::field::MakeExt;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use yansi::{Paint, Style};

const TIMESTAMP: Style = Style::new().dim();
const TARGET: Style = Style::new().dim();
const SPAN: Style = Style::new().bold();

fn level_style(level: Level) -> Style {
    match level {
        Level::ERROR => Style::new().red().bold(),
        Level::WARN => Style::new().yellow().bold(),
        Level::INFO => Style::new().green(),
        Level::DEBUG => Style::new().blue(),
        Level::TRACE => Style::new().magenta(),
    }
}

fn painted(ansi: bool, value: impl fmt::Display, style: Style) -> String {
    if ansi {
        value.paint(style).to_string()
    } else {
        value.to_string()
    }
}

/// `12:04:31.022  INFO offerings::extract: message key=value`
pub struct CustomPrettyFormatter;

impl<S, N> FormatEvent<S, N> for CustomPrettyFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let ansi = writer.has_ansi_escapes();
        let meta = event.metadata();

        let timestamp = Local::now().format("%H:%M:%S%.3f");
        write!(writer, "{} ", painted(ansi, timestamp, TIMESTAMP))?;

        let level = *meta.level();
        write!(writer, "{} ", painted(ansi, format_args!("{level:>5}"), level_style(level)))?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}:", painted(ansi, span.name(), SPAN))?;
            }
            write!(writer, " ")?;
        }

        write!(writer, "{} ", painted(ansi, format_args!("{}:", meta.target()), TARGET))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Field formatter: the message bare, everything else as `key=value`.
pub fn compact_fields() -> impl for<'writer> FormatFields<'writer> + 'static {
    format::debug_fn(|writer, field, value| {
        if field.name() == "message" {
            write!(writer, "{value:?}")
        } else {
            write!(writer, "{}={:?}", field.name(), value)
        }
    })
    .delimited(" ")
}
