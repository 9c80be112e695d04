use colored::*;
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// Event formatter that colors each log line by severity.
///
/// Diagnostics here are user-facing (empty-file skips, dropped tests), so
/// the whole line is colored and no timestamp or level prefix is printed.
pub struct ColorizedFormatter;

impl<S, N> FormatEvent<S, N> for ColorizedFormatter
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
        // Fields have to be buffered before the color can wrap the line.
        let mut line = String::new();
        let mut buffered = Writer::new(&mut line);
        ctx.format_fields(buffered.by_ref(), event)?;

        let colored_line = match *event.metadata().level() {
            Level::ERROR => line.red(),
            Level::WARN => line.yellow(),
            Level::INFO => line.white(),
            Level::DEBUG => line.blue(),
            Level::TRACE => line.purple(),
        };

        writeln!(writer, "{}", colored_line)
    }
}
