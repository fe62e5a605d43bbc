use nu_ansi_term::{Color, Style};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

pub struct PrettyConsoleLogFormat;

macro_rules! styled {
    ($writer:expr, $style:expr, $block:block) => {
        let style = $style;
        write!($writer, "{}", style.prefix())?;
        $block;
        write!($writer, "{}", style.suffix())?;
    };
}

impl PrettyConsoleLogFormat {
    fn level_style(level: &Level) -> Style {
        match *level {
            Level::TRACE => Style::new().fg(Color::Purple),
            Level::DEBUG => Style::new().fg(Color::Blue),
            Level::INFO => Style::new().fg(Color::Green),
            Level::WARN => Style::new().fg(Color::Yellow),
            Level::ERROR => Style::new().fg(Color::Red),
        }
    }
}

impl<S, N> FormatEvent<S, N> for PrettyConsoleLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();

        styled!(writer, Style::new().dimmed(), {
            write!(writer, "{} ", chrono::offset::Local::now().format("%T%.3f"))?;
        });

        styled!(writer, Self::level_style(metadata.level()), {
            write!(writer, "{:<5}", metadata.level())?;
        });

        // One bar per enclosing construct, innermost span named last.
        if let Some(scope) = ctx.event_scope() {
            styled!(writer, Style::new().fg(Color::Magenta), {
                write!(writer, " ")?;
                let mut innermost = None;
                for span in scope.from_root() {
                    write!(writer, "|")?;
                    innermost = Some(span);
                }

                if let Some(span) = innermost {
                    write!(writer, " {}", span.name())?;
                    let ext = span.extensions();
                    if let Some(fields) = ext.get::<FormattedFields<N>>()
                        && !fields.is_empty()
                    {
                        write!(writer, "{{{}}}", fields)?;
                    }
                }
            });
        }

        write!(writer, " ")?;
        styled!(writer, Style::new().dimmed(), {
            write!(writer, "{}: ", metadata.target())?;
        });

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
