use std::io::{self, Write};

use ragchat::orchestrator::{DisplaySink, DisplayUpdate};
use ragchat::session::BlockKind;

/// Prints the raw reply stream as it arrives.
///
/// Terminals cannot show the rendered HTML, so a finished reply only closes
/// its line; a reply cut short is marked as such.
pub struct TerminalSink<W: Write + Send> {
    out: W,
    interactive: bool,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout(interactive: bool) -> Self {
        Self {
            out: io::stdout(),
            interactive,
        }
    }
}

impl<W: Write + Send> TerminalSink<W> {
    fn write_update(&mut self, update: DisplayUpdate) -> io::Result<()> {
        match update {
            DisplayUpdate::UserMessage { .. } => {}
            DisplayUpdate::AssistantStarted { .. } => {
                if self.interactive {
                    write!(self.out, "assistant> ")?;
                }
            }
            DisplayUpdate::Chunk { text, .. } => write!(self.out, "{text}")?,
            DisplayUpdate::AssistantFinal { block } => match block.kind {
                BlockKind::Stopped => writeln!(self.out, " [stopped]")?,
                _ => writeln!(self.out)?,
            },
            DisplayUpdate::AssistantDiscarded { .. } => writeln!(self.out)?,
            DisplayUpdate::Diagnostic { message } => eprintln!("! {message}"),
            DisplayUpdate::SessionReset { id, title, .. } => {
                if self.interactive {
                    writeln!(self.out, "-- {title} ({id})")?;
                }
            }
        }
        self.out.flush()
    }
}

impl<W: Write + Send> DisplaySink for TerminalSink<W> {
    fn show(&mut self, update: DisplayUpdate) {
        if let Err(err) = self.write_update(update) {
            log::warn!("failed to write to terminal: {err}");
        }
    }
}
