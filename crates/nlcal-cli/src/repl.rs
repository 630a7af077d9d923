//! The interactive loop behind `nlcal chat`.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::error::CliResult;
use crate::session::Session;

const PROMPT: &str = "> ";

fn is_exit(line: &str) -> bool {
    matches!(
        line.to_lowercase().as_str(),
        "exit" | "quit" | "koniec" | "wyjdź"
    )
}

/// Reads one request per line until EOF or `exit`/`quit`.
///
/// Failed requests are printed and the loop goes on; only I/O errors on
/// `input` or `output` end it early.
pub async fn run<R, W>(session: &mut Session, input: R, output: &mut W) -> CliResult<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(output)?;
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_exit(line) {
            break;
        }

        let now = session.zone().now();
        match session.handle(line, now).await {
            Ok(reply) => writeln!(output, "{}", reply)?,
            Err(e) => {
                debug!(error = ?e, "request failed");
                writeln!(output, "error: {}", e)?;
            }
        }
    }
    Ok(())
}
