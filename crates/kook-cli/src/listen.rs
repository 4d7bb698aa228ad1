//! Output loop for the `listen` command.

use std::future::Future;
use std::io::{self, Write};

use kook_gateway::{GatewayError, GatewayEvent};
use tokio::sync::mpsc::UnboundedReceiver;

/// Why the listener stopped printing.
#[derive(Debug)]
pub enum Exit {
    /// The shutdown future completed (Ctrl-C).
    Interrupted,
    /// The gateway gave up on the connection.
    Fatal(GatewayError),
}

/// Print rendered lines until `shutdown` completes or a fatal gateway error
/// arrives. Lines still queued when the loop ends are flushed first.
///
/// # Errors
///
/// Fails if writing to `out` fails.
pub async fn print_until_stopped<W, S>(
    lines: &mut UnboundedReceiver<String>,
    errors: &mut UnboundedReceiver<GatewayEvent>,
    shutdown: S,
    out: &mut W,
) -> io::Result<Exit>
where
    W: Write,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let exit = loop {
        tokio::select! {
            Some(line) = lines.recv() => {
                writeln!(out, "{line}")?;
            }
            Some(event) = errors.recv() => {
                if let GatewayEvent::Error(err) = event {
                    if err.is_fatal() {
                        break Exit::Fatal(err);
                    }
                }
            }
            () = &mut shutdown => break Exit::Interrupted,
        }
    };

    while let Ok(line) = lines.try_recv() {
        writeln!(out, "{line}")?;
    }
    Ok(exit)
}
