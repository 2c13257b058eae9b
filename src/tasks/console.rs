//! Line-oriented operator console on stdin. Each line becomes one player
//! input; `quit` cancels the runtime. EOF only ends the console, so a player
//! started with stdin on `/dev/null` keeps running until Ctrl-C.

use anyhow::{Result, bail};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use crate::events::{EventSender, Input, Key, PlayerEvent};
use crate::stage::OverlayId;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(Input),
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    if words.next().is_some() {
        bail!("too many arguments to `{verb}`");
    }
    let index = |what: &str| -> Result<usize> {
        match arg {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("`{what}` expects an index, got `{raw}`")),
            None => bail!("`{what}` expects an index"),
        }
    };
    let verb = verb.to_ascii_lowercase();
    let command = match verb.as_str() {
        "select" | "s" => Command::Send(Input::SelectPath(index("select")?)),
        "click" | "c" => Command::Send(Input::StageClick),
        "overlay" | "o" => Command::Send(Input::OverlayClick(OverlayId(index("overlay")?))),
        "next" | "n" => Command::Send(Input::key(Key::ArrowRight)),
        "esc" | "escape" => Command::Send(Input::key(Key::Escape)),
        "mute" | "m" => Command::Send(Input::ToggleAudio),
        "quit" | "q" | "exit" => Command::Quit,
        other => bail!("unknown command `{other}`"),
    };
    if arg.is_some() && !matches!(verb.as_str(), "select" | "s" | "overlay" | "o") {
        bail!("`{verb}` takes no arguments");
    }
    Ok(Some(command))
}

pub async fn run<R>(input: R, to_player: EventSender, cancel: CancellationToken) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            tracing::info!("console input closed; player keeps running");
            break;
        };
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => {
                tracing::info!("quit requested");
                cancel.cancel();
                break;
            }
            Ok(Some(Command::Send(input))) => {
                tracing::debug!(?input, "console input");
                if to_player.send(PlayerEvent::Input(input)).await.is_err() {
                    break;
                }
            }
            Err(err) => tracing::warn!("{err}"),
        }
    }
    Ok(())
}
