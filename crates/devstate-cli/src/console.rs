//! Line commands for driving the daemon from a terminal.

use anyhow::{anyhow, bail, Context};
use devstate_protocol::Method;
use devstate_types::{DeviceState, Message};

pub const HELP: &str = "\
commands:
  connect                  bring the transport up
  disconnect               take the transport down
  call <method> [sender]   call get_version, req_powerup, req_reboot or req_shutdown
  state <STATE>            broadcast a state change
  deny <STATE> <reason>    broadcast a denied state request
  save                     broadcast a save-data indication
  thermal                  broadcast a thermal shutdown
  temp <celsius>           feed a temperature sample
  status                   print daemon status
  quit                     stop the daemon";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Connect,
    Disconnect,
    Call {
        method: Method,
        sender: Option<String>,
    },
    Publish(Message),
    Status,
    Help,
    Quit,
}

/// Parse one console line. Blank lines yield `None`.
pub fn parse(line: &str) -> anyhow::Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };

    let command = match word {
        "connect" => Command::Connect,
        "disconnect" => Command::Disconnect,
        "call" => {
            let method = words
                .next()
                .ok_or_else(|| anyhow!("usage: call <method> [sender]"))?;
            Command::Call {
                method: method.parse()?,
                sender: words.next().map(str::to_string),
            }
        }
        "state" => {
            let state = words.next().ok_or_else(|| anyhow!("usage: state <STATE>"))?;
            Command::Publish(Message::StateChangeInd {
                state: state.parse()?,
            })
        }
        "deny" => {
            let state: DeviceState = words
                .next()
                .ok_or_else(|| anyhow!("usage: deny <STATE> <reason>"))?
                .parse()?;
            let reason = words.collect::<Vec<_>>().join(" ");
            if reason.is_empty() {
                bail!("usage: deny <STATE> <reason>");
            }
            Command::Publish(Message::StateReqDeniedInd { state, reason })
        }
        "save" => Command::Publish(Message::SaveDataInd),
        "thermal" => Command::Publish(Message::ThermalShutdownInd),
        "temp" => {
            let celsius = words
                .next()
                .ok_or_else(|| anyhow!("usage: temp <celsius>"))?
                .parse()
                .context("temperature must be a whole number")?;
            Command::Publish(Message::TemperatureSample { celsius })
        }
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command: {other} (try `help`)"),
    };
    Ok(Some(command))
}
