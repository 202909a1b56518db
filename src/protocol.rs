/// Discovery request broadcast by clients looking for a server.
pub const DISCOVER_REQUEST: &[u8] = b"DISCOVER_SERVER";

/// Discovery reply sent back to the prober.
pub const DISCOVER_RESPONSE: &[u8] = b"SERVER_HERE";

/// Typed by the end user to end the client session without reconnecting.
pub const STOP_TOKEN: &str = "/stop";

/// One transport read carries at most one logical message.
pub const READ_BUF: usize = 1024;

#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Standby,
    Pause,
    Shutdown,
    CloseRoom(String),
    Evict { pin: String, name: String },
    ShowLog,
    Help,
}

pub fn parse_console(line: &str) -> Result<ConsoleCommand, String> {
    let mut parts = line.trim().splitn(2, ' ');

    let cmd = parts.next().unwrap_or("").to_lowercase();

    let rest = parts.next().map(str::trim);

    match cmd.as_str() {
        "start" => Ok(ConsoleCommand::Start),
        "standby" => Ok(ConsoleCommand::Standby),
        "stop" => match rest {
            None => Ok(ConsoleCommand::Pause),
            Some(word) if word.eq_ignore_ascii_case("server") => Ok(ConsoleCommand::Shutdown),
            Some(_) => Err("usage: stop | stop server".into()),
        },
        "room" => {
            let rest = rest.ok_or("usage: room <PIN> [name]")?;

            let mut args = rest.splitn(2, ' ');

            let pin = args.next().unwrap_or("");
            if pin.is_empty() {
                return Err("usage: room <PIN> [name]".into());
            }

            match args.next().map(str::trim) {
                Some(name) if !name.is_empty() => Ok(ConsoleCommand::Evict {
                    pin: pin.to_string(),
                    name: name.to_string(),
                }),
                _ => Ok(ConsoleCommand::CloseRoom(pin.to_string())),
            }
        }
        "log" => Ok(ConsoleCommand::ShowLog),
        "help" => Ok(ConsoleCommand::Help),
        _ => Err(format!("unknown command: {}", cmd)),
    }
}
