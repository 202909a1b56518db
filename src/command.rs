use std::io::Write as _;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::admission::Admission;
use crate::protocol::{ConsoleCommand, parse_console};
use crate::state::ServerState;

const HELP: &str = "Commands:
  start                  Start the server (new clients and messages OK)
  standby                Put the server in standby (no new clients)
  stop                   Pause the server (messages and new clients blocked)
  stop server            Shut down the whole server
  room <PIN>             Close a room
  room <PIN> <name>      Kick a member out of a room
  log                    Show recent events
  help                   Show this help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Shutdown,
}

/// Applies one operator command and returns what to print for it.
pub fn apply(state: &ServerState, cmd: ConsoleCommand) -> (Flow, String) {
    match cmd {
        ConsoleCommand::Start => {
            state.set_admission(Admission::Active);
            state.push_event("Server started".to_string());
            (
                Flow::Continue,
                "[server] Server started. New clients and messages OK.".to_string(),
            )
        }

        ConsoleCommand::Standby => {
            state.set_admission(Admission::Standby);
            state.push_event("Server in standby".to_string());
            (
                Flow::Continue,
                "[server] Server in standby. No new clients.".to_string(),
            )
        }

        ConsoleCommand::Pause => {
            state.set_admission(Admission::Stopped);
            state.push_event("Server paused".to_string());
            (
                Flow::Continue,
                "[server] Server paused. Messages and new clients blocked.".to_string(),
            )
        }

        ConsoleCommand::Shutdown => {
            state.shutdown();
            (
                Flow::Shutdown,
                "[server] Shutting down the server and closing all connections...".to_string(),
            )
        }

        ConsoleCommand::CloseRoom(pin) => {
            if state.admission() == Admission::Stopped {
                return (
                    Flow::Continue,
                    "[server] Cannot manage rooms while the server is stopped.".to_string(),
                );
            }

            if state.close_room(&pin) {
                (Flow::Continue, format!("[server] Room {} closed.", pin))
            } else {
                (
                    Flow::Continue,
                    format!("[server] Room {} does not exist.", pin),
                )
            }
        }

        ConsoleCommand::Evict { pin, name } => {
            if state.admission() == Admission::Stopped {
                return (
                    Flow::Continue,
                    "[server] Cannot manage rooms while the server is stopped.".to_string(),
                );
            }

            if state.evict(&pin, &name) {
                (
                    Flow::Continue,
                    format!("[server] {} was kicked from room {}.", name, pin),
                )
            } else {
                (
                    Flow::Continue,
                    format!("[server] Could not find {} in room {}.", name, pin),
                )
            }
        }

        ConsoleCommand::ShowLog => (Flow::Continue, render_log(state)),

        ConsoleCommand::Help => (Flow::Continue, HELP.to_string()),
    }
}

pub fn render_dashboard(state: &ServerState) -> String {
    let admission = state.admission();

    let mut out = String::from("=== SERVER DASHBOARD ===\n");
    out.push_str(&format!(
        "Accepting new clients: {}\n",
        admission == Admission::Active
    ));
    out.push_str(&format!(
        "Messages blocked: {}\n",
        admission == Admission::Stopped
    ));

    let rooms = state.list_rooms();
    if rooms.is_empty() {
        out.push_str("No active rooms.\n");
    } else {
        for (pin, names) in rooms {
            out.push_str(&format!("Room {}: {:?}\n", pin, names));
        }
    }

    out.push_str("\nType help for commands.");
    out
}

fn render_log(state: &ServerState) -> String {
    let mut out = String::from("=== RECENT EVENTS ===");

    for entry in state.recent_events() {
        out.push('\n');
        out.push_str(&entry);
    }

    out
}

/// Interactive operator loop. Returns after `stop server` or console EOF.
pub async fn run(state: ServerState) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("\n{}", render_dashboard(&state));

        print!("Server> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            // Console gone: treat it like stop server.
            let (_, feedback) = apply(&state, ConsoleCommand::Shutdown);
            println!("{}", feedback);
            return Ok(());
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_console(line) {
            Ok(cmd) => {
                let (flow, feedback) = apply(&state, cmd);
                println!("{}", feedback);

                if flow == Flow::Shutdown {
                    return Ok(());
                }
            }
            Err(usage) => println!("{}", usage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::Member;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn join(state: &ServerState, pin: &str, name: &str) -> UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = state.next_conn_id();
        state.join(pin, Member::new(id, name.to_string(), tx));
        rx
    }

    #[test]
    fn admission_commands_move_the_flag() {
        let state = ServerState::default();

        let (flow, _) = apply(&state, ConsoleCommand::Start);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(state.admission(), Admission::Active);

        apply(&state, ConsoleCommand::Standby);
        assert_eq!(state.admission(), Admission::Standby);

        apply(&state, ConsoleCommand::Pause);
        assert_eq!(state.admission(), Admission::Stopped);
    }

    #[test]
    fn shutdown_flips_the_running_flag() {
        let state = ServerState::default();

        let (flow, _) = apply(&state, ConsoleCommand::Shutdown);

        assert_eq!(flow, Flow::Shutdown);
        assert!(!state.is_running());
    }

    #[test]
    fn room_admin_is_refused_while_stopped() {
        let state = ServerState::default();
        let _rx = join(&state, "1234", "A");

        apply(&state, ConsoleCommand::Pause);

        let (_, feedback) = apply(&state, ConsoleCommand::CloseRoom("1234".into()));
        assert!(feedback.contains("Cannot manage rooms"));
        assert_eq!(state.list_rooms().len(), 1);

        let (_, feedback) = apply(
            &state,
            ConsoleCommand::Evict {
                pin: "1234".into(),
                name: "A".into(),
            },
        );
        assert!(feedback.contains("Cannot manage rooms"));
        assert_eq!(state.list_rooms()[0].1, vec!["A"]);
    }

    #[test]
    fn room_admin_is_allowed_in_standby() {
        let state = ServerState::default();
        let _rx = join(&state, "1234", "A");

        apply(&state, ConsoleCommand::Standby);

        let (_, feedback) = apply(&state, ConsoleCommand::CloseRoom("1234".into()));
        assert!(feedback.contains("closed"));
        assert!(state.list_rooms().is_empty());
    }

    #[test]
    fn closing_a_missing_room_reports_it() {
        let state = ServerState::default();

        let (_, feedback) = apply(&state, ConsoleCommand::CloseRoom("77".into()));
        assert!(feedback.contains("does not exist"));
    }

    #[test]
    fn evicting_a_missing_member_reports_it() {
        let state = ServerState::default();
        let _rx = join(&state, "1234", "A");

        let (_, feedback) = apply(
            &state,
            ConsoleCommand::Evict {
                pin: "1234".into(),
                name: "B".into(),
            },
        );
        assert!(feedback.contains("Could not find"));
    }

    #[test]
    fn dashboard_shows_flags_and_rooms() {
        let state = ServerState::default();
        let _rx_a = join(&state, "1234", "A");
        let _rx_b = join(&state, "1234", "B");

        let dashboard = render_dashboard(&state);

        assert!(dashboard.contains("Accepting new clients: false"));
        assert!(dashboard.contains("Messages blocked: false"));
        assert!(dashboard.contains(r#"Room 1234: ["A", "B"]"#));

        apply(&state, ConsoleCommand::Pause);
        let dashboard = render_dashboard(&state);
        assert!(dashboard.contains("Messages blocked: true"));
    }

    #[test]
    fn dashboard_without_rooms_says_so() {
        let state = ServerState::default();
        assert!(render_dashboard(&state).contains("No active rooms."));
    }

    #[test]
    fn log_lists_events_oldest_first() {
        let state = ServerState::default();
        state.push_event("first".to_string());
        state.push_event("second".to_string());

        let log = render_log(&state);

        assert_eq!(log, "=== RECENT EVENTS ===\nfirst\nsecond");
    }
}
