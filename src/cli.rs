//! Command-line interface and REPL

use anyhow::Result;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use metronome_console::controllers::Session;
use metronome_console::view::format::{format_duration, format_time_signature};

/// One parsed REPL line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Bpm(u32),
    TimeSignature(u8),
    Start,
    Stop,
    ResetPractice,
    History,
    Tracking(bool),
    Smoothing(f64),
    RecordStart,
    RecordStop,
    RecordList,
    Download(String),
    Delete(String),
    MidiPorts,
    MidiConnect(String),
    MidiDisconnect,
    Amplitude(f64),
    Refresh,
    Status,
    Help,
    Quit,
}

/// Parse a line; `Ok(None)` for a blank line
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();
    let arg = rest.first().copied();

    let command = match (head.to_ascii_lowercase().as_str(), arg) {
        ("bpm", Some(n)) => Command::Bpm(parse_number(n)?),
        ("sig", Some(n)) => {
            let beats: u32 = parse_number(n)?;
            Command::TimeSignature(beats.min(u8::MAX as u32) as u8)
        }
        ("start", None) => Command::Start,
        ("stop", None) => Command::Stop,
        ("reset", None) => Command::ResetPractice,
        ("history", None) => Command::History,
        ("track", Some("on")) => Command::Tracking(true),
        ("track", Some("off")) => Command::Tracking(false),
        ("smooth", Some(x)) => Command::Smoothing(parse_number(x)?),
        ("rec", Some("start")) => Command::RecordStart,
        ("rec", Some("stop")) => Command::RecordStop,
        ("rec", Some("list")) => Command::RecordList,
        ("download", Some(file)) => Command::Download(file.to_string()),
        ("delete", Some(file)) => Command::Delete(file.to_string()),
        ("midi", Some("ports")) => Command::MidiPorts,
        ("midi", Some("connect")) if rest.len() > 1 => Command::MidiConnect(rest[1..].join(" ")),
        ("midi", Some("disconnect")) => Command::MidiDisconnect,
        ("amp", Some(x)) => Command::Amplitude(parse_number(x)?),
        ("refresh", None) => Command::Refresh,
        ("status", None) => Command::Status,
        ("help", _) | ("?", _) => Command::Help,
        ("quit", _) | ("exit", _) => Command::Quit,
        _ => return Err(format!("Unknown command: '{}' (try 'help')", line.trim())),
    };
    Ok(Some(command))
}

fn parse_number<T: std::str::FromStr>(s: &str) -> Result<T, String> {
    s.parse().map_err(|_| format!("Not a number: '{}'", s))
}

/// Run the REPL until `quit`, Ctrl-C or Ctrl-D
pub async fn run_repl(session: &Session, download_dir: &Path) -> Result<()> {
    let mut lines = spawn_reader()?;

    print_help();

    while let Some((line, next)) = lines.recv().await {
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => execute(session, command, download_dir).await,
            Err(msg) => println!("{}", msg.yellow()),
        }
        // Prompt again only once the command has finished
        let _ = next.send(());
    }

    Ok(())
}

type Line = (String, oneshot::Sender<()>);

/// Read lines on a dedicated thread; rustyline blocks
fn spawn_reader() -> Result<mpsc::UnboundedReceiver<Line>> {
    let mut rl = DefaultEditor::new()?;
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || loop {
        match rl.readline("metronome> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                let (next_tx, next_rx) = oneshot::channel();
                if tx.send((line, next_tx)).is_err() {
                    break;
                }
                if next_rx.blocking_recv().is_err() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                debug!("REPL input closed");
                break;
            }
            Err(e) => {
                warn!("REPL input error: {}", e);
                break;
            }
        }
    });

    Ok(rx)
}

async fn execute(session: &Session, command: Command, download_dir: &Path) {
    let result: Result<()> = async {
        match command {
            Command::Bpm(bpm) => {
                let accepted = session.metronome.set_bpm(bpm).await?;
                println!("BPM {}", accepted.to_string().green());
            }
            Command::TimeSignature(beats) => {
                let accepted = session.metronome.set_time_signature(beats).await?;
                println!("Time signature {}", format_time_signature(accepted).green());
            }
            Command::Start => session.metronome.start().await?,
            Command::Stop => session.metronome.stop().await?,
            Command::ResetPractice => session.practice.reset().await?,
            Command::History => {
                let history = session.practice.history().await?;
                println!("\n{}", "Practice history:".bold());
                for (i, s) in history.sessions.iter().enumerate() {
                    println!(
                        "  {:>2}. {}  {} bpm  {}",
                        i + 1,
                        format_duration(s.duration).cyan(),
                        s.bpm,
                        format_time_signature(s.time_signature)
                    );
                }
                println!("  Total: {}\n", format_duration(history.total).green());
            }
            Command::Tracking(true) => session.tracking.start().await?,
            Command::Tracking(false) => session.tracking.stop().await?,
            Command::Smoothing(value) => {
                session.tracking.set_smoothing(value).await?;
            }
            Command::RecordStart => {
                if !session.recording.start().await? {
                    println!("{}", "Recording did not start".yellow());
                }
            }
            Command::RecordStop => session.recording.stop().await?,
            Command::RecordList => {
                session.recording.refresh_list().await?;
            }
            Command::Download(file) => {
                let path = session.recording.download(&file, download_dir).await?;
                println!("Saved {}", path.display().to_string().green());
            }
            Command::Delete(file) => {
                session.recording.delete(&file).await?;
            }
            Command::MidiPorts => {
                session.midi.refresh_ports().await?;
            }
            Command::MidiConnect(port) => {
                if !session.midi.connect(&port).await? {
                    println!("{}", format!("Could not open '{}'", port).yellow());
                }
            }
            Command::MidiDisconnect => session.midi.disconnect().await?,
            Command::Amplitude(value) => {
                session.midi.set_amplitude(value).await?;
            }
            Command::Refresh => session.engine().poll_now().await,
            Command::Status => print_status(session).await,
            Command::Help => print_help(),
            Command::Quit => {}
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    if let Err(e) = result {
        println!("{} {:#}", "✗".red(), e);
    }
}

async fn print_status(session: &Session) {
    let Some(snap) = session.engine().snapshot().await else {
        println!("{}", "Engine is not running".red());
        return;
    };

    println!("\n{}", "=== Session ===".bold().cyan());
    let polling = if snap.polling { "yes".green() } else { "no".normal() };
    println!("  Polling:    {}", polling);
    let active: Vec<String> = snap.flags.active().iter().map(|s| s.to_string()).collect();
    println!("  Active:     {}", active.join(", "));
    println!("  Recording:  {}", snap.recording);
    println!(
        "  Polls:      #{} applied, {} stale, {} failed, {} ticks skipped",
        snap.last_applied_seq, snap.discarded_responses, snap.failed_polls, snap.skipped_ticks
    );
    println!("  Failures:   {}", snap.failed_commands);
    if let Some(err) = &snap.last_error {
        println!("  Last error: {}", err.red());
    }

    let mut fields: Vec<_> = snap.fields.into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    println!("\n{}", "Fields:".bold());
    for (field, value) in fields {
        println!("  {:<24} {}", field.to_string().yellow(), value);
    }
    println!();
}

fn print_help() {
    println!("\n{}", "Commands:".bold());
    let rows = [
        ("bpm N", "set tempo (40-208)"),
        ("sig N", "set beats per bar (2-8)"),
        ("start | stop", "metronome"),
        ("reset | history", "practice timer"),
        ("track on|off", "hand tracking"),
        ("smooth X", "tracking smoothing (0.05-1)"),
        ("rec start|stop|list", "recording"),
        ("download FILE", "save a recording locally"),
        ("delete FILE", "delete a recording on the device"),
        ("midi ports", "list MIDI inputs"),
        ("midi connect PORT", "open a MIDI input"),
        ("midi disconnect", "close the MIDI input"),
        ("amp X", "MIDI motion amplitude (0-1)"),
        ("refresh", "fetch status once"),
        ("status", "engine state"),
        ("quit", "exit"),
    ];
    for (cmd, desc) in rows {
        println!("  {:<22} {}", cmd.cyan(), desc);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("bpm 140"), Ok(Some(Command::Bpm(140))));
        assert_eq!(parse_command("  sig 3 "), Ok(Some(Command::TimeSignature(3))));
        assert_eq!(parse_command("sig 999"), Ok(Some(Command::TimeSignature(255))));
        assert_eq!(parse_command("track on"), Ok(Some(Command::Tracking(true))));
        assert_eq!(parse_command("smooth 0.5"), Ok(Some(Command::Smoothing(0.5))));
        assert_eq!(parse_command("rec stop"), Ok(Some(Command::RecordStop)));
        assert_eq!(parse_command("QUIT"), Ok(Some(Command::Quit)));
        assert_eq!(parse_command(""), Ok(None));
    }

    #[test]
    fn test_midi_port_names_keep_spaces() {
        assert_eq!(
            parse_command("midi connect Digital Piano MIDI 1"),
            Ok(Some(Command::MidiConnect("Digital Piano MIDI 1".to_string())))
        );
        assert!(parse_command("midi connect").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("bpm fast").is_err());
        assert!(parse_command("bpm").is_err());
        assert!(parse_command("track maybe").is_err());
        assert!(parse_command("start now").is_err());
        assert!(parse_command("dance").is_err());
    }
}
