use crate::commands::{Command, CommandError};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// List available MIDI output devices
    #[arg(long)]
    pub device_list: bool,

    /// MIDI output device (name substring)
    #[arg(long, value_name = "DEVICE")]
    pub midi_output: Option<String>,

    /// Pick the MIDI output device interactively
    #[arg(long)]
    pub choose_output: bool,

    /// MIDI input device for live playing and recording
    #[arg(long, value_name = "DEVICE")]
    pub midi_input: Option<String>,

    /// Settings file (defaults to ./tickseq.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<String>,

    /// Tempo in beats per minute
    #[arg(short, long)]
    pub bpm: Option<f32>,

    /// Steps in the pattern
    #[arg(long)]
    pub steps: Option<u16>,

    /// Steps per bar (16 = sixteenths)
    #[arg(long)]
    pub grid: Option<u8>,

    /// Track MIDI channel (1-16)
    #[arg(short, long)]
    pub channel: Option<u8>,

    /// Real-time tick period in microseconds
    #[arg(long)]
    pub tick_micros: Option<u32>,

    /// Do not start the transport on launch
    #[arg(long)]
    pub no_autostart: bool,

    /// Fill the pattern with a generated demo sequence
    #[arg(long)]
    pub demo: bool,

    /// Send a test MIDI note on startup
    #[arg(long)]
    pub test_note: bool,
}

pub fn validate_device(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Device '{}' not found in available devices:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}

/// Parses one line of the serial command grammar:
/// `T<bpm>`, `G<steps>`, `D<grid>`, `C<channel>`, `L<tick>`, `A1`/`A0`,
/// `P` start, `S` stop, `H` pause, `R` resume.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let unrecognized = || CommandError::Unrecognized(line.to_string());
    let mut chars = line.chars();
    let op = chars.next().ok_or_else(unrecognized)?;
    let arg = chars.as_str().trim();

    let command = match op {
        'P' | 'p' if arg.is_empty() => Command::Start,
        'S' if arg.is_empty() => Command::Stop,
        'H' | 'h' if arg.is_empty() => Command::Pause,
        'R' if arg.is_empty() => Command::Resume,
        'T' => Command::SetTempo(arg.parse().map_err(|_| unrecognized())?),
        'G' => Command::SetStepCount(arg.parse().map_err(|_| unrecognized())?),
        'D' => Command::SetGridDivision(arg.parse().map_err(|_| unrecognized())?),
        'C' => Command::SetChannel(arg.parse().map_err(|_| unrecognized())?),
        'L' => Command::Locate(arg.parse().map_err(|_| unrecognized())?),
        'A' => match arg {
            "1" => Command::Arm(true),
            "0" => Command::Arm(false),
            _ => return Err(unrecognized()),
        },
        _ => return Err(unrecognized()),
    };
    Ok(command)
}
