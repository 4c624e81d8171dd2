use clap::Parser;
use tickseq::cli::{parse_command, validate_device};
use tickseq::{Args, Command, Settings};

#[test]
fn test_args_defaults() {
    let args = Args::parse_from(["tickseq"]);
    assert!(!args.device_list);
    assert_eq!(args.midi_output, None);
    assert_eq!(args.bpm, None);
    assert!(!args.no_autostart);
}

#[test]
fn test_args_with_output_and_tempo() {
    let args = Args::parse_from([
        "tickseq",
        "--midi-output",
        "Mock Device 1",
        "-b",
        "140",
        "--steps",
        "32",
    ]);
    assert_eq!(args.midi_output, Some("Mock Device 1".to_string()));
    assert_eq!(args.bpm, Some(140.0));
    assert_eq!(args.steps, Some(32));
}

#[test]
fn test_flags_override_defaults() {
    let args = Args::parse_from(["tickseq", "-b", "90", "-c", "2", "--no-autostart"]);
    let settings = Settings::load(&args).unwrap();
    assert_eq!(settings.tempo, 90.0);
    assert_eq!(settings.channel, 2);
    assert!(!settings.autostart);
    assert_eq!(settings.step_count, Settings::default().step_count);
}

#[test]
fn test_out_of_range_flag_is_rejected() {
    let args = Args::parse_from(["tickseq", "-b", "400"]);
    assert!(Settings::load(&args).is_err());
}

#[test]
fn test_missing_explicit_config_file_is_an_error() {
    let args = Args::parse_from(["tickseq", "--config", "/nonexistent/tickseq.toml"]);
    assert!(Settings::load(&args).is_err());
}

#[test]
fn test_invalid_device_binding() {
    let devices = vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()];
    assert!(validate_device("Mock", &devices).is_ok());
    let err = validate_device("Nonexistent", &devices).unwrap_err();
    assert!(err.contains("Mock Device 2"));
}

#[test]
fn test_command_lines() {
    assert_eq!(parse_command("T100"), Ok(Command::SetTempo(100.0)));
    assert_eq!(parse_command("A0"), Ok(Command::Arm(false)));
    assert!(parse_command("T100").unwrap().validate().is_ok());
    assert!(parse_command("C0").unwrap().validate().is_err());
}
