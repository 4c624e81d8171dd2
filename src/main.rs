use clap::Parser;
use crossbeam::channel::{self, Sender};
use dialoguer::Select;
use std::io::BufRead;
use std::thread;
use std::time::Duration;
use tickseq::{
    cli::{parse_command, validate_device, Args},
    clock::{SystemMicros, ThreadTimer},
    demo::{fill_demo_pattern, Lcg},
    logging,
    midi::{list_output_devices, LiveInput, MidirEngine},
    ui::run_status_display,
    Command, EngineMessage, EventLoop, Sequencer, Settings, TickScheduler,
};

fn main() {
    let args = Args::parse();
    let settings = load_settings(&args);
    initialize_logging(&settings);

    let devices = list_output_devices();
    if args.device_list {
        list_available_devices(&devices);
        return;
    }

    let output = connect_output(&args, &settings, &devices);
    let (message_tx, message_rx) = channel::bounded::<EngineMessage>(256);
    let (status_tx, status_rx) = channel::bounded(1);

    let _live_input = settings
        .input_device
        .as_deref()
        .and_then(|name| connect_input(name, message_tx.clone()));

    let mut sequencer = Sequencer::from_settings(&settings, output);
    if settings.demo_pattern {
        fill_demo_pattern(sequencer.pattern_mut(), &mut Lcg::default());
    }

    let mut event_loop = EventLoop::new(
        TickScheduler::new(ThreadTimer::new()),
        SystemMicros::new(),
        sequencer,
        message_rx,
    )
    .with_status(
        status_tx,
        Duration::from_millis(settings.status_interval_ms),
    );

    if let Err(e) = event_loop.start(settings.tick_micros) {
        exit_with_error(&format!("Timer begin failed: {}", e));
    }

    if settings.autostart {
        send(&message_tx, EngineMessage::Command(Command::Start));
    }
    if settings.send_test_note {
        send(&message_tx, EngineMessage::TestNote);
    }

    spawn_command_reader(message_tx.clone());
    let display = run_status_display(status_rx);

    event_loop.run();
    drop(event_loop);
    let _ = display.join();
    log::info!("Application exiting");
}

fn load_settings(args: &Args) -> Settings {
    match Settings::load(args) {
        Ok(settings) => settings,
        Err(e) => exit_with_error(&e.to_string()),
    }
}

fn initialize_logging(settings: &Settings) {
    match logging::init_logger(settings.level_filter()) {
        Ok(path) => log::info!("Application starting, logging to {}", path.display()),
        Err(e) => {
            logging::init_fallback_logger(settings.level_filter());
            log::warn!("File logging unavailable ({}), using stderr", e);
        }
    }
}

fn list_available_devices(devices: &[String]) {
    println!("Available MIDI output devices:");
    for device in devices {
        println!("  - {}", device);
    }
}

fn connect_output(args: &Args, settings: &Settings, devices: &[String]) -> MidirEngine {
    let device_name = if args.choose_output {
        choose_output_device(devices)
    } else {
        settings.output_device.clone()
    };

    if let Some(name) = &device_name {
        if let Err(error_msg) = validate_device(name, devices) {
            exit_with_error(&error_msg);
        }
    }

    match MidirEngine::connect(device_name.as_deref()) {
        Ok(engine) => {
            log::info!("Successfully connected to MIDI device: {}", engine.port_name());
            println!("Successfully connected to MIDI device: {}", engine.port_name());
            engine
        }
        Err(e) => exit_with_error(&format!("Error connecting to MIDI device: {}", e)),
    }
}

fn choose_output_device(devices: &[String]) -> Option<String> {
    if devices.is_empty() {
        return None;
    }
    match Select::new()
        .with_prompt("MIDI output")
        .items(devices)
        .default(0)
        .interact_opt()
    {
        Ok(Some(index)) => devices.get(index).cloned(),
        Ok(None) => None,
        Err(e) => exit_with_error(&format!("Device selection failed: {}", e)),
    }
}

fn connect_input(name: &str, tx: Sender<EngineMessage>) -> Option<LiveInput> {
    match LiveInput::connect(name, tx) {
        Ok(input) => {
            log::info!("Live input connected: {}", input.port_name());
            Some(input)
        }
        Err(e) => {
            log::error!("Live input unavailable: {}", e);
            eprintln!("Live input unavailable: {}", e);
            None
        }
    }
}

/// Reads serial-style commands from stdin. `n` sends a test note, `q` quits.
fn spawn_command_reader(tx: Sender<EngineMessage>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let message = match line.trim() {
                "" => continue,
                "q" | "Q" => EngineMessage::Shutdown,
                "n" => EngineMessage::TestNote,
                text => match parse_command(text) {
                    Ok(command) => EngineMessage::Command(command),
                    Err(e) => {
                        eprintln!("ERR {}", e);
                        continue;
                    }
                },
            };
            let quit = message == EngineMessage::Shutdown;
            if tx.send(message).is_err() || quit {
                break;
            }
        }
    });
}

fn send(tx: &Sender<EngineMessage>, message: EngineMessage) {
    if tx.send(message).is_err() {
        log::error!("Event loop not accepting messages");
    }
}

fn exit_with_error(message: &str) -> ! {
    log::error!("{}", message);
    eprintln!("{}", message);
    std::process::exit(1);
}
