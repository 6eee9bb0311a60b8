// Terminal front-end for the boombap stream player

use boombap_core::{CallbackEvent, EngineError, PlayerState};
use boombap_player::PlaybackController;
use boombap_renderer::CpalSink;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

fn init_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    });
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    List,
    Play(usize),
    Url(String),
    Stop,
    Next,
    Previous,
    Volume(f32),
    Info(Option<usize>),
    Status,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let index = |arg: Option<&str>| -> Result<usize, String> {
        let arg = arg.ok_or_else(|| format!("{} needs a station number", verb))?;
        arg.parse().map_err(|_| format!("not a station number: {}", arg))
    };

    let command = match verb {
        "list" | "ls" => Command::List,
        "play" | "p" => Command::Play(index(arg)?),
        "url" => Command::Url(arg.ok_or("url needs a playlist URL")?.to_string()),
        "stop" | "s" => Command::Stop,
        "next" | "n" => Command::Next,
        "prev" | "previous" => Command::Previous,
        "vol" | "volume" => {
            let arg = arg.ok_or("vol needs a value between 0.0 and 1.0")?;
            Command::Volume(arg.parse().map_err(|_| format!("not a volume: {}", arg))?)
        }
        "info" | "i" => Command::Info(arg.map(|_| index(arg)).transpose()?),
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {} (try help)", other)),
    };
    Ok(Some(command))
}

fn print_event(event: CallbackEvent) {
    match event {
        CallbackEvent::LoadingStarted { session } => println!("[{}] loading...", session),
        CallbackEvent::LoadingStopped { session } => println!("[{}] loading done", session),
        CallbackEvent::StateChanged { new_state, .. } => {
            if new_state == PlayerState::Playing {
                println!("playing");
            }
        }
        CallbackEvent::PlaybackEnded { session } => println!("[{}] stream ended", session),
        CallbackEvent::Error { session, error } => println!("[{}] error: {}", session, error),
        CallbackEvent::GainChanged { gain } => println!("volume {:.2}", gain),
    }
}

fn print_help() {
    println!("commands:");
    println!("  list            show stations");
    println!("  play N          play station N");
    println!("  url URL         play a playlist URL");
    println!("  stop            stop playback");
    println!("  next, prev      step through the stations");
    println!("  vol X           set volume, 0.0 to 1.0");
    println!("  info [N]        describe station N (default: selected)");
    println!("  status          show player state");
    println!("  quit            exit");
}

/// Returns false when the shell should exit
fn execute(controller: &PlaybackController, command: Command) -> Result<bool, EngineError> {
    match command {
        Command::List => {
            let selected = controller.snapshot().selected;
            for (i, station) in controller.catalog().iter().enumerate() {
                let marker = if i == selected { '*' } else { ' ' };
                println!("{} {:2}  {}", marker, i, station.name);
            }
        }
        Command::Play(index) => {
            controller.play(index)?;
        }
        Command::Url(url) => {
            controller.play_url(&url);
        }
        Command::Stop => controller.stop(),
        Command::Next => {
            controller.next()?;
        }
        Command::Previous => {
            controller.previous()?;
        }
        Command::Volume(gain) => {
            controller.set_gain(gain);
        }
        Command::Info(index) => {
            let index = index.unwrap_or(controller.snapshot().selected);
            let station = controller.get_station(index).ok_or(EngineError::StationOutOfRange {
                index,
                len: controller.catalog().len(),
            })?;
            println!("{}: {}", station.name, station.description);
        }
        Command::Status => {
            let snapshot = controller.snapshot();
            let name = controller
                .get_station(snapshot.selected)
                .map(|station| station.name)
                .unwrap_or("-");
            println!(
                "state {:?}, station {} ({}), volume {:.2}",
                snapshot.state,
                snapshot.selected,
                name,
                controller.gain()
            );
        }
        Command::Help => print_help(),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

fn run() -> Result<(), EngineError> {
    let sink = Arc::new(CpalSink::new()?);
    let controller = PlaybackController::new(sink);
    controller.add_callback(Arc::new(print_event));

    log::info!("boombap {} ready, {} stations", env!("CARGO_PKG_VERSION"), controller.catalog().len());
    print_help();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        match parse_command(&line?) {
            Ok(None) => {}
            Ok(Some(command)) => match execute(&controller, command) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => println!("error: {}", e),
            },
            Err(message) => println!("{}", message),
        }
    }

    controller.stop();
    Ok(())
}

fn main() {
    init_logging();
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
