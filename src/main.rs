mod cli;
mod effects;
mod error;
mod logging;
mod motion;
mod sequencer;
mod settings;
mod tui;

use clap::{CommandFactory, Parser};

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Play {
        no_confetti: false,
        tick_ms: None,
    });

    let result = match command {
        Commands::Play {
            no_confetti,
            tick_ms,
        } => {
            let mut settings = settings::load_settings();
            settings.confetti &= !no_confetti;
            if let Some(ms) = tick_ms {
                settings.tick_ms = ms;
            }
            if let Err(e) = logging::init(&settings) {
                eprintln!("Warning: logging disabled: {e}");
            }
            cli::card::run(&settings)
        }
        Commands::Config => cli::config::show(),
        Commands::Init { force } => cli::config::init(force),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "sugarmoon", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
