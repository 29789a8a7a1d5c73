use std::path::PathBuf;

use clap::Parser;
use miette::Result;

use lc3sim::io::Terminal;
use lc3sim::output::{self, file_message, message, MsgColor};
use lc3sim::{RunState, SimError};

/// Simulator for LC3 program images.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// `.obj` image files to load, in order
    images: Vec<PathBuf>,
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    lc3sim::env::init();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(2)
                .build(),
        )
    }))?;

    if args.minimal {
        output::set_minimal(true);
    }

    for image in &args.images {
        file_message(MsgColor::Green, "Loading", image);
    }
    let mut program = RunState::from_images(&args.images)?;

    let start = format!("from 0x{:04x}", lc3sim::PC_START);
    message(MsgColor::Green, "Running", start.as_str());
    let result = run(&mut program);

    match result {
        Ok(count) => {
            let summary = format!("after {count} instructions");
            message(MsgColor::Cyan, "Halted", summary.as_str());
            Ok(())
        }
        Err(err) => {
            if err.is_runtime() {
                message(MsgColor::Red, "Stopped", "machine state at fault:");
                output::print_registers(&program);
            }
            Err(err.into())
        }
    }
}

/// Terminal is restored before returning, on every path.
fn run(program: &mut RunState) -> Result<u64, SimError> {
    let mut terminal = Terminal::new()?;
    program.run(&mut terminal)
}
