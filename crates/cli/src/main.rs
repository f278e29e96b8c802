mod cmd;
mod output;
#[cfg(test)]
mod tests;

use clap::Parser;
use cmd::Commands;
use output::OutputMode;

#[derive(Parser)]
#[command(name = "beacon", version, about = "Beacon admin CLI")]
pub struct Opts {
    #[clap(subcommand)]
    cmd: Commands,

    #[arg(long, global = true, help = "Output as JSON")]
    json: bool,
}

impl Opts {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

fn main() {
    let opts = Opts::parse();
    if let Err(e) = cmd::run(opts) {
        output::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
