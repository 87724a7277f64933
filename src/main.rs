// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up the log file and hand over
//   to the UI flow.
// - Returns `anyhow::Result` so fatal errors end the run with a message.

use std::path::PathBuf;

use clap::Parser;
use pap2mealie::ui::{self, ImportOptions};

/// Import recipes from a Paprika export into Mealie
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Paprika export file (.paprikarecipes)
    file: PathBuf,
    /// Base URL of the Mealie server, without the /api suffix
    #[arg(env = "MEALIE_URL")]
    url: String,
    /// Username of the Mealie user. Prompted for if omitted
    #[arg(long, env = "MEALIE_USERNAME")]
    username: Option<String>,
    /// Password of the Mealie user. Prompted for if omitted
    #[arg(long, env = "MEALIE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Path to the log file
    #[arg(long, default_value = "pap2mealie.log")]
    logfile: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    // Held until exit so buffered log lines are flushed.
    let _log_guard = ui::init_logging(&args.logfile)?;

    ui::run(ImportOptions {
        archive: args.file,
        server_url: args.url,
        username: args.username,
        password: args.password,
        logfile: args.logfile,
    })
}
