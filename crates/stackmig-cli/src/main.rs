//! stackmig - change the stack of platform applications.

use clap::Parser;
use stackmig_cli::settings::Settings;
use stackmig_cli::{commands, logging, Cli};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);

    let result = Settings::load(&cli).and_then(|settings| {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(commands::execute(&cli, &settings))
    });

    if let Err(e) = result {
        println!("FAILED");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
