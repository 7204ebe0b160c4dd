mod commands;
mod terminal;

use commands::{CommandLine, Commands, lookup, scan};
use sonar_common::config::Config;
use terminal::{print, spinner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    spinner::init_logging(commands.verbose)?;

    let cfg: Config = commands.to_config();
    print::banner(cfg.no_banner, cfg.quiet);

    match &commands.command {
        Commands::Lookup { domain } => {
            print::header("resolving records", cfg.quiet);
            lookup::lookup(domain, &cfg, &commands.export()).await
        }
        Commands::Scan { domain, .. } => {
            print::header("starting subdomain scan", cfg.quiet);
            scan::scan(domain, &cfg, &commands.export()).await
        }
    }
}
