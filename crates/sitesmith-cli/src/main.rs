use clap::Parser;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = sitesmith_cli::Cli::parse();
    if let Err(err) = sitesmith_cli::run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
