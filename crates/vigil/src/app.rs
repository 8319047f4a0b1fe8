use clap::{Arg, ArgAction, Command, value_parser};

fn server_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("symbol")
                .long("symbol")
                .short('s')
                .help("Trading symbol to watch (overrides config, default: ETHUSDT)"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .short('u')
                .help("Dashboard backend URL (overrides config, default: http://127.0.0.1:5000)"),
        )
}

pub fn build_cli() -> Command {
    Command::new("vigil")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watch a trading dashboard backend from the terminal")
        .long_about("Vigil polls a trading dashboard backend on a timer, retries slow or failing requests, and renders account, positions, trades, PnL and market panels as plain text.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            server_args(
                Command::new("watch")
                    .about("Poll continuously and print panels until Ctrl-C")
                    .long_about("Poll continuously and print panels until Ctrl-C or quit. Type a symbol (e.g. BTCUSDT) to switch symbol, period <p> or period <chart> <p> to reload a chart, or press Enter on an empty line to refresh now."),
            )
            .arg(
                Arg::new("interval")
                    .long("interval")
                    .short('i')
                    .help("Seconds between dashboard polls (overrides config, default: 10)")
                    .value_parser(value_parser!(u64)),
            )
            .arg(
                Arg::new("no-charts")
                    .long("no-charts")
                    .help("Skip the PnL chart and performance pollers")
                    .action(ArgAction::SetTrue),
            ),
        )
        .subcommand(
            server_args(Command::new("snapshot").about("Fetch the dashboard once and print it"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the fetched payload as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration as TOML"))
}
