use argh::FromArgs;
use log::debug;
use shell::Shell;

use crate::utils::config::Config;
use crate::utils::log::init_logger;

mod shell;
mod utils;

/// Run one command line: pipelines joined by `&&` and `||`, with `<` and `>` redirections.
#[derive(FromArgs)]
struct Args {
    /// the command line to execute
    #[argh(option, short = 'c')]
    command: String,
}

fn main() {
    let args: Args = argh::from_env();
    let config = Config::new();
    init_logger(&config);
    debug!("配置加载成功, 日志级别 {}", config.logger_level);

    let shell = Shell::new(&config);
    std::process::exit(shell.run(&args.command));
}
