use std::io;
use tabula::cli;
use tabula::core::config::Config;
use tabula::core::database::Database;

fn main() {
    let mut config = Config::default();
    if let Some(path) = std::env::args_os().nth(1) {
        config = config.with_data_file(path);
    }

    let database = match Database::open(config) {
        Ok(database) => database,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    println!("tabula: type 'help' for commands, 'exit' to leave");
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();

    let exit_code = cli::run_repl(&database, &mut input, &mut stdout);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}
