use std::io::{self, BufRead, ErrorKind, Write};
use crate::core::database::Database;

pub mod format;

const PROMPT: &str = "sql> ";

/// Read statements line by line until `exit`/`quit`/`q` or end of input.
/// Returns the process exit code.
pub fn run_repl<R, W>(database: &Database, input: &mut R, out: &mut W) -> i32
where
    R: BufRead,
    W: Write,
{
    let mut line = String::new();

    loop {
        if write!(out, "{PROMPT}").and_then(|()| out.flush()).is_err() {
            return 1;
        }

        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => return 0,
            Ok(_) => {}
            Err(error) if error.kind() == ErrorKind::Interrupted => {
                let _ = writeln!(out);
                continue;
            }
            Err(error) => {
                let _ = writeln!(out, "Error: {error}");
                return 1;
            }
        }

        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if matches!(command.to_ascii_lowercase().as_str(), "exit" | "quit" | "q") {
            let _ = writeln!(out, "Goodbye!");
            return 0;
        }
        if command.eq_ignore_ascii_case("help") {
            if write_help(out).is_err() {
                return 1;
            }
            continue;
        }

        let envelope = database.execute(command);
        if writeln!(out, "{}", format::render(&envelope)).is_err() {
            return 1;
        }
    }
}

pub fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "Statements:\n\
         \n\
         CREATE TABLE t (id INT PRIMARY KEY, name TEXT NOT NULL, ...)\n\
         DROP TABLE t\n\
         RENAME TABLE old TO new\n\
         INSERT INTO t [(col, ...)] VALUES (v1, v2, ...)\n\
         SELECT * FROM t [WHERE ...] [ORDER BY col [ASC|DESC]] [LIMIT n]\n\
         UPDATE t SET col = value, ... WHERE ...\n\
         DELETE FROM t WHERE ...\n\
         DESC t | DESCRIBE t\n\
         SHOW TABLES\n\
         SHOW TABLE t\n\
         CREATE INDEX ON t(col)\n\
         \n\
         Conditions: =, !=, >, <, >=, <=, LIKE, joined with AND / OR.\n\
         \n\
         help       Show this help\n\
         exit, quit Leave the shell",
    )
}
