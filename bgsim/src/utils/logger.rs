// SPDX-License-Identifier: MIT

use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Installs the logger: `RUST_LOG` when set, else `-v` count
/// (0 = warn, 1 = info, 2+ = debug, 3+ = trace).
pub fn init_logger(verbosity: u8) {
    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
        return;
    }

    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter(None, level)
        .init();
}
