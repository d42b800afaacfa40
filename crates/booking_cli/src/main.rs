//! Booking store entry point.
//!
//! # Responsibility
//! - Load configuration from `BOOKING_*` environment variables.
//! - Initialize logging, open the pool and serve line-delimited JSON
//!   requests from stdin, one response line per request on stdout.
//! - `booking ping` and `booking version` print a probe line and exit.

use booking_core::{
    core_version, init_from_config, open_pool, open_pool_in_memory, ping, BookingConfig,
    BookingService, CommitProducer, LogProducer, SqliteBookingRepository,
};
use booking_rpc::BookingRpc;
use log::{error, info};
use std::error::Error;
use std::io::{BufRead, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match std::env::args().nth(1).as_deref() {
        Some("ping") => {
            println!("booking_core ping={}", ping());
            return ExitCode::SUCCESS;
        }
        Some("version") => {
            println!("booking_core version={}", core_version());
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=serve module=cli status=error error={err}");
            eprintln!("booking: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = BookingConfig::from_env()?;
    init_from_config(&config)?;

    let pool_config = config.pool_config();
    let pool = match &config.db_path {
        Some(path) => open_pool(path, &pool_config)?,
        None => open_pool_in_memory(&pool_config)?,
    };
    let repo = SqliteBookingRepository::try_new(pool)?;
    let rpc = BookingRpc::new(BookingService::new(repo), LogProducer::new());

    info!(
        "event=serve module=cli status=start db={} pool_size={} call_timeout_ms={}",
        config
            .db_path
            .as_ref()
            .map_or_else(|| ":memory:".to_string(), |path| path.display().to_string()),
        config.pool_size,
        config.call_timeout_ms
    );

    let result = serve(&rpc);
    rpc.producer().close();
    result?;

    info!("event=serve module=cli status=ok");
    Ok(())
}

fn serve(rpc: &BookingRpc<SqliteBookingRepository, LogProducer>) -> std::io::Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        writeln!(stdout, "{}", rpc.handle_line(&line))?;
        stdout.flush()?;
    }
    Ok(())
}
