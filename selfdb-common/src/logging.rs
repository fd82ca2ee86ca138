//! slog setup shared by every binary in the workspace: human-readable
//! terminal output in development, MozLog-style JSON in production.

use std::io;

use slog::{self, slog_o, Drain};

pub fn init_logging(json: bool, app_name: &str) -> Result<(), String> {
    let logger = if json {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .ok_or_else(|| "couldn't determine hostname".to_string())?;

        let drain = slog_mozlog_json::MozLogJson::new(io::stdout())
            .logger_name(format!("{app_name}-{}", env!("CARGO_PKG_VERSION")))
            .msg_type(format!("{app_name}:log"))
            .hostname(hostname)
            .build()
            .fuse();
        let drain = slog_envlogger::new(drain);
        let drain = slog_async::Async::new(drain).build().fuse();
        slog::Logger::root(drain, slog_o!())
    } else {
        let decorator = slog_term::TermDecorator::new().build();
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        let drain = slog_envlogger::new(drain);
        let drain = slog_async::Async::new(drain).build().fuse();
        slog::Logger::root(drain, slog_o!())
    };
    slog_scope::set_global_logger(logger).cancel_reset();
    slog_stdlog::init().ok();
    Ok(())
}

pub fn reset_logging() {
    let logger = slog::Logger::root(slog::Discard, slog_o!());
    slog_scope::set_global_logger(logger).cancel_reset();
}
