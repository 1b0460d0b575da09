//! Terminal rendering for furipota errors.
//!
//! An error renders as its category and message followed by the trace
//! frames it carries, most recent first:
//!
//! ```text
//! UnboundNameError: No binding defined for missing
//!   in main.frp
//!     : missing
//!   at build in main.frp
//! ```
//!
//! Host-level detail (an I/O failure, a serialization error) is only shown
//! when the engine runs in debug mode.

use std::io::Write;

use nu_ansi_term::{Color, Style};

use crate::{EngineOptions, Error};

/// Render an error with colors to stderr
///
/// # Example
/// ```no_run
/// use furipota::{Engine, EngineOptions, render_error};
/// use furipota::ast::build::var;
///
/// let options = EngineOptions::default();
/// let engine = Engine::new(options.clone(), |_| {}).unwrap();
/// let module = engine.new_module("main.frp").unwrap();
/// if let Err(error) = engine.evaluate(&module, &var("missing")) {
///     render_error(&error, &options);
/// }
/// ```
pub fn render_error(error: &Error, options: &EngineOptions) {
    render_error_to_writer(error, options, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
///
/// This is useful when you want to control where the error is written,
/// such as to a file, a buffer, or a custom output stream.
pub fn render_error_to(
    error: &Error,
    options: &EngineOptions,
    writer: &mut dyn Write,
) -> std::io::Result<()> {
    render_error_to_writer(error, options, writer, true)
}

/// Render an error to a String (useful for logs, web UIs, etc.)
pub fn render_error_to_string(error: &Error, options: &EngineOptions) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, options, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
///
/// This is the same as `render_error_to_string` but without ANSI color codes,
/// making the output easier to compare in tests.
pub fn render_error_to_string_no_color(error: &Error, options: &EngineOptions) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, options, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &Error,
    options: &EngineOptions,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    let paint = |style: Style, text: &str| {
        if use_color {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    };

    writeln!(
        writer,
        "{}: {}",
        paint(Color::Red.bold(), error.kind().name()),
        error.kind()
    )?;

    for frame in error.frames() {
        for line in frame.lines() {
            writeln!(writer, "  {}", paint(Style::new().dimmed(), line))?;
        }
    }

    if options.debug {
        if let Some(host) = &error.host {
            writeln!(writer, "{}", paint(Color::Yellow.normal(), "Host detail:"))?;
            for line in host.lines() {
                writeln!(writer, "  {line}")?;
            }
        }
    }

    Ok(())
}
