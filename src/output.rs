//! Progress lines for the notarization run
//!
//! `step!` and `info!` report progress on stdout, `success!` marks a finished
//! stage, `warn!` and `error!` go to stderr. A failed write to the terminal
//! never changes the outcome of a notarization, so write results are dropped.

/// Print a step banner in bold blue on stdout.
#[macro_export]
macro_rules! step {
    ($($arg:tt)*) => {{
        use ::std::io::Write as _;
        use ::termcolor::WriteColor as _;
        let bufwtr = ::termcolor::BufferWriter::stdout(::termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(
            ::termcolor::ColorSpec::new()
                .set_fg(Some(::termcolor::Color::Blue))
                .set_bold(true),
        );
        let _ = write!(&mut buffer, "==> ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print an indented informational line on stdout.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        use ::std::io::Write as _;
        let bufwtr = ::termcolor::BufferWriter::stdout(::termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = write!(&mut buffer, "  → ");
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print a warning in yellow on stderr.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        use ::std::io::Write as _;
        use ::termcolor::WriteColor as _;
        let bufwtr = ::termcolor::BufferWriter::stderr(::termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(::termcolor::ColorSpec::new().set_fg(Some(::termcolor::Color::Yellow)));
        let _ = write!(&mut buffer, "⚠️  ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print an error in red on stderr.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        use ::std::io::Write as _;
        use ::termcolor::WriteColor as _;
        let bufwtr = ::termcolor::BufferWriter::stderr(::termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(::termcolor::ColorSpec::new().set_fg(Some(::termcolor::Color::Red)));
        let _ = write!(&mut buffer, "❌ ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print a success message in green on stdout.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {{
        use ::std::io::Write as _;
        use ::termcolor::WriteColor as _;
        let bufwtr = ::termcolor::BufferWriter::stdout(::termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(::termcolor::ColorSpec::new().set_fg(Some(::termcolor::Color::Green)));
        let _ = write!(&mut buffer, "✓ ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}
