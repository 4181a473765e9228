//! Nice `pairint` output formatting.

use std::fmt;

use log;

const PAIRINT_BANNER_LENGTH: usize = 103;

/// Logs an error to the `pairint-output` logger.
macro_rules! pairint_error {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::error!($fmt, $($($arg)*)?);
        log::error!(target: "pairint-output", $fmt, $($($arg)*)?);
    }
}

/// Logs a warning to the `pairint-output` logger.
macro_rules! pairint_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::warn!(target: "pairint-output", $fmt, $($($arg)*)?); }
}

/// Logs a main output line to the `pairint-output` logger.
macro_rules! pairint_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "pairint-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {pairint_error, pairint_output, pairint_warn};

/// Writes a nicely formatted section title.
pub(crate) fn write_title(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    let length = title.chars().count().max(PAIRINT_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    writeln!(f, "┌──{bar}──┐")?;
    writeln!(f, "│§ {title:^length$} §│")?;
    writeln!(f, "└──{bar}──┘")?;
    Ok(())
}

/// Logs a nicely formatted section title to the `pairint-output` logger.
pub(crate) fn log_title(title: &str) {
    let length = title.chars().count().max(PAIRINT_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    pairint_output!("┌──{bar}──┐");
    pairint_output!("│§ {title:^length$} §│");
    pairint_output!("└──{bar}──┘");
}

/// Writes a nicely formatted subtitle.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    writeln!(f, "{subtitle}")?;
    writeln!(f, "{bar}")?;
    Ok(())
}

/// Logs a nicely formatted subtitle to the `pairint-output` logger.
pub(crate) fn log_subtitle(subtitle: &str) {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    pairint_output!("{}", subtitle);
    pairint_output!("{}", bar);
}

/// Turns a boolean into a string of `yes` or `no`.
pub(crate) fn nice_bool(b: bool) -> String {
    if b {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// Formats a value that is expected to be an integer or a half-integer, *e.g.* `3`, `-1/2`.
/// Values that are neither are printed with one decimal place.
pub(crate) fn fmt_half_integer(value: f64) -> String {
    let twice = 2.0 * value;
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else if (twice - twice.round()).abs() < 1e-9 {
        format!("{}/2", twice.round() as i64)
    } else {
        format!("{value:.1}")
    }
}

/// A trait for logging `pairint` outputs nicely.
pub(crate) trait PairIntOutput: fmt::Debug + fmt::Display {
    /// Logs display output nicely.
    fn log_output_display(&self) {
        let lines = self.to_string();
        lines.lines().for_each(|line| {
            pairint_output!("{line}");
        })
    }
}

// Blanket implementation
impl<T> PairIntOutput for T where T: fmt::Debug + fmt::Display {}
