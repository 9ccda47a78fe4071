use std::cell::Cell;
use std::env;
use std::num::ParseIntError;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{trace, SetLoggerError};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use crate::config::PARALLEL;

/// Nesting level of the evaluations being traced
static TRACE_DEPTH: AtomicUsize = AtomicUsize::new(0);

/// How much an evaluation reports
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    Extensive,
}

impl Verbosity {
    pub fn from_level(level: usize) -> Self {
        match level {
            0 => Self::Quiet,
            1 => Self::Normal,
            2 => Self::Verbose,
            _ => Self::Extensive,
        }
    }

    /// Read the level from `LOG`, quiet when unset
    pub fn from_env() -> Result<Self, ParseIntError> {
        match env::var("LOG") {
            Err(_) => Ok(Self::Quiet),
            Ok(val) => Ok(Self::from_level(val.parse()?)),
        }
    }

    pub fn filter(&self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::Off,
            Self::Normal => LevelFilter::Info,
            Self::Verbose => LevelFilter::Debug,
            Self::Extensive => LevelFilter::Trace,
        }
    }
}

/// Trace session scoped to one evaluation
///
/// Sessions nest: the trace lines of an evaluation started while another one
/// is running are indented one level deeper. The nesting level is a single
/// process-wide counter, so evaluations running on several threads at once
/// must set `PARALLEL=1`, which turns nesting off.
pub struct Tracer {
    title: String,
    depth: Option<usize>,
    events: Cell<usize>,
}

impl Tracer {
    pub fn new(title: String) -> Self {
        let depth = if *PARALLEL {
            None
        } else {
            let level = TRACE_DEPTH.fetch_add(1, Ordering::SeqCst);
            trace!("{}-> {}", "  ".repeat(level), title);
            Some(level)
        };
        Self {
            title,
            depth,
            events: Cell::new(0),
        }
    }

    pub fn log(&self, event: &str) {
        self.events.set(self.events.get() + 1);
        if let Some(level) = self.depth {
            trace!("{} {}", "  ".repeat(level), event);
        }
    }

    /// Nesting level of this session, `None` when nesting is not tracked
    pub fn depth(&self) -> Option<usize> {
        self.depth
    }

    pub fn events(&self) -> usize {
        self.events.get()
    }
}

impl Drop for Tracer {
    fn drop(&mut self) {
        if let Some(level) = self.depth {
            trace!(
                "{}<- {} ({} events)",
                "  ".repeat(level),
                self.title,
                self.events.get()
            );
            // sessions dropped out of order leave the depth untouched
            let _ = TRACE_DEPTH.compare_exchange(
                level + 1,
                level,
                Ordering::SeqCst,
                Ordering::SeqCst,
            );
        }
    }
}

/// Install the terminal logger for the whole process
pub fn setup(verbosity: Verbosity) -> Result<(), SetLoggerError> {
    TermLogger::init(
        verbosity.filter(),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(Verbosity::from_level(0), Verbosity::Quiet);
        assert_eq!(Verbosity::from_level(2), Verbosity::Verbose);
        assert_eq!(Verbosity::from_level(9), Verbosity::Extensive);
        assert_eq!(Verbosity::Quiet.filter(), LevelFilter::Off);
        assert_eq!(Verbosity::Verbose.filter(), LevelFilter::Debug);
        assert!(Verbosity::Normal < Verbosity::Extensive);
    }

    #[test]
    fn tracer_sessions() {
        let outer = Tracer::new("outer".into());
        let inner = Tracer::new("inner".into());
        match (outer.depth(), inner.depth()) {
            (Some(o), Some(i)) => assert!(i > o),
            (None, None) => (),
            _ => panic!("sessions disagree on the parallel mode"),
        }
        inner.log("first");
        inner.log("second");
        assert_eq!(inner.events(), 2);
        assert_eq!(outer.events(), 0);
    }
}
