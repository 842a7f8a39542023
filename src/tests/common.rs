//! Common fixtures for tests.
//!
//! This module contains:
//! - `PortError` / `parse_port`: a fallible parser for error assertions
//! - `Inventory`: nested composite values for deep equality
//! - `Recorder`: a `TB` that is neither `T` nor `B` and records every call
//! - `init_test_logging`: tracing output routed through the test writer

use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::Once;

use crate::{Halt, Report, RunId, F, TB};

static INIT_LOGGING: Once = Once::new();

/// Initialize tracing output for tests. Safe to call repeatedly.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

// ============================================================================
// Error Type
// ============================================================================

/// Errors from parsing a port number.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum PortError {
    /// Input was not a number.
    #[error("invalid port {0:?}")]
    Invalid(String),

    /// Port zero is reserved.
    #[error("port 0 is reserved")]
    Reserved,
}

pub fn parse_port(raw: &str) -> Result<u16, PortError> {
    match raw.parse::<u16>() {
        Ok(0) => Err(PortError::Reserved),
        Ok(port) => Ok(port),
        Err(_) => Err(PortError::Invalid(raw.to_string())),
    }
}

// ============================================================================
// Composite Values
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Owner {
    pub name: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    pub items: Vec<(String, u32)>,
    pub tags: HashMap<String, Vec<u8>>,
    pub owner: Option<Box<Owner>>,
}

pub fn inventory() -> Inventory {
    Inventory {
        items: vec![("bolt".into(), 40), ("nut".into(), 12)],
        tags: HashMap::from([
            ("metal".to_string(), vec![1, 2]),
            ("small".to_string(), vec![3]),
        ]),
        owner: Some(Box::new(Owner {
            name: "stores".into(),
            aliases: vec!["depot".into()],
        })),
    }
}

// ============================================================================
// Recording Context
// ============================================================================

/// One call received by a `Recorder`.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Helper(u32),
    Log(String),
    Error(String),
    Fatal(String),
}

/// A context that is neither `T` nor `B`.
pub struct Recorder {
    id: RunId,
    events: RefCell<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            id: RunId::new(),
            events: RefCell::default(),
        }
    }

    /// Apply `action`, returning `true` if it halted the context.
    pub fn run(&self, action: &F) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(|| action.call(self))) {
            Ok(()) => false,
            Err(payload) if payload.downcast_ref::<Halt>().map(|h| h.owner) == Some(self.id) => {
                true
            }
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Messages of every error and fatal event, in order.
    pub fn messages(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Error(m) | Event::Fatal(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl TB for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn helper(&self, caller: &'static Location<'static>) {
        self.push(Event::Helper(caller.line()));
    }

    fn log(&self, message: &str) {
        self.push(Event::Log(message.to_string()));
    }

    fn error(&self, message: String) {
        self.push(Event::Error(message));
    }

    fn fatal(&self, message: String) -> ! {
        self.push(Event::Fatal(message));
        panic::resume_unwind(Box::new(Halt { owner: self.id }))
    }

    fn failed(&self) -> bool {
        self.events
            .borrow()
            .iter()
            .any(|event| matches!(event, Event::Error(_) | Event::Fatal(_)))
    }
}

// ============================================================================
// Report Helpers
// ============================================================================

/// Messages of every failure in the report tree, depth first.
pub fn messages(report: &Report) -> Vec<String> {
    report
        .all_failures()
        .into_iter()
        .map(|failure| failure.message.clone())
        .collect()
}
