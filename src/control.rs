//! Line-based selection control surface.
//!
//! Commands arrive on stdin (or any reader) and mutate the shared
//! [`SelectionState`]; the frame loop picks them up on its next frame.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::{Error, Result};
use crate::registry::{BackgroundTable, FilterRegistry};
use crate::selection::SelectionState;
use crate::ui::SelectorStrip;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `filter <name>` or `filter none`
    Filter(Option<String>),
    /// `background <name>` or `background none`
    Background(Option<String>),
    /// `click <x> <y>`: pick the filter whose selector icon is under the point
    Click(i32, i32),
    List,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let choice = |name: &str| (name != "none").then(|| name.to_string());

        match words.as_slice() {
            ["filter" | "f", name] => Some(Command::Filter(choice(name))),
            ["background" | "bg" | "b", name] => Some(Command::Background(choice(name))),
            ["click", x, y] => Some(Command::Click(x.parse().ok()?, y.parse().ok()?)),
            ["list" | "ls"] => Some(Command::List),
            ["quit" | "q" | "exit"] => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Validates selection requests against what is actually available.
pub struct Controller {
    selection: SelectionState,
    filters: Vec<String>,
    backgrounds: Vec<String>,
    selector: SelectorStrip,
}

impl Controller {
    pub fn new(
        selection: SelectionState,
        registry: &FilterRegistry,
        backgrounds: &BackgroundTable,
    ) -> Self {
        Self {
            selection,
            filters: registry.names().into_iter().map(String::from).collect(),
            backgrounds: backgrounds.names().into_iter().map(String::from).collect(),
            selector: SelectorStrip::new(registry),
        }
    }

    /// Select a registered filter, or clear it with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFilter`] and leaves the selection unchanged if
    /// the name is not registered.
    pub fn select_filter(&self, name: Option<&str>) -> Result<()> {
        if let Some(name) = name {
            if !self.filters.iter().any(|f| f == name) {
                return Err(Error::UnknownFilter(name.to_string()));
            }
        }
        self.selection.set_filter(name.map(String::from));
        Ok(())
    }

    /// Select a background, or clear it with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownBackground`] and leaves the selection unchanged
    /// if the name is not in the table.
    pub fn select_background(&self, name: Option<&str>) -> Result<()> {
        if let Some(name) = name {
            if !self.backgrounds.iter().any(|b| b == name) {
                return Err(Error::UnknownBackground(name.to_string()));
            }
        }
        self.selection.set_background(name.map(String::from));
        Ok(())
    }

    /// Apply one command; returns `false` once the session should stop.
    pub fn apply(&self, command: Command) -> Result<bool> {
        match command {
            Command::Filter(name) => self.select_filter(name.as_deref())?,
            Command::Background(name) => self.select_background(name.as_deref())?,
            Command::Click(x, y) => match self.selector.hit_test(x, y) {
                Some(name) => self.select_filter(Some(name))?,
                None => tracing::debug!("Click at ({}, {}) is not on a filter icon", x, y),
            },
            Command::List => {
                tracing::info!("Filters: {}", self.filters.join(", "));
                tracing::info!("Backgrounds: {}", self.backgrounds.join(", "));
            }
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Read commands until EOF or `quit`, then raise `stop`.
    pub fn run<R: BufRead>(&self, reader: R, stop: &AtomicBool) {
        for line in reader.lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match Command::parse(&line) {
                Some(command) => match self.apply(command) {
                    Ok(true) => {}
                    Ok(false) => {
                        stop.store(true, Ordering::Release);
                        return;
                    }
                    Err(e) => tracing::warn!("{}", e),
                },
                None => tracing::warn!("Unrecognized command: {}", line.trim()),
            }
        }
        tracing::debug!("Control input closed");
    }

    /// Serve commands from stdin on a background thread.
    pub fn spawn_stdin(self, stop: Arc<AtomicBool>) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("selection-control".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                self.run(stdin.lock(), &stop);
            })
    }
}
