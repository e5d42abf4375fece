//! Recording display interface for unit tests.

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::blocking::delay::DelayUs;

use crate::interface::{DisplayError, DisplayInterface};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Init,
    Reset,
    Start,
    End,
    Command(u8),
    Data(Vec<u8>),
}

/// Logs every framer call. Writes outside a transaction fail the test.
#[derive(Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    in_transaction: bool,
    busy_script: RefCell<VecDeque<bool>>,
    always_busy: bool,
    busy_reads: Cell<usize>,
    refresh_polls: usize,
    busy_left: Cell<usize>,
    last_command: Option<u8>,
    update_option: u8,
    while_busy: Vec<u8>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Busy line readings returned in order, idle once exhausted.
    pub fn with_busy(self, readings: &[bool]) -> Self {
        self.busy_script.borrow_mut().extend(readings.iter().copied());
        self
    }

    pub fn always_busy(mut self) -> Self {
        self.always_busy = true;
        self
    }

    /// Report busy for `polls` reads after every display refresh
    /// activation, like the real panel does.
    pub fn busy_after_refresh(mut self, polls: usize) -> Self {
        self.refresh_polls = polls;
        self
    }

    /// Commands written while the modelled refresh was still running.
    pub fn commands_while_busy(&self) -> Vec<u8> {
        self.while_busy.clone()
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.always_busy = busy;
    }

    pub fn busy_reads(&self) -> usize {
        self.busy_reads.get()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.while_busy.clear();
        self.busy_reads.set(0);
    }

    /// Events grouped per chip-select window.
    pub fn transactions(&self) -> Vec<Vec<Event>> {
        let mut out = Vec::new();
        let mut current = None;
        for event in &self.events {
            match event {
                Event::Start => current = Some(Vec::new()),
                Event::End => out.extend(current.take()),
                other => {
                    if let Some(events) = current.as_mut() {
                        events.push(other.clone());
                    }
                }
            }
        }
        out
    }

    pub fn transaction_count(&self) -> usize {
        self.events.iter().filter(|e| **e == Event::Start).count()
    }

    pub fn commands(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Command(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn count_command(&self, command: u8) -> usize {
        self.commands().iter().filter(|&&c| c == command).count()
    }

    /// Data bytes that followed each occurrence of `command`.
    pub fn data_after(&self, command: u8) -> Vec<Vec<u8>> {
        self.events
            .windows(2)
            .filter_map(|w| match (&w[0], &w[1]) {
                (Event::Command(c), Event::Data(d)) if *c == command => Some(d.clone()),
                _ => None,
            })
            .collect()
    }
}

impl DisplayInterface for Recorder {
    fn init<D>(&mut self, delay: &mut D) -> Result<(), DisplayError>
    where
        D: DelayUs<u32>,
    {
        self.events.push(Event::Init);
        self.reset(delay)
    }

    fn reset<D>(&mut self, _delay: &mut D) -> Result<(), DisplayError>
    where
        D: DelayUs<u32>,
    {
        self.events.push(Event::Reset);
        Ok(())
    }

    fn start_transaction(&mut self) -> Result<(), DisplayError> {
        if self.in_transaction {
            return Err(DisplayError::NestedTransaction);
        }
        self.in_transaction = true;
        self.events.push(Event::Start);
        Ok(())
    }

    fn end_transaction(&mut self) -> Result<(), DisplayError> {
        assert!(self.in_transaction, "end without start");
        self.in_transaction = false;
        self.events.push(Event::End);
        Ok(())
    }

    fn write_command(&mut self, command: u8) -> Result<(), DisplayError> {
        assert!(self.in_transaction, "command {:#x} outside a transaction", command);
        self.events.push(Event::Command(command));
        if self.busy_left.get() > 0 {
            self.while_busy.push(command);
        }
        if command == 0x20 && self.update_option & 0x04 != 0 {
            self.busy_left.set(self.refresh_polls);
        }
        self.last_command = Some(command);
        Ok(())
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        assert!(self.in_transaction, "data outside a transaction");
        self.events.push(Event::Data(data.to_vec()));
        if let (Some(0x22), Some(&option)) = (self.last_command, data.first()) {
            self.update_option = option;
        }
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.busy_reads.set(self.busy_reads.get() + 1);
        if let Some(busy) = self.busy_script.borrow_mut().pop_front() {
            return busy;
        }
        match self.busy_left.get() {
            0 => self.always_busy,
            left => {
                self.busy_left.set(left - 1);
                true
            }
        }
    }
}
