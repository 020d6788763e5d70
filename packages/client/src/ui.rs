//! UI utilities for the client.

use std::{
    io::Write,
    sync::{Arc, Mutex},
};

/// Prompt shared between the input thread and the render loop
#[derive(Debug, Clone, Default)]
pub struct Prompt(Arc<Mutex<String>>);

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Arc::new(Mutex::new(text.into())))
    }

    pub fn get(&self) -> String {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set(&self, text: impl Into<String>) {
        *self
            .0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = text.into();
    }

    /// Redisplay the prompt after printing output
    pub fn redisplay(&self) {
        print!("{}", self.get());
        std::io::stdout().flush().ok();
    }
}
