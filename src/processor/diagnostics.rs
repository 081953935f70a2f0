//! Warning accumulator threaded through one conversion.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    /// Layer (or property table) the problem was found in.
    pub layer: Option<String>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.layer {
            Some(layer) => write!(f, "{layer}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it immediately.
    pub fn warn(&mut self, layer: impl Into<String>, message: impl Into<String>) {
        let warning = Warning { layer: Some(layer.into()), message: message.into() };
        tracing::warn!(layer = warning.layer.as_deref(), "{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warn_global(&mut self, message: impl Into<String>) {
        let warning = Warning { layer: None, message: message.into() };
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}
