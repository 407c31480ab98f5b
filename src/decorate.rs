//! Command decoration: ordered text transforms applied to a command
//! before it is logged or executed.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A single command-text transform.
#[derive(Clone)]
pub struct Decorator(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl Decorator {
    /// Create a decorator from a text transform.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Apply this decorator alone.
    pub fn apply(&self, cmd: &str) -> String {
        (self.0)(cmd)
    }
}

impl fmt::Debug for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Decorator(..)")
    }
}

/// Ordered chain of decorators, applied left to right.
#[derive(Debug, Clone, Default)]
pub struct DecorateChain {
    decorators: Vec<Decorator>,
}

impl DecorateChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decorator.
    pub fn push(&mut self, decorator: Decorator) {
        self.decorators.push(decorator);
    }

    /// Number of decorators in the chain.
    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    /// Apply every decorator in order.
    pub fn decorate(&self, cmd: &str) -> String {
        self.decorators
            .iter()
            .fold(cmd.to_string(), |acc, d| d.apply(&acc))
    }
}

/// Make an encoded shell command readable for logs.
///
/// When `cmd` mentions `powershell`, the token following `-E` or
/// `-EncodedCommand` is base64-decoded and NUL bytes are stripped from it.
/// Tokens that fail to decode are left as they are.
pub fn expand_encoded(cmd: &str) -> String {
    if !cmd.contains("powershell") {
        return cmd.to_string();
    }

    let mut parts: Vec<String> = cmd.split(' ').map(str::to_string).collect();
    for i in 0..parts.len().saturating_sub(1) {
        if parts[i] != "-E" && parts[i] != "-EncodedCommand" {
            continue;
        }
        if let Ok(decoded) = STANDARD.decode(parts[i + 1].as_bytes()) {
            parts[i + 1] = String::from_utf8_lossy(&decoded).replace('\0', "");
        }
    }
    parts.join(" ")
}
