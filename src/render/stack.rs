use crate::scope::{Resolve, Scope};
use serde_json::Value;
use std::collections::HashMap;

/// Render-time bindings laid over a borrowed [`Scope`].
///
/// The base scope is read-only; names bound during a render go into
/// frames. The root frame holds top-level statement bindings and lives as
/// long as the render, while each loop iteration gets a frame of its own.
/// Resolution searches the frames innermost first, then the base scope.
pub struct Stack<'render> {
    base: &'render Scope,
    frames: Vec<HashMap<String, Value>>,
}

impl<'render> Stack<'render> {
    /// Create a new Stack over the given base scope.
    pub fn new(base: &'render Scope) -> Self {
        Self {
            base,
            frames: vec![HashMap::new()],
        }
    }

    /// Open a new innermost frame.
    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Discard the innermost frame and every binding made in it.
    ///
    /// The root frame is never discarded.
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Bind a name in the innermost frame, shadowing any outer binding
    /// of the same name.
    pub fn bind(&mut self, name: String, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name, value);
        }
    }
}

impl Resolve for Stack<'_> {
    fn resolve(&self, name: &str) -> Option<&Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .or_else(|| self.base.resolve(name))
    }
}
