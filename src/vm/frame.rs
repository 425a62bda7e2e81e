use std::collections::HashMap;

use crate::common::value::Value;

/// One call on the call stack: who was called, where to resume the
/// caller, and the callee's locals. Frames never see each other's
/// locals directly; the VM walks the stack on lookup.
#[derive(Debug)]
pub struct Frame {
    pub function:       String,
    pub return_address: usize,
    locals:             HashMap<String, Value>,
}

impl Frame {
    pub fn new(function: &str, return_address: usize) -> Frame {
        Frame {
            function: function.to_string(),
            return_address,
            locals: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    /// Overwrites an existing local. Returns false if the name isn't
    /// bound in this frame, so the caller can keep walking.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.locals.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            },
            None => false,
        }
    }

    /// Binds a name in this frame, shadowing nothing and asking no
    /// questions.
    pub fn declare(&mut self, name: &str, value: Value) {
        self.locals.insert(name.to_string(), value);
    }
}
