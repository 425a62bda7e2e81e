use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use crate::common::opcode::Op;
use crate::common::value::Value;

/// A compiled program: a flat instruction stream over a constant pool.
/// Function bodies are emitted inline, behind a jump, with their entry
/// offsets recorded in `labels`. Name operands index into `names` so
/// instructions stay small and names are stored once.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub code:      Vec<Op>,
    pub constants: Vec<Value>,
    pub names:     Vec<String>,
    pub labels:    HashMap<String, usize>,
}

impl Module {
    /// Creates a new empty `Module` to be filled.
    pub fn empty() -> Module {
        Module {
            code:      vec![],
            constants: vec![],
            names:     vec![],
            labels:    HashMap::new(),
        }
    }

    /// Emits an instruction, returning its offset.
    pub fn emit(&mut self, op: Op) -> usize {
        self.code.push(op);
        self.code.len() - 1
    }

    /// The offset the next instruction will land on.
    pub fn position(&self) -> usize {
        self.code.len()
    }

    /// Given a constant, this function adds it to the constant pool
    /// and returns its index. The pool is push-only and deduplicated,
    /// so equal constants share an entry.
    pub fn index_constant(&mut self, value: Value) -> usize {
        match self.constants.iter().position(|c| c == &value) {
            Some(index) => index,
            None => {
                self.constants.push(value);
                self.constants.len() - 1
            },
        }
    }

    /// Interns a name, returning its index in the name table.
    pub fn index_name(&mut self, name: &str) -> usize {
        match self.names.iter().position(|n| n == name) {
            Some(index) => index,
            None => {
                self.names.push(name.to_string());
                self.names.len() - 1
            },
        }
    }

    /// Points a forward jump emitted earlier at `target`.
    pub fn patch(&mut self, at: usize, target: usize) {
        self.code[at].patch_target(target);
    }

    /// Records the current position as the entry point of a function.
    pub fn label(&mut self, name: &str) {
        self.labels.insert(name.to_string(), self.position());
    }
}

impl Display for Module {
    /// Dumps a human-readable disassembly, constants first.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- constants:")?;
        for (i, constant) in self.constants.iter().enumerate() {
            writeln!(f, "{:>4}  {:?}", i, constant)?;
        }

        let mut entries: Vec<(&String, &usize)> = self.labels.iter().collect();
        entries.sort_by_key(|(_, addr)| **addr);
        if !entries.is_empty() {
            writeln!(f, "-- functions:")?;
            for (name, addr) in entries {
                writeln!(f, "{:>4}  {}", addr, name)?;
            }
        }

        writeln!(f, "-- code:")?;
        for (i, op) in self.code.iter().enumerate() {
            let detail = match op {
                Op::Con(c) => format!("Con {}\t; {:?}", c, self.constants[*c]),
                Op::Load(n) => format!("Load {}", self.names[*n]),
                Op::Store(n) => format!("Store {}", self.names[*n]),
                Op::Declare(n) => format!("Declare {}", self.names[*n]),
                Op::LoadGlobal(n) => format!("LoadGlobal {}", self.names[*n]),
                Op::StoreGlobal(n) => format!("StoreGlobal {}", self.names[*n]),
                Op::Jmp(t) => format!("Jmp {}", t),
                Op::JmpTrue(t) => format!("JmpTrue {}", t),
                Op::JmpFalse(t) => format!("JmpFalse {}", t),
                Op::Call { argc, name } =>
                    format!("Call {} {}", argc, self.names[*name]),
                Op::Builtin { argc, name } =>
                    format!("Builtin {} {}", argc, self.names[*name]),
                Op::Format { con, argc } =>
                    format!("Format {} {}\t; {:?}", con, argc, self.constants[*con]),
                plain => format!("{:?}", plain),
            };
            writeln!(f, "{:>4}  {}", i, detail)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn constants_are_deduplicated() {
        let mut module = Module::empty();
        let a = module.index_constant(Value::Int(7));
        let b = module.index_constant(Value::Str("seven".to_string()));
        let c = module.index_constant(Value::Int(7));

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(module.constants.len(), 2);
    }

    #[test]
    fn names_are_interned() {
        let mut module = Module::empty();
        let x = module.index_name("x");
        let y = module.index_name("y");

        assert_eq!(x, module.index_name("x"));
        assert_ne!(x, y);
        assert_eq!(module.names, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn patching_rewrites_targets() {
        let mut module = Module::empty();
        let jump = module.emit(Op::Jmp(usize::MAX));
        module.emit(Op::Halt);
        module.patch(jump, 1);

        assert_eq!(module.code[jump], Op::Jmp(1));
    }
}
