use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

/// The static types the analyzer reasons about.
/// `Unknown` marks expressions that already failed to check;
/// it's compatible with everything so one mistake doesn't cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,
    Float,
    Str,
    Bool,
    None,
    Unknown,
}

impl DataType {
    /// Resolves a written type name. `None` means the name isn't a type.
    pub fn from_name(name: &str) -> Option<DataType> {
        match name {
            "int"   => Some(DataType::Int),
            "float" => Some(DataType::Float),
            "str"   => Some(DataType::Str),
            "bool"  => Some(DataType::Bool),
            _       => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }

    /// Whether a value of type `source` may be used where `target` is
    /// expected. The only implicit conversion is `int` to `float`.
    pub fn accepts(target: DataType, source: DataType) -> bool {
        if target == source { return true; }
        if target == DataType::Unknown || source == DataType::Unknown { return true; }

        target == DataType::Float && source == DataType::Int
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int     => "int",
            DataType::Float   => "float",
            DataType::Str     => "str",
            DataType::Bool    => "bool",
            DataType::None    => "none",
            DataType::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Module,
}

/// One named thing the analyzer knows about. Functions live in the
/// global scope under `module.name` and carry their parameter types;
/// modules live there under their bare name.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name:        String,
    pub kind:        SymbolKind,
    pub data_type:   DataType,
    pub scope_level: usize,
    pub module:      Option<String>,
    pub mutable:     bool,
    pub is_array:    bool,
    pub params:      Option<Vec<DataType>>,
}

/// The scope stack. The bottom entry is the global scope; blocks,
/// function bodies, and loop heads push and pop entries above it.
/// Lookup walks top-down and returns the first match.
#[derive(Debug)]
pub struct Scopes {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl Scopes {
    pub fn new() -> Scopes {
        Scopes { scopes: vec![HashMap::new()] }
    }

    pub fn enter(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn level(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Declares a variable in the current scope. Shadowing an outer
    /// binding is fine; colliding with one in the same scope is not.
    pub fn declare_variable(
        &mut self,
        name: &str,
        data_type: DataType,
        mutable: bool,
        is_array: bool,
    ) -> Result<(), String> {
        let level = self.level();
        let current = self.scopes.last_mut().unwrap();

        if current.contains_key(name) {
            return Err(format!(
                "Variable '{}' is already declared in the current scope",
                name,
            ));
        }

        current.insert(name.to_string(), Symbol {
            name: name.to_string(),
            kind: SymbolKind::Variable,
            data_type,
            scope_level: level,
            module: None,
            mutable,
            is_array,
            params: None,
        });
        Ok(())
    }

    /// Declares a function in the global scope, keyed by its
    /// fully-qualified `module.name`.
    pub fn declare_function(
        &mut self,
        name: &str,
        module: &str,
        return_type: DataType,
        params: Option<Vec<DataType>>,
    ) -> Result<(), String> {
        let full = format!("{}.{}", module, name);
        let global = &mut self.scopes[0];

        if global.contains_key(&full) {
            return Err(format!("Function '{}' is already declared", full));
        }

        global.insert(full, Symbol {
            name: name.to_string(),
            kind: SymbolKind::Function,
            data_type: return_type,
            scope_level: 0,
            module: Some(module.to_string()),
            mutable: false,
            is_array: false,
            params,
        });
        Ok(())
    }

    /// Declares a module by its bare name. Redeclaring a module is
    /// idempotent; colliding with a non-module name is an error.
    pub fn declare_module(&mut self, name: &str) -> Result<(), String> {
        let global = &mut self.scopes[0];

        if let Some(existing) = global.get(name) {
            if existing.kind != SymbolKind::Module {
                return Err(format!("Name '{}' is already used", name));
            }
            return Ok(());
        }

        global.insert(name.to_string(), Symbol {
            name: name.to_string(),
            kind: SymbolKind::Module,
            data_type: DataType::None,
            scope_level: 0,
            module: None,
            mutable: false,
            is_array: false,
            params: None,
        });
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        for scope in self.scopes.iter().rev() {
            if let Some(symbol) = scope.get(name) {
                return Some(symbol);
            }
        }
        None
    }

    /// Hides every scope above the global one, returning them so they
    /// can be put back. Function bodies are checked against the global
    /// scope alone, because functions capture nothing else.
    pub fn isolate(&mut self) -> Vec<HashMap<String, Symbol>> {
        self.scopes.split_off(1)
    }

    pub fn restore(&mut self, hidden: Vec<HashMap<String, Symbol>>) {
        self.scopes.extend(hidden);
    }
}
