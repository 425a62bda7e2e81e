use std::fmt::{self, Display, Formatter};

/// A runtime error. These are non-fatal by design: the executor
/// reports the trace on stderr, the failing operation produces
/// `none`, and the program carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trace {
    DivisionByZero,
    ModuloByZero,
    IndexOutOfBounds { index: i64, size: usize },
    IndexNotInteger,
    NotAnArray,
    ArraySizeNotInteger,
    ArraySizeNegative,
    UndefinedVariable(String),
    UndefinedFunction(String),
    UnknownBuiltin(String),
    NotCallable(String),
    NotARange,
    /// A binary operator met operands it has no meaning for.
    Unsupported {
        op:    &'static str,
        left:  &'static str,
        right: &'static str,
    },
    LenArgument,
    RangeArity,
    RangeArgument,
    RangeZeroStep,
    InputFailed,
    StackUnderflow,
}

impl Trace {
    /// Prints the trace where runtime errors go: stderr.
    pub fn report(&self) {
        eprintln!("{}", self);
    }
}

impl Display for Trace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime Error: ")?;
        match self {
            Trace::DivisionByZero => write!(f, "Division by zero"),
            Trace::ModuloByZero => write!(f, "Modulo by zero"),
            Trace::IndexOutOfBounds { index, size } => {
                write!(f, "Array index out of bounds: {} (size={})", index, size)
            },
            Trace::IndexNotInteger => write!(f, "Array index must be an integer"),
            Trace::NotAnArray => write!(f, "Cannot index a non-array value"),
            Trace::ArraySizeNotInteger => write!(f, "Array size must be an integer"),
            Trace::ArraySizeNegative => write!(f, "Array size cannot be negative"),
            Trace::UndefinedVariable(name) => {
                write!(f, "Undefined variable '{}'", name)
            },
            Trace::UndefinedFunction(name) => {
                write!(f, "Function '{}' is not defined", name)
            },
            Trace::UnknownBuiltin(name) => write!(f, "Unknown builtin '{}'", name),
            Trace::NotCallable(name) => write!(f, "'{}' is not a function", name),
            Trace::NotARange => write!(f, "For loop requires a range value"),
            Trace::Unsupported { op, left, right } => {
                write!(f, "Cannot apply '{}' to {} and {}", op, left, right)
            },
            Trace::LenArgument => write!(f, "len() expects a string or an array"),
            Trace::RangeArity => write!(f, "range() expects 2 or 3 arguments"),
            Trace::RangeArgument => write!(f, "range() arguments must be integers"),
            Trace::RangeZeroStep => write!(f, "range() step cannot be zero"),
            Trace::InputFailed => write!(f, "Failed to read input"),
            Trace::StackUnderflow => write!(f, "Evaluation stack underflow"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn messages_carry_the_prefix() {
        assert_eq!(
            Trace::DivisionByZero.to_string(),
            "Runtime Error: Division by zero",
        );
        assert_eq!(
            Trace::IndexOutOfBounds { index: 3, size: 3 }.to_string(),
            "Runtime Error: Array index out of bounds: 3 (size=3)",
        );
    }
}
