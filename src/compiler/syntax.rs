use std::fmt::{self, Display, Formatter};

use crate::common::span::Span;

/// Represents a static error: a message paired with the section of
/// source it refers to. The parser accumulates these rather than
/// stopping at the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct Syntax {
    pub message: String,
    pub span:    Span,
}

impl Syntax {
    pub fn error(message: &str, span: &Span) -> Syntax {
        Syntax { message: message.to_string(), span: span.clone() }
    }
}

impl Display for Syntax {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if !self.span.is_empty() {
            write!(f, "{}", self.span)?;
        }
        write!(f, "Syntax Error: {}", self.message)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::source::Source;

    #[test]
    fn renders_location_and_message() {
        let source = Source::source("var x =");
        let error = Syntax::error("missing type and initializer", &Span::new(&source, 4, 1));
        let shown = format!("{}", error);

        assert!(shown.contains("Line 1:5"));
        assert!(shown.ends_with("Syntax Error: missing type and initializer"));
    }
}
