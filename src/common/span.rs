use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use crate::common::source::Source;

/// A `Span` refers to a section of a source,
/// much like a `&str`, but with a reference to a `Source` rather than a `String`.
/// A `Span` is meant to be paired with other datastructures,
/// to be used during error reporting.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Span {
    source: Option<Rc<Source>>,
    offset: usize,
    length: usize,
}

impl Span {
    /// Creates a new `Span` from an offset with a length.
    /// All `Span`s have access to the `Source` from whence they came,
    /// so they can't be misinterpreted or miscombined.
    pub fn new(source: &Rc<Source>, offset: usize, length: usize) -> Span {
        Span { source: Some(Rc::clone(source)), offset, length }
    }

    /// A `Span` that points at a specific point in the source.
    pub fn point(source: &Rc<Source>, offset: usize) -> Span {
        Span { source: Some(Rc::clone(source)), offset, length: 1 }
    }

    /// Creates a new empty `Span`.
    /// An empty `Span` has no source;
    /// if combined with another `Span`, the result is just the other.
    pub fn empty() -> Span {
        Span { source: None, offset: 0, length: 0 }
    }

    /// Checks if a `Span` is empty.
    pub fn is_empty(&self) -> bool {
        self.source.is_none()
    }

    /// Creates a new `Span` which spans the space of the previous two.
    /// ```plain
    /// hello this is cool
    /// ^^^^^              | Span a
    ///            ^^      | Span b
    /// ^^^^^^^^^^^^^      | combined
    /// ```
    pub fn combine(a: &Span, b: &Span) -> Span {
        if a.is_empty() { return b.clone(); }
        if b.is_empty() { return a.clone(); }

        if a.source != b.source {
            panic!("Can't combine two Spans with separate sources")
        }

        let offset = a.offset.min(b.offset);
        let end    = (a.offset + a.length).max(b.offset + b.length);

        Span::new(a.source.as_ref().unwrap(), offset, end - offset)
    }

    /// Combines a set of `Span`s (think fold-left over `Span::combine`).
    pub fn join(mut spans: Vec<Span>) -> Span {
        let mut combined = match spans.pop() {
            Some(span) => span,
            None       => return Span::empty(),
        };

        while let Some(span) = spans.pop() {
            combined = Span::combine(&combined, &span)
        }

        combined
    }

    /// Returns the contents of a `Span`.
    /// This indexes into the source file,
    /// so an empty `Span` will panic.
    pub fn contents(&self) -> String {
        if self.is_empty() { panic!("An empty span does not have any contents") }
        let contents = &self.source.as_ref().unwrap().contents;
        let end = (self.offset + self.length).min(contents.len());
        contents[self.offset..end].to_string()
    }

    /// The zero-indexed line and column the `Span` starts on.
    fn line_col(&self) -> (usize, usize) {
        let contents = &self.source.as_ref().unwrap().contents;
        let offset = self.offset.min(contents.len());

        let before = &contents[..offset];
        let line = before.matches('\n').count();
        let col = offset - before.rfind('\n').map(|n| n + 1).unwrap_or(0);

        (line, col)
    }
}

impl Display for Span {
    /// Prints out where the `Span` occurs in its source:
    /// ```plain
    /// Line 12:5
    ///    |
    /// 12 | x = blatant { error }
    ///    |     ^^^^^^^^^^^^^^^^^
    /// ```
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "at end of source");
        }

        let (line, col) = self.line_col();
        let text = self.source.as_ref().unwrap()
            .contents.lines().nth(line).unwrap_or("");

        let readable_line = (line + 1).to_string();
        let padding = " ".repeat(readable_line.len());
        let carets  = self.length
            .min(text.len().saturating_sub(col))
            .max(1);

        writeln!(f, "Line {}:{}", readable_line, col + 1)?;
        writeln!(f, "{} |", padding)?;
        writeln!(f, "{} | {}", readable_line, text)?;
        writeln!(f, "{} | {}{}", padding, " ".repeat(col), "^".repeat(carets))
    }
}

/// A wrapper for spanning types.
/// For example, a `Token`, such as
/// ```plain
/// pub enum Token {
///     Number(f64),
///     Open,
///     Close,
/// }
/// ```
/// or the like, can be spanned to indicate where it was scanned from
/// (a `Spanned<Token>`).
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub item: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(item: T, span: Span) -> Spanned<T> {
        Spanned { item, span }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn combination() {
        let source = Source::source("heck, that's awesome");
        let a = Span::new(&source, 0, 5);
        let b = Span::new(&source, 11, 2);

        assert_eq!(Span::combine(&a, &b), Span::new(&source, 0, 13));
    }

    #[test]
    fn span_and_contents() {
        let source = Source::source("hello, this is some text!");
        let spans  = vec![
            Span::new(&source, 0,  8),
            Span::new(&source, 7,  5),
            Span::new(&source, 12, 4),
        ];
        let result = Span::new(&source, 0, 16);

        assert_eq!(Span::join(spans).contents(), result.contents());
    }

    #[test]
    fn line_and_column() {
        let source = Source::source("one\ntwo\nthree");
        let span  = Span::new(&source, 8, 5);
        let shown = format!("{}", span);

        assert!(shown.starts_with("Line 3:1"));
        assert!(shown.contains("3 | three"));
        assert!(shown.contains("^^^^^"));
    }
}
