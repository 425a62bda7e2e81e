use std::collections::HashMap;
use std::io::{self, Read, Write};

use crate::common::value::{Range, Value};
use crate::vm::trace::Trace;

/// A builtin takes its arguments in call order and writes any output
/// to the executor's sink.
pub type BuiltinFn = fn(&[Value], &mut dyn Write) -> Result<Value, Trace>;

/// The fixed builtin registry shared by the VM and the tree-walker.
/// It is built once at executor construction and never changes.
///
/// The `@range_*` accessors are internal: `@` can't appear in an
/// identifier, so source code can never name them. The generator uses
/// them to take a range value apart for `for` loops.
pub struct Builtins {
    map: HashMap<&'static str, BuiltinFn>,
}

impl Builtins {
    pub fn new() -> Builtins {
        let mut map: HashMap<&'static str, BuiltinFn> = HashMap::new();

        map.insert("print", print);
        map.insert("len", len);
        map.insert("range", range);
        map.insert("scan", scan);
        map.insert("read", read);
        map.insert("@range_start", |args, _| range_field(args, |r| r.start));
        map.insert("@range_end", |args, _| range_field(args, |r| r.end));
        map.insert("@range_step", |args, _| range_field(args, |r| r.step));

        Builtins { map }
    }

    /// Runs a builtin. `None` means no builtin has that name.
    pub fn call(
        &self,
        name: &str,
        args: &[Value],
        out: &mut dyn Write,
    ) -> Option<Result<Value, Trace>> {
        self.map.get(name).map(|builtin| builtin(args, out))
    }
}

/// Prints the arguments separated by single spaces. No trailing
/// newline; programs spell their own with `"\n"`.
fn print(args: &[Value], out: &mut dyn Write) -> Result<Value, Trace> {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            let _ = write!(out, " ");
        }
        let _ = write!(out, "{}", arg);
    }
    let _ = out.flush();

    Ok(Value::None)
}

fn len(args: &[Value], _out: &mut dyn Write) -> Result<Value, Trace> {
    match args {
        [Value::Str(s)] => Ok(Value::Int(s.chars().count() as i64)),
        [Value::Array(items)] => Ok(Value::Int(items.len() as i64)),
        _ => Err(Trace::LenArgument),
    }
}

fn range(args: &[Value], _out: &mut dyn Write) -> Result<Value, Trace> {
    if args.len() < 2 || args.len() > 3 {
        return Err(Trace::RangeArity);
    }

    let mut bounds = [0i64; 3];
    bounds[2] = 1;
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Value::Int(n) => bounds[i] = *n,
            _ => return Err(Trace::RangeArgument),
        }
    }

    if bounds[2] == 0 {
        return Err(Trace::RangeZeroStep);
    }

    Ok(Value::Range(Range { start: bounds[0], end: bounds[1], step: bounds[2] }))
}

fn scan(_args: &[Value], _out: &mut dyn Write) -> Result<Value, Trace> {
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(_) => {
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            Ok(Value::Str(line))
        },
        Err(_) => Err(Trace::InputFailed),
    }
}

fn read(_args: &[Value], _out: &mut dyn Write) -> Result<Value, Trace> {
    let mut contents = String::new();
    match io::stdin().read_to_string(&mut contents) {
        Ok(_) => Ok(Value::Str(contents)),
        Err(_) => Err(Trace::InputFailed),
    }
}

fn range_field(args: &[Value], field: fn(&Range) -> i64) -> Result<Value, Trace> {
    match args {
        [Value::Range(r)] => Ok(Value::Int(field(r))),
        _ => Err(Trace::NotARange),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, Trace> {
        let mut out = vec![];
        Builtins::new().call(name, args, &mut out).expect("builtin exists")
    }

    #[test]
    fn print_separates_with_spaces() {
        let builtins = Builtins::new();
        let mut out = vec![];
        builtins
            .call("print", &[Value::Int(1), Value::Str("two".into())], &mut out)
            .unwrap()
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "1 two");
    }

    #[test]
    fn len_of_strings_and_arrays() {
        assert_eq!(call("len", &[Value::Str("héllo".into())]), Ok(Value::Int(5)));
        assert_eq!(
            call("len", &[Value::Array(vec![Value::Int(0); 4])]),
            Ok(Value::Int(4)),
        );
        assert_eq!(call("len", &[Value::Int(3)]), Err(Trace::LenArgument));
    }

    #[test]
    fn range_validation() {
        assert_eq!(
            call("range", &[Value::Int(0), Value::Int(5)]),
            Ok(Value::Range(Range { start: 0, end: 5, step: 1 })),
        );
        assert_eq!(call("range", &[Value::Int(0)]), Err(Trace::RangeArity));
        assert_eq!(
            call("range", &[Value::Float(0.5), Value::Int(5)]),
            Err(Trace::RangeArgument),
        );
        assert_eq!(
            call("range", &[Value::Int(0), Value::Int(5), Value::Int(0)]),
            Err(Trace::RangeZeroStep),
        );
    }

    #[test]
    fn range_accessors() {
        let range = Value::Range(Range { start: 2, end: 9, step: 3 });
        assert_eq!(call("@range_start", &[range.clone()]), Ok(Value::Int(2)));
        assert_eq!(call("@range_end", &[range.clone()]), Ok(Value::Int(9)));
        assert_eq!(call("@range_step", &[range]), Ok(Value::Int(3)));
        assert_eq!(call("@range_step", &[Value::Int(1)]), Err(Trace::NotARange));
    }

    #[test]
    fn unknown_builtins_are_none() {
        let mut out = vec![];
        assert!(Builtins::new().call("blargh", &[], &mut out).is_none());
    }
}
