use std::collections::HashMap;
use std::io::{self, Write};

use crate::common::value::{splice_format, FuncValue, Value};
use crate::compiler::ast::*;
use crate::vm::builtins::Builtins;
use crate::vm::trace::Trace;
use crate::vm::vm::{arith, compare, element_index, ArithOp, CmpOp};

/// Executes a program by walking its AST directly, the alternate
/// terminus to the compile-and-run path. Observable behavior matches
/// the VM: the two share the builtin registry, the operator
/// semantics, and the format splicer, and runtime errors are equally
/// non-fatal here.
pub struct Interp {
    /// Scope stack; the bottom entry is the global scope.
    scopes:   Vec<HashMap<String, Value>>,
    builtins: Builtins,
    out:      Box<dyn Write>,
}

/// How a statement left the surrounding control flow.
/// `Return` latches the value on its way out of the call.
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

impl Interp {
    /// An interpreter printing to stdout.
    pub fn new() -> Interp {
        Interp::with_output(Box::new(io::stdout()))
    }

    pub fn with_output(out: Box<dyn Write>) -> Interp {
        Interp {
            scopes: vec![HashMap::new()],
            builtins: Builtins::new(),
            out,
        }
    }

    /// Walks a program top to bottom, then invokes `main` if the
    /// program defined one.
    pub fn run(&mut self, program: &Program) {
        self.scopes = vec![HashMap::new()];

        // definitions are static; register every function up front so
        // a call can't depend on whether flow reached the `func` line
        self.hoist(&program.statements);

        for stmt in &program.statements {
            if let Flow::Return(_) = self.stmt(stmt) {
                break;
            }
        }

        if let Some(Value::Function(main)) = self.scopes[0].get("main").cloned() {
            self.call_function(&main, vec![]);
        }
    }

    fn hoist(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.hoist_stmt(stmt);
        }
    }

    fn hoist_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Function(func) => {
                let value = Value::Function(FuncValue {
                    def:           func.clone(),
                    // functions capture only the global scope
                    closure_level: 1,
                });
                self.scopes[0].insert(func.name.clone(), value);
                self.hoist(&func.body.statements);
            },
            Stmt::If { then, otherwise, .. } => {
                self.hoist_stmt(then);
                if let Some(otherwise) = otherwise {
                    self.hoist_stmt(otherwise);
                }
            },
            Stmt::While { body, .. } | Stmt::ForIn { body, .. } => {
                self.hoist(&body.statements);
            },
            Stmt::For { init, body, .. } => {
                if let Some(init) = init {
                    self.hoist_stmt(init);
                }
                self.hoist(&body.statements);
            },
            Stmt::Block(block) => self.hoist(&block.statements),
            _ => {},
        }
    }

    // scope plumbing

    fn declare(&mut self, name: &str, value: Value) {
        self.scopes.last_mut().unwrap().insert(name.to_string(), value);
    }

    /// Assigns wherever the name is bound, declaring in the current
    /// scope when nothing matches.
    fn assign(&mut self, name: &str, value: Value) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.declare(name, value);
    }

    fn get(&self, name: &str) -> Option<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Some(value.clone());
            }
        }
        None
    }

    fn fail(&mut self, trace: Trace) -> Value {
        trace.report();
        Value::None
    }

    // statements

    fn stmt(&mut self, stmt: &Stmt) -> Flow {
        match stmt {
            // imports and module headers are settled during analysis,
            // and definitions were hoisted before execution began
            Stmt::Import(_) | Stmt::Module(_) | Stmt::Function(_) => Flow::Normal,
            Stmt::Declaration(decl) => {
                let value = self.declaration_value(decl);
                self.declare(&decl.name, value);
                Flow::Normal
            },
            Stmt::If { condition, then, otherwise } => {
                if self.expr(condition).is_truthy() {
                    self.stmt(then)
                } else if let Some(otherwise) = otherwise {
                    self.stmt(otherwise)
                } else {
                    Flow::Normal
                }
            },
            Stmt::While { condition, body } => {
                loop {
                    if !self.expr(condition).is_truthy() {
                        break;
                    }
                    match self.block(body) {
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return flow,
                        Flow::Continue | Flow::Normal => {},
                    }
                }
                Flow::Normal
            },
            Stmt::ForIn { var, iterable, body } => self.for_in(var, iterable, body),
            Stmt::For { init, condition, step, body } => {
                self.scopes.push(HashMap::new());

                if let Some(init) = init {
                    self.stmt(init);
                }
                loop {
                    let live = match condition {
                        Some(condition) => self.expr(condition).is_truthy(),
                        None => true,
                    };
                    if !live {
                        break;
                    }

                    match self.block(body) {
                        Flow::Break => break,
                        flow @ Flow::Return(_) => {
                            self.scopes.pop();
                            return flow;
                        },
                        Flow::Continue | Flow::Normal => {},
                    }

                    if let Some(step) = step {
                        self.expr(step);
                    }
                }

                self.scopes.pop();
                Flow::Normal
            },
            Stmt::Return(value) => {
                let value = match value {
                    Some(value) => self.expr(value),
                    None        => Value::None,
                };
                Flow::Return(value)
            },
            Stmt::Break => Flow::Break,
            Stmt::Continue => Flow::Continue,
            Stmt::Expression(expr) => {
                self.expr(expr);
                Flow::Normal
            },
            Stmt::Block(block) => self.block(block),
        }
    }

    fn block(&mut self, block: &Block) -> Flow {
        self.scopes.push(HashMap::new());

        for stmt in &block.statements {
            match self.stmt(stmt) {
                Flow::Normal => {},
                flow => {
                    self.scopes.pop();
                    return flow;
                },
            }
        }

        self.scopes.pop();
        Flow::Normal
    }

    fn declaration_value(&mut self, decl: &Declaration) -> Value {
        if let Some(TypeExpr::Array { element, size }) = &decl.ty {
            let size = match self.expr(size) {
                Value::Int(size) => size,
                _ => return self.fail(Trace::ArraySizeNotInteger),
            };
            if size < 0 {
                return self.fail(Trace::ArraySizeNegative);
            }

            let code = match element.as_str() {
                "float" => crate::common::value::TYPE_FLOAT,
                "bool"  => crate::common::value::TYPE_BOOL,
                "str"   => crate::common::value::TYPE_STR,
                _       => crate::common::value::TYPE_INT,
            };
            return Value::Array(vec![Value::default_for(code); size as usize]);
        }

        match &decl.init {
            Some(init) => self.expr(init),
            None       => Value::None,
        }
    }

    fn for_in(&mut self, var: &str, iterable: &Expr, body: &Block) -> Flow {
        let range = match self.expr(iterable) {
            Value::Range(range) => range,
            _ => {
                self.fail(Trace::NotARange);
                return Flow::Normal;
            },
        };

        self.scopes.push(HashMap::new());
        self.declare(var, Value::Int(range.start));

        let ascending = range.step > 0;
        loop {
            let current = match self.get(var) {
                Some(Value::Int(current)) => current,
                _ => break,
            };

            let done = if ascending {
                current >= range.end
            } else {
                current <= range.end
            };
            if done {
                break;
            }

            match self.block(body) {
                Flow::Break => break,
                flow @ Flow::Return(_) => {
                    self.scopes.pop();
                    return flow;
                },
                Flow::Continue | Flow::Normal => {},
            }

            // the step happens even when the body continued
            self.assign(var, Value::Int(current + range.step));
        }

        self.scopes.pop();
        Flow::Normal
    }

    // expressions

    fn expr(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Number(n) => Value::from_number(*n),
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Ident(name) => match self.get(name) {
                Some(value) => value,
                None => self.fail(Trace::UndefinedVariable(name.to_string())),
            },
            Expr::Grouped(inner) => self.expr(inner),
            Expr::Unary { op, operand } => {
                let value = self.expr(operand);
                match op {
                    UnOp::Neg => match arith(ArithOp::Sub, Value::Int(0), value) {
                        Ok(value) => value,
                        Err(trace) => self.fail(trace),
                    },
                    UnOp::Not => Value::Bool(!value.is_truthy()),
                    UnOp::Pos => value,
                }
            },
            Expr::Binary { left, op, right } => self.binary(left, *op, right),
            Expr::Index { array, index } => {
                let array = self.expr(array);
                let index = self.expr(index);
                match element_index(&array, &index) {
                    Ok(i) => match array {
                        Value::Array(items) => items[i].clone(),
                        _ => Value::None,
                    },
                    Err(trace) => self.fail(trace),
                }
            },
            Expr::Call { callee, args } => self.call(callee, args),
            // bare module members aren't first-class
            Expr::Member { .. } => Value::None,
            Expr::Format { raw, placeholders } => {
                let values: Vec<Value> = placeholders
                    .iter()
                    .map(|(_, placeholder)| self.expr(placeholder))
                    .collect();
                Value::Str(splice_format(raw, &values))
            },
            Expr::Range(args) => {
                let values: Vec<Value> = args.iter().map(|a| self.expr(a)).collect();
                match self.builtins.call("range", &values, &mut *self.out) {
                    Some(Ok(value)) => value,
                    Some(Err(trace)) => self.fail(trace),
                    None => Value::None,
                }
            },
        }
    }

    fn binary(&mut self, left: &Expr, op: BinOp, right: &Expr) -> Value {
        match op {
            BinOp::Assign => return self.assignment(left, right),
            BinOp::And => {
                let value = self.expr(left);
                if !value.is_truthy() {
                    return Value::Bool(false);
                }
                return self.expr(right);
            },
            BinOp::Or => {
                let value = self.expr(left);
                if value.is_truthy() {
                    return Value::Bool(true);
                }
                return self.expr(right);
            },
            _ => {},
        }

        let l = self.expr(left);
        let r = self.expr(right);

        let result = match op {
            BinOp::Add => arith(ArithOp::Add, l, r),
            BinOp::Sub => arith(ArithOp::Sub, l, r),
            BinOp::Mul => arith(ArithOp::Mul, l, r),
            BinOp::Div => arith(ArithOp::Div, l, r),
            BinOp::Rem => arith(ArithOp::Rem, l, r),
            BinOp::Less => compare(CmpOp::Lt, l, r),
            BinOp::LessEqual => compare(CmpOp::Le, l, r),
            BinOp::Greater => compare(CmpOp::Gt, l, r),
            BinOp::GreaterEqual => compare(CmpOp::Ge, l, r),
            BinOp::Equal => Ok(Value::Bool(l == r)),
            BinOp::NotEqual => Ok(Value::Bool(l != r)),
            BinOp::Assign | BinOp::And | BinOp::Or => unreachable!(),
        };

        match result {
            Ok(value) => value,
            Err(trace) => self.fail(trace),
        }
    }

    /// Assignment evaluates to the assigned value. Element writes
    /// copy, modify, and store back, like the compiled path; a failed
    /// write therefore leaves `none` in the variable.
    fn assignment(&mut self, target: &Expr, value: &Expr) -> Value {
        match target {
            Expr::Ident(name) => {
                let value = self.expr(value);
                self.assign(name, value.clone());
                value
            },
            Expr::Index { array, index } => {
                let name = match &**array {
                    Expr::Ident(name) => name.clone(),
                    _ => return self.expr(value),
                };

                let current = self.expr(array);
                let index = self.expr(index);
                let value = self.expr(value);

                match element_index(&current, &index) {
                    Ok(i) => {
                        if let Value::Array(mut items) = current {
                            items[i] = value.clone();
                            self.assign(&name, Value::Array(items));
                        }
                        value
                    },
                    Err(trace) => {
                        let none = self.fail(trace);
                        self.assign(&name, none.clone());
                        none
                    },
                }
            },
            _ => self.expr(value),
        }
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) -> Value {
        let name = match callee {
            Expr::Ident(name) => name.clone(),
            Expr::Member { object, member } => match &**object {
                Expr::Ident(_) => member.clone(),
                _ => return Value::None,
            },
            _ => return Value::None,
        };

        let values: Vec<Value> = args.iter().map(|a| self.expr(a)).collect();

        if matches!(name.as_str(), "print" | "len" | "scan" | "read" | "range") {
            return match self.builtins.call(&name, &values, &mut *self.out) {
                Some(Ok(value)) => value,
                Some(Err(trace)) => self.fail(trace),
                None => self.fail(Trace::UnknownBuiltin(name)),
            };
        }

        match self.get(&name) {
            Some(Value::Function(func)) => self.call_function(&func, values),
            Some(_) => self.fail(Trace::NotCallable(name)),
            None => self.fail(Trace::UndefinedFunction(name)),
        }
    }

    /// Calls a user function. Functions capture only the global
    /// scope: the scope stack is cut back to the function's
    /// definition depth for the duration of the call.
    fn call_function(&mut self, func: &FuncValue, args: Vec<Value>) -> Value {
        let level = func.closure_level.min(self.scopes.len());
        let saved = self.scopes.split_off(level);

        self.scopes.push(HashMap::new());
        for (i, param) in func.def.params.iter().enumerate() {
            let value = args.get(i).cloned().unwrap_or(Value::None);
            self.declare(&param.name, value);
        }

        let result = match self.block(&func.def.body) {
            Flow::Return(value) => value,
            _ => Value::None,
        };

        self.scopes.pop();
        self.scopes.extend(saved);

        result
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::common::source::Source;
    use crate::compiler::{analyze::analyze, lex::lex, parse::parse};

    #[derive(Clone, Default)]
    struct Sink(Rc<RefCell<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn walk(source: &str) -> String {
        let program = parse(lex(Source::source(source))).expect("should parse");
        analyze(&program).expect("should analyze");

        let sink = Sink::default();
        let mut interp = Interp::with_output(Box::new(sink.clone()));
        interp.run(&program);

        let bytes = sink.0.borrow().clone();
        String::from_utf8(bytes).expect("output is utf-8")
    }

    #[test]
    fn hello() {
        let out = walk("import io\nfunc main(): int {\n io.print(\"Hello\")\n return 0 \n}\n");
        assert_eq!(out, "Hello");
    }

    #[test]
    fn for_range_sum() {
        let out = walk(
            "import io\nfunc main(): int {\n var s: int = 0\n for i in range(1, 11, 1) {\n s = s + i \n}\n io.print(s)\n return 0 \n}\n",
        );
        assert_eq!(out, "55");
    }

    #[test]
    fn descending_and_empty_ranges() {
        assert_eq!(walk("import io\nfor i in range(5, 0, -1) {\n io.print(i)\n}\n"), "54321");
        assert_eq!(walk("import io\nfor i in range(3, 3, 1) {\n io.print(i)\n}\n"), "");
        assert_eq!(walk("import io\nfor i in range(0, 5, -1) {\n io.print(i)\n}\n"), "");
    }

    #[test]
    fn continue_still_steps() {
        let out = walk(
            "import io\nfor i in range(0, 5) {\n if i == 2 {\n continue \n}\n io.print(i)\n}\n",
        );
        assert_eq!(out, "0134");
    }

    #[test]
    fn functions_and_recursion() {
        let out = walk(
            "import io\nfunc fact(n: int): int {\n if n <= 1 {\n return 1 \n}\n return n * fact(n - 1)\n}\nfunc main(): int {\n io.print(fact(5))\n return 0 \n}\n",
        );
        assert_eq!(out, "120");
    }

    #[test]
    fn calls_capture_only_the_globals() {
        // f runs with the caller's locals out of reach; it sees the
        // global x, not main's shadowing one
        let out = walk(
            "import io\nvar x: int = 1\nfunc f(): int {\n return x \n}\nfunc main(): int {\n var x: int = 99\n io.print(f() + x)\n return 0 \n}\n",
        );
        assert_eq!(out, "100");
    }

    #[test]
    fn array_mutation_sticks() {
        let out = walk(
            "import io\nfunc main(): int {\n var a: int[3] = 0\n a[1] = 42\n io.print(a[1])\n return 0 \n}\n",
        );
        assert_eq!(out, "42");
    }

    #[test]
    fn arrays_do_not_alias() {
        let out = walk(
            "import io\nfunc main(): int {\n var a: int[2] = 0\n var b: int = 0\n var c: int[2] = 0\n c = a\n a[0] = 7\n io.print(a[0])\n io.print(c[0])\n io.print(b)\n return 0 \n}\n",
        );
        assert_eq!(out, "700");
    }

    #[test]
    fn division_by_zero_is_non_fatal() {
        let out = walk("import io\nio.print(1 / 0)\nio.print(\"on we go\")\n");
        assert_eq!(out, "noneon we go");
    }

    #[test]
    fn shadowing_restores_the_outer_binding() {
        let out = walk(
            "import io\nvar x: int = 1\nif true {\n var x: int = 99\n io.print(x)\n}\nio.print(x)\n",
        );
        assert_eq!(out, "991");
    }

    #[test]
    fn format_strings() {
        let out = walk(
            "import io\nfunc main(): int {\n var n: str = \"world\"\n io.print(@\"Hello {n}!\")\n return 0 \n}\n",
        );
        assert_eq!(out, "Hello world!");
    }

    #[test]
    fn while_with_break() {
        let out = walk(
            "import io\nvar i: int = 0\nwhile true {\n i = i + 1\n if i > 3 {\n break \n}\n io.print(i)\n}\n",
        );
        assert_eq!(out, "123");
    }

    #[test]
    fn classic_for() {
        let out = walk("import io\nfor (var i: int = 0; i < 3; i += 1) {\n io.print(i)\n}\n");
        assert_eq!(out, "012");
    }

    #[test]
    fn len_of_strings() {
        assert_eq!(walk("import io\nio.print(len(\"hello\"))\n"), "5");
    }
}
