use std::collections::HashMap;

use crate::common::module::Module;
use crate::common::opcode::Op;
use crate::common::value::{Value, TYPE_BOOL, TYPE_FLOAT, TYPE_INT, TYPE_STR};
use crate::compiler::ast::*;

/// Lowers an analyzed program to bytecode.
///
/// Function bodies are emitted inline behind a jump, with entry
/// addresses recorded as labels. If the program defines `main`, a call
/// to it goes in just before the final `HALT`.
///
/// The VM has call frames but no block scopes, so the generator
/// resolves block scoping here: every declaration below the global
/// level gets a unique storage name, which is what makes shadowing and
/// nested loop synthetics behave.
pub fn gen(program: &Program) -> Module {
    let mut gen = Gen::new();

    for stmt in &program.statements {
        gen.stmt(stmt);
    }

    if gen.module.labels.contains_key("main") {
        let name = gen.module.index_name("main");
        gen.module.emit(Op::Call { argc: 0, name });
        gen.module.emit(Op::Del);
    }
    gen.module.emit(Op::Halt);

    gen.module
}

/// Jump targets for the innermost loop being compiled.
/// `continue_target` is known up front for `while` (the condition);
/// `for` loops leave it `None` and patch `continues` at the step.
struct LoopCtx {
    continue_target: Option<usize>,
    breaks:          Vec<usize>,
    continues:       Vec<usize>,
}

struct Gen {
    module:  Module,
    /// Storage names of module-level bindings.
    globals: HashMap<String, String>,
    /// Source name to storage name, one map per open block scope.
    /// Empty means we're at the module's top level.
    scopes:  Vec<HashMap<String, String>>,
    loops:   Vec<LoopCtx>,
    unique:  usize,
}

enum Slot {
    Local(String),
    Global(String),
}

impl Gen {
    fn new() -> Gen {
        Gen {
            module:  Module::empty(),
            globals: HashMap::new(),
            scopes:  vec![],
            loops:   vec![],
            unique:  0,
        }
    }

    // name plumbing

    fn fresh(&mut self, name: &str) -> String {
        self.unique += 1;
        format!("{}@{}", name, self.unique)
    }

    /// Registers a declaration in the current scope and returns where
    /// it lives: module level gets the plain name in the globals,
    /// anything deeper gets a unique local storage name.
    fn declare(&mut self, name: &str) -> Slot {
        if self.scopes.is_empty() {
            self.globals.insert(name.to_string(), name.to_string());
            return Slot::Global(name.to_string());
        }

        let storage = self.fresh(name);
        self.scopes.last_mut().unwrap().insert(name.to_string(), storage.clone());
        Slot::Local(storage)
    }

    fn resolve(&self, name: &str) -> Slot {
        for scope in self.scopes.iter().rev() {
            if let Some(storage) = scope.get(name) {
                return Slot::Local(storage.clone());
            }
        }
        if let Some(storage) = self.globals.get(name) {
            return Slot::Global(storage.clone());
        }
        // not statically known; leave it to the runtime chain walk
        Slot::Local(name.to_string())
    }

    fn emit_declare(&mut self, name: &str) {
        let op = match self.declare(name) {
            Slot::Global(storage) => {
                let index = self.module.index_name(&storage);
                Op::StoreGlobal(index)
            },
            Slot::Local(storage) => {
                let index = self.module.index_name(&storage);
                Op::Declare(index)
            },
        };
        self.module.emit(op);
    }

    fn emit_load(&mut self, name: &str) {
        let op = match self.resolve(name) {
            Slot::Global(storage) => {
                let index = self.module.index_name(&storage);
                Op::LoadGlobal(index)
            },
            Slot::Local(storage) => {
                let index = self.module.index_name(&storage);
                Op::Load(index)
            },
        };
        self.module.emit(op);
    }

    fn emit_store(&mut self, name: &str) {
        let op = match self.resolve(name) {
            Slot::Global(storage) => {
                let index = self.module.index_name(&storage);
                Op::StoreGlobal(index)
            },
            Slot::Local(storage) => {
                let index = self.module.index_name(&storage);
                Op::Store(index)
            },
        };
        self.module.emit(op);
    }

    fn constant(&mut self, value: Value) {
        let index = self.module.index_constant(value);
        self.module.emit(Op::Con(index));
    }

    fn emit_jump(&mut self, op: Op) -> usize {
        self.module.emit(op)
    }

    fn patch_here(&mut self, at: usize) {
        let target = self.module.position();
        self.module.patch(at, target);
    }

    // statements

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            // imports and module headers are settled statically
            Stmt::Import(_) | Stmt::Module(_) => {},
            Stmt::Function(func) => self.function(func),
            Stmt::Declaration(decl) => self.declaration(decl),
            Stmt::Expression(expr) => {
                self.expr(expr);
                self.module.emit(Op::Del);
            },
            Stmt::If { condition, then, otherwise } => {
                self.expr(condition);
                let to_else = self.emit_jump(Op::JmpFalse(usize::MAX));

                self.stmt(then);

                match otherwise {
                    Some(otherwise) => {
                        let to_end = self.emit_jump(Op::Jmp(usize::MAX));
                        self.patch_here(to_else);
                        self.stmt(otherwise);
                        self.patch_here(to_end);
                    },
                    None => self.patch_here(to_else),
                }
            },
            Stmt::While { condition, body } => {
                let start = self.module.position();
                self.expr(condition);
                let to_end = self.emit_jump(Op::JmpFalse(usize::MAX));

                self.loops.push(LoopCtx {
                    continue_target: Some(start),
                    breaks:          vec![],
                    continues:       vec![],
                });
                self.block(body);
                self.module.emit(Op::Jmp(start));

                let ctx = self.loops.pop().unwrap();
                self.patch_here(to_end);
                for jump in ctx.breaks {
                    self.patch_here(jump);
                }
            },
            Stmt::ForIn { var, iterable, body } => self.for_in(var, iterable, body),
            Stmt::For { init, condition, step, body } => {
                self.scopes.push(HashMap::new());
                if let Some(init) = init {
                    self.stmt(init);
                }

                let start = self.module.position();
                let to_end = condition.as_ref().map(|condition| {
                    self.expr(condition);
                    self.emit_jump(Op::JmpFalse(usize::MAX))
                });

                self.loops.push(LoopCtx {
                    continue_target: None,
                    breaks:          vec![],
                    continues:       vec![],
                });
                self.block(body);

                let ctx = self.loops.pop().unwrap();
                for jump in ctx.continues {
                    self.patch_here(jump);
                }
                if let Some(step) = step {
                    self.expr(step);
                    self.module.emit(Op::Del);
                }
                self.module.emit(Op::Jmp(start));

                if let Some(to_end) = to_end {
                    self.patch_here(to_end);
                }
                for jump in ctx.breaks {
                    self.patch_here(jump);
                }
                self.scopes.pop();
            },
            Stmt::Return(value) => {
                match value {
                    Some(value) => self.expr(value),
                    None        => self.constant(Value::None),
                }
                self.module.emit(Op::Ret);
            },
            Stmt::Break => {
                let jump = self.emit_jump(Op::Jmp(usize::MAX));
                if let Some(ctx) = self.loops.last_mut() {
                    ctx.breaks.push(jump);
                }
            },
            Stmt::Continue => {
                match self.loops.last().and_then(|ctx| ctx.continue_target) {
                    Some(target) => {
                        self.module.emit(Op::Jmp(target));
                    },
                    None => {
                        let jump = self.emit_jump(Op::Jmp(usize::MAX));
                        if let Some(ctx) = self.loops.last_mut() {
                            ctx.continues.push(jump);
                        }
                    },
                }
            },
            Stmt::Block(block) => self.block(block),
        }
    }

    fn block(&mut self, block: &Block) {
        self.scopes.push(HashMap::new());
        for stmt in &block.statements {
            self.stmt(stmt);
        }
        self.scopes.pop();
    }

    fn function(&mut self, func: &Function) {
        // top-level flow hops over the body
        let skip = self.emit_jump(Op::Jmp(usize::MAX));
        self.module.label(&func.name);

        let outer_scopes = std::mem::replace(&mut self.scopes, vec![HashMap::new()]);
        let outer_loops = std::mem::take(&mut self.loops);

        // the calling convention binds arguments as p0, p1, …;
        // copy them over to the declared names
        for (i, param) in func.params.iter().enumerate() {
            let synthetic = self.module.index_name(&format!("p{}", i));
            self.module.emit(Op::Load(synthetic));
            let slot = self.declare(&param.name);
            let storage = match slot {
                Slot::Local(storage) | Slot::Global(storage) => storage,
            };
            let index = self.module.index_name(&storage);
            self.module.emit(Op::Declare(index));
        }

        self.block(&func.body);

        if !matches!(self.module.code.last(), Some(Op::Ret)) {
            self.constant(Value::None);
            self.module.emit(Op::Ret);
        }

        self.scopes = outer_scopes;
        self.loops = outer_loops;
        self.patch_here(skip);
    }

    fn declaration(&mut self, decl: &Declaration) {
        match &decl.ty {
            Some(TypeExpr::Array { element, size }) => {
                self.expr(size);
                let code = match element.as_str() {
                    "float" => TYPE_FLOAT,
                    "bool"  => TYPE_BOOL,
                    "str"   => TYPE_STR,
                    _       => TYPE_INT,
                };
                self.constant(Value::Int(code));
                self.module.emit(Op::AllocArray);
            },
            _ => match &decl.init {
                Some(init) => self.expr(init),
                None       => self.constant(Value::None),
            },
        }

        self.emit_declare(&decl.name);
    }

    /// Lowers `for VAR in range(…)`.
    ///
    /// The range bounds go into synthetic `_end`/`_step` locals and
    /// the loop variable starts at `start`; each iteration tests the
    /// variable against `_end`, runs the body, and steps. The test
    /// direction follows the sign of the step, resolved at compile
    /// time when the step is a literal.
    fn for_in(&mut self, var: &str, iterable: &Expr, body: &Block) {
        self.scopes.push(HashMap::new());

        // build the range value (the builtin validates the arguments),
        // then pull it apart into the loop synthetics
        self.expr(iterable);
        let temp = self.fresh("_range");
        let temp_index = self.module.index_name(&temp);
        self.module.emit(Op::Declare(temp_index));
        for accessor in &["@range_start", "@range_end", "@range_step"] {
            self.module.emit(Op::Load(temp_index));
            let name = self.module.index_name(accessor);
            self.module.emit(Op::Builtin { argc: 1, name });
        }

        // the comparison direction is fixed at compile time when the
        // step is a literal
        let static_step = match iterable {
            Expr::Range(args) if args.len() == 2 => Some(1.0),
            Expr::Range(args) => args.get(2).and_then(literal_number),
            _ => None,
        };

        // the unpack pushed start, end, step; pop step first
        let step = self.declare_popping("_step");
        let end = self.declare_popping("_end");
        let loop_var = self.declare_popping(var);

        let mut to_end = vec![];
        let start = self.module.position();

        match static_step {
            Some(n) if n == 0.0 => {
                to_end.push(self.emit_jump(Op::Jmp(usize::MAX)));
            },
            Some(n) => {
                self.module.emit(Op::Load(loop_var));
                self.module.emit(Op::Load(end));
                self.module.emit(if n > 0.0 { Op::Lt } else { Op::Gt });
                to_end.push(self.emit_jump(Op::JmpFalse(usize::MAX)));
            },
            None => {
                self.module.emit(Op::Load(step));
                self.constant(Value::Int(0));
                self.module.emit(Op::Gt);
                let descending = self.emit_jump(Op::JmpFalse(usize::MAX));

                self.module.emit(Op::Load(loop_var));
                self.module.emit(Op::Load(end));
                self.module.emit(Op::Lt);
                let tested = self.emit_jump(Op::Jmp(usize::MAX));

                self.patch_here(descending);
                self.module.emit(Op::Load(loop_var));
                self.module.emit(Op::Load(end));
                self.module.emit(Op::Gt);

                self.patch_here(tested);
                to_end.push(self.emit_jump(Op::JmpFalse(usize::MAX)));
            },
        }

        self.loops.push(LoopCtx {
            continue_target: None,
            breaks:          vec![],
            continues:       vec![],
        });
        self.block(body);

        let ctx = self.loops.pop().unwrap();
        for jump in ctx.continues {
            self.patch_here(jump);
        }

        self.module.emit(Op::Load(loop_var));
        self.module.emit(Op::Load(step));
        self.module.emit(Op::Add);
        self.module.emit(Op::Store(loop_var));
        self.module.emit(Op::Jmp(start));

        for jump in to_end {
            self.patch_here(jump);
        }
        for jump in ctx.breaks {
            self.patch_here(jump);
        }

        self.scopes.pop();
    }

    /// Declares a name in the current scope and emits the pop into it,
    /// returning the interned storage index for later loads.
    fn declare_popping(&mut self, name: &str) -> usize {
        let slot = self.declare(name);
        match slot {
            Slot::Local(storage) => {
                let index = self.module.index_name(&storage);
                self.module.emit(Op::Declare(index));
                index
            },
            Slot::Global(storage) => {
                let index = self.module.index_name(&storage);
                self.module.emit(Op::StoreGlobal(index));
                index
            },
        }
    }

    // expressions; every one nets a single pushed value

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(n) => self.constant(Value::from_number(*n)),
            Expr::Str(s) => self.constant(Value::Str(s.clone())),
            Expr::Bool(b) => self.constant(Value::Bool(*b)),
            Expr::Ident(name) => self.emit_load(name),
            Expr::Grouped(inner) => self.expr(inner),
            Expr::Unary { op, operand } => {
                self.expr(operand);
                match op {
                    UnOp::Neg => {
                        self.constant(Value::Int(0));
                        self.module.emit(Op::Swap);
                        self.module.emit(Op::Sub);
                    },
                    UnOp::Not => {
                        self.module.emit(Op::Not);
                    },
                    UnOp::Pos => {},
                }
            },
            Expr::Binary { left, op, right } => self.binary(left, *op, right),
            Expr::Index { array, index } => {
                self.expr(array);
                self.expr(index);
                self.module.emit(Op::ArrayGet);
            },
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Member { .. } => {
                // bare module members aren't first-class
                self.constant(Value::None);
            },
            Expr::Format { raw, placeholders } => {
                let con = self.module.index_constant(Value::Str(raw.clone()));
                for (_, placeholder) in placeholders {
                    self.expr(placeholder);
                }
                self.module.emit(Op::Format { con, argc: placeholders.len() });
            },
            Expr::Range(args) => {
                for arg in args {
                    self.expr(arg);
                }
                let mut argc = args.len();
                if argc == 2 {
                    self.constant(Value::Int(1));
                    argc = 3;
                }
                let name = self.module.index_name("range");
                self.module.emit(Op::Builtin { argc, name });
            },
        }
    }

    fn binary(&mut self, left: &Expr, op: BinOp, right: &Expr) {
        match op {
            BinOp::Assign => self.assignment(left, right),
            BinOp::And => {
                self.expr(left);
                let short = self.emit_jump(Op::JmpFalse(usize::MAX));
                self.expr(right);
                let done = self.emit_jump(Op::Jmp(usize::MAX));
                self.patch_here(short);
                self.constant(Value::Bool(false));
                self.patch_here(done);
            },
            BinOp::Or => {
                self.expr(left);
                let short = self.emit_jump(Op::JmpTrue(usize::MAX));
                self.expr(right);
                let done = self.emit_jump(Op::Jmp(usize::MAX));
                self.patch_here(short);
                self.constant(Value::Bool(true));
                self.patch_here(done);
            },
            _ => {
                self.expr(left);
                self.expr(right);
                let op = match op {
                    BinOp::Add => Op::Add,
                    BinOp::Sub => Op::Sub,
                    BinOp::Mul => Op::Mul,
                    BinOp::Div => Op::Div,
                    BinOp::Rem => Op::Rem,
                    BinOp::Less => Op::Lt,
                    BinOp::LessEqual => Op::Le,
                    BinOp::Greater => Op::Gt,
                    BinOp::GreaterEqual => Op::Ge,
                    BinOp::Equal => Op::Eq,
                    BinOp::NotEqual => Op::Ne,
                    BinOp::Assign | BinOp::And | BinOp::Or => unreachable!(),
                };
                self.module.emit(op);
            },
        }
    }

    /// Assignments are expressions; the assigned value stays on the
    /// stack. Element writes re-store the modified array into its
    /// variable, which is what makes the mutation visible under value
    /// semantics.
    fn assignment(&mut self, target: &Expr, value: &Expr) {
        match target {
            Expr::Ident(name) => {
                self.expr(value);
                self.module.emit(Op::Copy);
                self.emit_store(name);
            },
            Expr::Index { array, index } => {
                let array_name = match &**array {
                    Expr::Ident(name) => name.clone(),
                    // rejected by the analyzer; keep the stack honest
                    _ => {
                        self.expr(value);
                        return;
                    },
                };

                self.expr(array);
                self.expr(index);
                self.expr(value);

                // stash the value so it can be the expression result
                let temp = self.fresh("_set");
                let temp_index = self.module.index_name(&temp);
                self.module.emit(Op::Declare(temp_index));
                self.module.emit(Op::Load(temp_index));

                self.module.emit(Op::ArraySet);
                self.emit_store(&array_name);
                self.module.emit(Op::Load(temp_index));
            },
            _ => {
                // rejected by the analyzer
                self.expr(value);
            },
        }
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) {
        let name = match callee {
            Expr::Ident(name) => name.clone(),
            Expr::Member { object, member } => match &**object {
                // labels are bare names; the module prefix is static
                Expr::Ident(_) => member.clone(),
                _ => {
                    self.constant(Value::None);
                    return;
                },
            },
            _ => {
                self.constant(Value::None);
                return;
            },
        };

        for arg in args {
            self.expr(arg);
        }

        if name == "len" && args.len() == 1 {
            self.module.emit(Op::ArrayLen);
            return;
        }

        let argc = args.len();
        let name_index = self.module.index_name(&name);

        match name.as_str() {
            "print" | "len" | "scan" | "read" | "range" => {
                self.module.emit(Op::Builtin { argc, name: name_index });
            },
            _ => {
                self.module.emit(Op::Call { argc, name: name_index });
            },
        }
    }
}

/// The numeric value of a literal (possibly signed or parenthesized)
/// expression, if it is one.
fn literal_number(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Number(n) => Some(*n),
        Expr::Grouped(inner) => literal_number(inner),
        Expr::Unary { op: UnOp::Neg, operand } => literal_number(operand).map(|n| -n),
        Expr::Unary { op: UnOp::Pos, operand } => literal_number(operand),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::source::Source;
    use crate::compiler::lex::lex;
    use crate::compiler::parse::parse;

    fn compile(source: &str) -> Module {
        gen(&parse(lex(Source::source(source))).expect("should parse"))
    }

    #[test]
    fn constants_are_deduplicated() {
        let module = compile("var a: int = 7\nvar b: int = 7\nvar c: int = 8\n");

        let sevens = module
            .constants
            .iter()
            .filter(|c| **c == Value::Int(7))
            .count();
        assert_eq!(sevens, 1);
        assert!(module.constants.contains(&Value::Int(8)));
    }

    #[test]
    fn top_level_declarations_are_globals() {
        let module = compile("var x: int = 1\n");
        assert!(module.code.contains(&Op::StoreGlobal(module
            .names
            .iter()
            .position(|n| n == "x")
            .unwrap())));
    }

    #[test]
    fn expression_statements_clean_the_stack() {
        let module = compile("var x: int = 1\nx + 1\n");
        assert!(module.code.contains(&Op::Del));
    }

    #[test]
    fn while_jumps_line_up() {
        let module = compile("var i: int = 0\nwhile i < 3 {\n i = i + 1 \n}\n");

        let test = module
            .code
            .iter()
            .position(|op| matches!(op, Op::JmpFalse(_)))
            .expect("loop test");
        let back = module
            .code
            .iter()
            .rposition(|op| matches!(op, Op::Jmp(_)))
            .expect("back edge");

        if let Op::JmpFalse(exit) = module.code[test] {
            assert_eq!(exit, back + 1);
        }
        if let Op::Jmp(start) = module.code[back] {
            assert!(start < test);
        }
    }

    #[test]
    fn if_without_else_falls_through() {
        let module = compile("if true {\n var x: int = 1 \n}\n");

        let test = module
            .code
            .iter()
            .position(|op| matches!(op, Op::JmpFalse(_)))
            .expect("branch");
        if let Op::JmpFalse(target) = module.code[test] {
            assert!(target <= module.code.len());
            assert!(target > test);
        }
    }

    #[test]
    fn functions_are_skipped_and_labeled() {
        let module = compile("func f(a: int): int {\n return a \n}\n");

        let entry = module.labels["f"];
        assert!(matches!(module.code[0], Op::Jmp(_)));
        assert_eq!(entry, 1);

        // the prologue binds p0 to the declared parameter name
        let p0 = module.names.iter().position(|n| n == "p0").unwrap();
        assert_eq!(module.code[entry], Op::Load(p0));
        assert!(matches!(module.code[entry + 1], Op::Declare(_)));
    }

    #[test]
    fn main_is_invoked_before_halt() {
        let module = compile("func main(): int {\n return 0 \n}\n");

        let main = module.names.iter().position(|n| n == "main").unwrap();
        let tail = &module.code[module.code.len() - 3..];
        assert_eq!(tail[0], Op::Call { argc: 0, name: main });
        assert_eq!(tail[1], Op::Del);
        assert_eq!(tail[2], Op::Halt);
    }

    #[test]
    fn programs_without_main_just_halt() {
        let module = compile("var x: int = 1\n");
        assert_eq!(module.code.last(), Some(&Op::Halt));
        assert!(!module.code.iter().any(|op| matches!(op, Op::Call { .. })));
    }

    #[test]
    fn array_declarations_allocate() {
        let module = compile("var a: int[3] = 0\n");

        let alloc = module
            .code
            .iter()
            .position(|op| *op == Op::AllocArray)
            .expect("alloc");
        assert!(matches!(module.code[alloc + 1], Op::StoreGlobal(_)));
        assert!(module.constants.contains(&Value::Int(TYPE_INT)));
    }

    #[test]
    fn element_assignment_stores_back() {
        let module = compile("var a: int[3] = 0\na[1] = 42\n");

        let set = module
            .code
            .iter()
            .position(|op| *op == Op::ArraySet)
            .expect("set");
        assert!(matches!(module.code[set + 1], Op::StoreGlobal(_)));
    }

    #[test]
    fn print_lowers_to_a_builtin() {
        let module = compile("import io\nio.print(\"hi\")\n");

        let print = module.names.iter().position(|n| n == "print").unwrap();
        assert!(module.code.contains(&Op::Builtin { argc: 1, name: print }));
    }

    #[test]
    fn single_argument_len_uses_array_len() {
        let module = compile("var a: int[2] = 0\nvar n: int = len(a)\n");
        assert!(module.code.contains(&Op::ArrayLen));
    }

    #[test]
    fn format_strings_carry_their_argument_count() {
        let module = compile("var n: int = 1\nvar s: str = @\"n is {n}\"\n");

        let found = module
            .code
            .iter()
            .any(|op| matches!(op, Op::Format { argc: 1, .. }));
        assert!(found);
    }

    #[test]
    fn logical_operators_short_circuit() {
        let module = compile("var a: bool = true\nvar b: bool = a && a\nvar c: bool = a || a\n");

        assert!(module.code.iter().any(|op| matches!(op, Op::JmpFalse(_))));
        assert!(module.code.iter().any(|op| matches!(op, Op::JmpTrue(_))));
        // neither short-circuit target is left unpatched
        assert!(!module.code.iter().any(|op| matches!(
            op,
            Op::Jmp(t) | Op::JmpTrue(t) | Op::JmpFalse(t) if *t == usize::MAX
        )));
    }

    #[test]
    fn break_and_continue_stay_in_bounds() {
        let module = compile(
            "var i: int = 0\nwhile i < 9 {\n if i > 4 {\n break \n}\n i = i + 1\n continue \n}\n",
        );

        for op in &module.code {
            if let Op::Jmp(t) | Op::JmpTrue(t) | Op::JmpFalse(t) = op {
                assert!(*t <= module.code.len());
            }
        }
    }

    #[test]
    fn nested_for_loops_get_distinct_synthetics() {
        let module = compile(
            "for i in range(0, 2) {\n for j in range(0, 2) {\n var x: int = i + j \n}\n}\n",
        );

        let steps: Vec<&String> =
            module.names.iter().filter(|n| n.starts_with("_step@")).collect();
        assert_eq!(steps.len(), 2);
        assert_ne!(steps[0], steps[1]);
    }
}
