use crate::compiler::ast::*;
use crate::compiler::symbol::{DataType, Scopes, SymbolKind};

/// Checks a parsed program: resolves names through the scope stack,
/// types every expression, and validates control-flow context. All
/// problems are accumulated; if any were found the program must not
/// be executed.
pub fn analyze(program: &Program) -> Result<(), Vec<String>> {
    let mut analyzer = Analyzer::new();
    analyzer.register_builtins();

    for stmt in &program.statements {
        analyzer.stmt(stmt);
    }

    if analyzer.errors.is_empty() {
        Ok(())
    } else {
        Err(analyzer.errors)
    }
}

/// The default module a program's functions belong to until a
/// `module` statement says otherwise.
const DEFAULT_MODULE: &str = "main";

struct Analyzer {
    scopes:         Scopes,
    errors:         Vec<String>,
    /// Name and declared return type of the function being checked.
    function:       Option<(String, DataType)>,
    /// Whether the current function body contains a `return`.
    /// The check is path-insensitive: one `return` anywhere will do.
    has_return:     bool,
    loop_depth:     usize,
    current_module: String,
}

impl Analyzer {
    fn new() -> Analyzer {
        Analyzer {
            scopes:         Scopes::new(),
            errors:         vec![],
            function:       None,
            has_return:     false,
            loop_depth:     0,
            current_module: DEFAULT_MODULE.to_string(),
        }
    }

    /// The two built-in modules and their functions exist before the
    /// first user statement is looked at.
    fn register_builtins(&mut self) {
        let _ = self.scopes.declare_module("__builtins__");
        let _ = self.scopes.declare_module("io");

        let _ = self.scopes.declare_function("range", "__builtins__", DataType::Int, None);
        let _ = self.scopes.declare_function("print", "__builtins__", DataType::None, None);
        let _ = self.scopes.declare_function("len", "__builtins__", DataType::Int, None);

        let _ = self.scopes.declare_function("print", "io", DataType::None, None);
        let _ = self.scopes.declare_function("scan", "io", DataType::Str, Some(vec![]));
        let _ = self.scopes.declare_function("read", "io", DataType::Str, Some(vec![]));
    }

    fn error(&mut self, message: String) {
        self.errors.push(message);
    }

    /// The scalar type a written annotation denotes. Array
    /// annotations denote their element type; the array-ness is
    /// tracked on the symbol.
    fn annotated_type(&mut self, ty: &TypeExpr) -> DataType {
        let name = match ty {
            TypeExpr::Scalar(name) => name,
            TypeExpr::Array { element, .. } => element,
        };

        match DataType::from_name(name) {
            Some(data_type) => data_type,
            None => {
                self.error(format!("Unknown type: {}", name));
                DataType::Unknown
            },
        }
    }

    // statements

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Import(module) => {
                if module != "io" && module != "__builtins__" {
                    self.error(format!("Unknown module: '{}'", module));
                }
            },
            Stmt::Module(module) => {
                if let Err(message) = self.scopes.declare_module(module) {
                    self.error(message);
                }
                self.current_module = module.clone();
            },
            Stmt::Function(func) => self.function(func),
            Stmt::Declaration(decl) => self.declaration(decl),
            Stmt::If { condition, then, otherwise } => {
                self.condition(condition, "If");
                self.stmt(then);
                if let Some(otherwise) = otherwise {
                    self.stmt(otherwise);
                }
            },
            Stmt::While { condition, body } => {
                self.condition(condition, "While");
                self.loop_depth += 1;
                self.block(body);
                self.loop_depth -= 1;
            },
            Stmt::ForIn { var, iterable, body } => {
                self.scopes.enter();
                if let Err(message) =
                    self.scopes.declare_variable(var, DataType::Int, true, false)
                {
                    self.error(message);
                }

                let iterable_type = self.expr(iterable);
                if iterable_type != DataType::Int {
                    self.error("For loop iterable must be a range expression".to_string());
                }

                self.loop_depth += 1;
                self.block(body);
                self.loop_depth -= 1;
                self.scopes.exit();
            },
            Stmt::For { init, condition, step, body } => {
                self.scopes.enter();
                if let Some(init) = init {
                    self.stmt(init);
                }
                if let Some(condition) = condition {
                    self.condition(condition, "For");
                }
                if let Some(step) = step {
                    self.expr(step);
                }

                self.loop_depth += 1;
                self.block(body);
                self.loop_depth -= 1;
                self.scopes.exit();
            },
            Stmt::Return(value) => self.return_stmt(value.as_ref()),
            Stmt::Break => {
                if self.loop_depth == 0 {
                    self.error("Break statement outside loop".to_string());
                }
            },
            Stmt::Continue => {
                if self.loop_depth == 0 {
                    self.error("Continue statement outside loop".to_string());
                }
            },
            Stmt::Expression(expr) => {
                self.expr(expr);
            },
            Stmt::Block(block) => self.block(block),
        }
    }

    fn block(&mut self, block: &Block) {
        self.scopes.enter();
        for stmt in &block.statements {
            self.stmt(stmt);
        }
        self.scopes.exit();
    }

    fn condition(&mut self, condition: &Expr, context: &str) {
        let ty = self.expr(condition);
        if ty != DataType::Bool && !ty.is_numeric() && ty != DataType::Unknown {
            self.error(format!("{} condition must be boolean or numeric", context));
        }
    }

    fn function(&mut self, func: &Function) {
        let return_type = match &func.ret {
            Some(ty) => self.annotated_type(ty),
            None     => DataType::None,
        };

        let param_types: Vec<DataType> = func
            .params
            .iter()
            .map(|p| match &p.ty {
                Some(ty) => self.annotated_type(ty),
                None     => DataType::None,
            })
            .collect();

        // registered up front so the body can recurse
        if let Err(message) = self.scopes.declare_function(
            &func.name,
            &self.current_module.clone(),
            return_type,
            Some(param_types.clone()),
        ) {
            self.error(message);
            return;
        }

        let enclosing = self.function.take();
        let had_return = self.has_return;
        let outer_loops = self.loop_depth;
        self.function = Some((func.name.clone(), return_type));
        self.has_return = false;
        self.loop_depth = 0;

        // the body sees the globals and its own scopes, nothing else
        let hidden = self.scopes.isolate();
        self.scopes.enter();
        for (param, ty) in func.params.iter().zip(param_types) {
            let is_array = matches!(param.ty, Some(TypeExpr::Array { .. }));
            if let Err(message) =
                self.scopes.declare_variable(&param.name, ty, true, is_array)
            {
                self.error(message);
            }
        }
        self.block(&func.body);
        self.scopes.exit();
        self.scopes.restore(hidden);

        if return_type != DataType::None && !self.has_return {
            self.error(format!(
                "Function '{}' must return a value of type {}",
                func.name, return_type,
            ));
        }

        self.function = enclosing;
        self.has_return = had_return;
        self.loop_depth = outer_loops;
    }

    fn declaration(&mut self, decl: &Declaration) {
        let mutable = decl.keyword.is_mutable();

        match &decl.ty {
            Some(TypeExpr::Array { size, .. }) => {
                let element = self.annotated_type(decl.ty.as_ref().unwrap());

                let size_type = self.expr(size);
                if size_type != DataType::Int && size_type != DataType::Unknown {
                    self.error("Array size must be an integer".to_string());
                }

                if let Err(message) =
                    self.scopes.declare_variable(&decl.name, element, mutable, true)
                {
                    self.error(message);
                }

                if let Some(init) = &decl.init {
                    let init_type = self.expr(init);
                    if !DataType::accepts(element, init_type) {
                        self.error(format!(
                            "Type mismatch in array '{}' initialization: expected {}, got {}",
                            decl.name, element, init_type,
                        ));
                    }
                }
            },
            Some(ty) => {
                let declared = self.annotated_type(ty);
                if let Err(message) =
                    self.scopes.declare_variable(&decl.name, declared, mutable, false)
                {
                    self.error(message);
                }

                if let Some(init) = &decl.init {
                    let init_type = self.expr(init);
                    if !DataType::accepts(declared, init_type) {
                        self.error(format!(
                            "Type mismatch in variable '{}' initialization: expected {}, got {}",
                            decl.name, declared, init_type,
                        ));
                    }
                }
            },
            None => {
                // no annotation: the binding takes the initializer's type
                let inferred = match &decl.init {
                    Some(init) => self.expr(init),
                    None       => DataType::Unknown,
                };
                if let Err(message) =
                    self.scopes.declare_variable(&decl.name, inferred, mutable, false)
                {
                    self.error(message);
                }
            },
        }
    }

    fn return_stmt(&mut self, value: Option<&Expr>) {
        self.has_return = true;

        let (name, expected) = match &self.function {
            Some((name, ret)) => (name.clone(), *ret),
            None => {
                self.error("Return statement outside function".to_string());
                if let Some(value) = value {
                    self.expr(value);
                }
                return;
            },
        };

        match value {
            None => {
                if expected != DataType::None {
                    self.error(format!(
                        "Function '{}' expects return type {}, but got none",
                        name, expected,
                    ));
                }
            },
            Some(value) => {
                let actual = self.expr(value);
                if !DataType::accepts(expected, actual) {
                    self.error(format!(
                        "Type mismatch in function '{}' return: expected {}, got {}",
                        name, expected, actual,
                    ));
                }
            },
        }
    }

    // expressions

    fn expr(&mut self, expr: &Expr) -> DataType {
        match expr {
            Expr::Ident(name) => self.ident(name),
            Expr::Number(n) => {
                if n.fract() == 0.0 { DataType::Int } else { DataType::Float }
            },
            Expr::Str(_) => DataType::Str,
            Expr::Bool(_) => DataType::Bool,
            Expr::Format { placeholders, .. } => {
                for (_, placeholder) in placeholders {
                    self.expr(placeholder);
                }
                DataType::Str
            },
            Expr::Binary { left, op, right } => self.binary(left, *op, right),
            Expr::Unary { op, operand } => self.unary(*op, operand),
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Member { object, member } => self.member(object, member),
            Expr::Index { array, index } => {
                let element = self.expr(array);
                let index_type = self.expr(index);
                if index_type != DataType::Int && index_type != DataType::Unknown {
                    self.error("Array index must be an integer".to_string());
                }
                element
            },
            Expr::Grouped(inner) => self.expr(inner),
            Expr::Range(args) => {
                for arg in args {
                    let ty = self.expr(arg);
                    if !ty.is_numeric() && ty != DataType::Unknown {
                        self.error("Range arguments must be numeric".to_string());
                    }
                }
                if args.len() < 2 || args.len() > 3 {
                    self.error("range() expects 2 or 3 arguments".to_string());
                }
                DataType::Int
            },
        }
    }

    /// Identifiers resolve as the current module's function first,
    /// then a builtin function, then a plain variable.
    fn ident(&mut self, name: &str) -> DataType {
        let qualified = format!("{}.{}", self.current_module, name);
        let builtin = format!("__builtins__.{}", name);

        let symbol = self
            .scopes
            .lookup(&qualified)
            .or_else(|| self.scopes.lookup(&builtin))
            .or_else(|| self.scopes.lookup(name));

        match symbol {
            Some(symbol) if symbol.kind == SymbolKind::Function => {
                self.error(format!(
                    "Function '{}' is not a value; call it instead",
                    name,
                ));
                DataType::Unknown
            },
            Some(symbol) => symbol.data_type,
            None => {
                self.error(format!("Undeclared identifier: '{}'", name));
                DataType::Unknown
            },
        }
    }

    fn binary(&mut self, left: &Expr, op: BinOp, right: &Expr) -> DataType {
        if op == BinOp::Assign {
            return self.assignment(left, right);
        }

        let l = self.expr(left);
        let r = self.expr(right);

        match op {
            BinOp::Add if l == DataType::Str || r == DataType::Str => DataType::Str,
            BinOp::Rem => {
                if (l != DataType::Int && l != DataType::Unknown)
                    || (r != DataType::Int && r != DataType::Unknown)
                {
                    self.error("Operator '%' requires integer operands".to_string());
                }
                DataType::Int
            },
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                if (!l.is_numeric() && l != DataType::Unknown)
                    || (!r.is_numeric() && r != DataType::Unknown)
                {
                    self.error(format!(
                        "Operator '{}' requires numeric operands",
                        op.as_str(),
                    ));
                    return DataType::Unknown;
                }
                if l == DataType::Float || r == DataType::Float {
                    DataType::Float
                } else {
                    DataType::Int
                }
            },
            BinOp::Equal | BinOp::NotEqual
            | BinOp::Less | BinOp::LessEqual
            | BinOp::Greater | BinOp::GreaterEqual => {
                if !DataType::accepts(l, r) && !DataType::accepts(r, l) {
                    self.error(format!("Cannot compare {} and {}", l, r));
                }
                DataType::Bool
            },
            BinOp::And | BinOp::Or => {
                if (l != DataType::Bool && l != DataType::Unknown)
                    || (r != DataType::Bool && r != DataType::Unknown)
                {
                    self.error("Logical operators require boolean operands".to_string());
                }
                DataType::Bool
            },
            BinOp::Assign => unreachable!("handled above"),
        }
    }

    fn assignment(&mut self, target: &Expr, value: &Expr) -> DataType {
        let target_type = match target {
            Expr::Ident(name) => {
                self.check_mutable(name);
                self.ident(name)
            },
            Expr::Index { array, index } => {
                // element writes need a named array to store back into
                match &**array {
                    Expr::Ident(name) => self.check_mutable(name),
                    _ => self.error(
                        "Array element assignment requires a plain array variable".to_string(),
                    ),
                }

                let element = self.expr(array);
                let index_type = self.expr(index);
                if index_type != DataType::Int && index_type != DataType::Unknown {
                    self.error("Array index must be an integer".to_string());
                }
                element
            },
            Expr::Member { .. } => {
                self.error("Cannot assign to a module member".to_string());
                DataType::Unknown
            },
            _ => {
                self.error("Left side of assignment must be an lvalue".to_string());
                DataType::Unknown
            },
        };

        let value_type = self.expr(value);
        if !DataType::accepts(target_type, value_type) {
            self.error(format!("Cannot assign {} to {}", value_type, target_type));
        }

        target_type
    }

    fn check_mutable(&mut self, name: &str) {
        if let Some(symbol) = self.scopes.lookup(name) {
            if symbol.kind == SymbolKind::Variable && !symbol.mutable {
                self.error(format!("Cannot assign to immutable binding '{}'", name));
            }
        }
    }

    fn unary(&mut self, op: UnOp, operand: &Expr) -> DataType {
        let ty = self.expr(operand);

        match op {
            UnOp::Neg | UnOp::Pos => {
                if !ty.is_numeric() && ty != DataType::Unknown {
                    let symbol = if op == UnOp::Neg { "-" } else { "+" };
                    self.error(format!(
                        "Unary operator '{}' requires a numeric operand",
                        symbol,
                    ));
                }
                ty
            },
            UnOp::Not => {
                if ty != DataType::Bool && ty != DataType::Unknown {
                    self.error("Logical not '!' requires a boolean operand".to_string());
                }
                DataType::Bool
            },
        }
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) -> DataType {
        let (module, name, qualified) = match callee {
            Expr::Ident(name) => (self.current_module.clone(), name.clone(), false),
            Expr::Member { object, member } => match &**object {
                Expr::Ident(module) => (module.clone(), member.clone(), true),
                _ => {
                    self.error("Call target must be a function name".to_string());
                    for arg in args {
                        self.expr(arg);
                    }
                    return DataType::Unknown;
                },
            },
            _ => {
                self.error("Call target must be a function name".to_string());
                for arg in args {
                    self.expr(arg);
                }
                return DataType::Unknown;
            },
        };

        let arg_types: Vec<DataType> = args.iter().map(|a| self.expr(a)).collect();

        let full = format!("{}.{}", module, name);
        let builtin = format!("__builtins__.{}", name);

        let symbol = match self.scopes.lookup(&full) {
            Some(symbol) => symbol,
            None if !qualified => {
                match self.scopes.lookup(&builtin).or_else(|| self.scopes.lookup(&name)) {
                    Some(symbol) => symbol,
                    None => {
                        self.error(format!("Undeclared function: '{}'", full));
                        return DataType::Unknown;
                    },
                }
            },
            None => {
                self.error(format!("Undeclared function: '{}'", full));
                return DataType::Unknown;
            },
        };

        let result = symbol.data_type;
        let expected = symbol.params.clone();

        if let Some(expected) = expected {
            if expected.len() != arg_types.len() {
                self.error(format!(
                    "Function '{}' expects {} argument(s), got {}",
                    name,
                    expected.len(),
                    arg_types.len(),
                ));
            } else {
                for (i, (want, got)) in expected.iter().zip(&arg_types).enumerate() {
                    if !DataType::accepts(*want, *got) {
                        self.error(format!(
                            "Argument {} of '{}' expects {}, got {}",
                            i + 1,
                            name,
                            want,
                            got,
                        ));
                    }
                }
            }
        }

        result
    }

    fn member(&mut self, object: &Expr, member: &str) -> DataType {
        match object {
            Expr::Ident(module) => {
                let full = format!("{}.{}", module, member);
                match self.scopes.lookup(&full) {
                    Some(symbol) => symbol.data_type,
                    None => {
                        self.error(format!(
                            "Module '{}' has no member '{}'",
                            module, member,
                        ));
                        DataType::Unknown
                    },
                }
            },
            _ => {
                self.expr(object);
                self.error("Member access left side must be an identifier".to_string());
                DataType::Unknown
            },
        }
    }
}
