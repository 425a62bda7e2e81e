use std::rc::Rc;

use crate::common::span::Spanned;
use crate::compiler::ast::*;
use crate::compiler::syntax::Syntax;
use crate::compiler::token::{unescape, Keyword, Punct, Token};

/// Parses a token stream into a `Program` by recursive descent.
///
/// Errors don't stop the parser: each one is recorded, the offending
/// token is skipped, and parsing continues so a single run reports as
/// much as possible. If anything was recorded the whole parse fails.
pub fn parse(tokens: Vec<Spanned<Token>>) -> Result<Program, Vec<Syntax>> {
    let mut parser = Parser::new(tokens);
    let program = parser.program();

    if parser.errors.is_empty() {
        Ok(program)
    } else {
        Err(parser.errors)
    }
}

struct Parser {
    tokens:   Vec<Spanned<Token>>,
    position: usize,
    errors:   Vec<Syntax>,
}

impl Parser {
    fn new(tokens: Vec<Spanned<Token>>) -> Parser {
        Parser { tokens, position: 0, errors: vec![] }
    }

    // cursor plumbing

    fn current(&self) -> &Spanned<Token> {
        let last = self.tokens.len() - 1;
        &self.tokens[self.position.min(last)]
    }

    fn token(&self) -> &Token {
        &self.current().item
    }

    fn peek_next(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + 1).min(last)].item
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.token(), Token::Eof)
    }

    fn check_punct(&self, punct: Punct) -> bool {
        matches!(self.token(), Token::Punct(p) if *p == punct)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.token(), Token::Keyword(k) if *k == keyword)
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        if self.check_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_punct(&mut self, punct: Punct, message: &str) {
        if !self.eat_punct(punct) {
            self.error(message);
        }
    }

    fn eat_newlines(&mut self) {
        while matches!(self.token(), Token::Eol) {
            self.advance();
        }
    }

    fn error(&mut self, message: &str) {
        let span = self.current().span.clone();
        self.errors.push(Syntax::error(message, &span));
    }

    // statements

    fn program(&mut self) -> Program {
        let mut statements = vec![];

        loop {
            self.eat_newlines();
            if self.at_end() { break; }

            match self.statement() {
                Some(stmt) => statements.push(stmt),
                // couldn't parse here; skip the token so we don't spin
                None => self.advance(),
            }
        }

        Program { statements }
    }

    fn statement(&mut self) -> Option<Stmt> {
        if let Token::Keyword(keyword) = self.token() {
            match keyword {
                Keyword::Import => return self.import(),
                Keyword::Module => return self.module_decl(),
                Keyword::Func   => return self.function(),
                Keyword::Var | Keyword::Val | Keyword::Let | Keyword::Const => {
                    return self.declaration(true);
                },
                Keyword::If     => return self.if_statement(),
                Keyword::While  => return self.while_statement(),
                Keyword::For    => return self.for_statement(),
                Keyword::Return => return self.return_statement(),
                Keyword::Break => {
                    self.advance();
                    self.eat_newlines();
                    return Some(Stmt::Break);
                },
                Keyword::Continue => {
                    self.advance();
                    self.eat_newlines();
                    return Some(Stmt::Continue);
                },
                _ => {},
            }
        }

        match self.token() {
            Token::Ident(_)
            | Token::Number(_)
            | Token::Str(_)
            | Token::FormatStr(_) => {
                let expr = self.expression()?;
                self.eat_newlines();
                Some(Stmt::Expression(expr))
            },
            // a closer belongs to the enclosing construct
            Token::Punct(Punct::CloseBrace) | Token::Punct(Punct::CloseParen) => None,
            other => {
                let message = format!("Unexpected token: {}", other);
                self.error(&message);
                None
            },
        }
    }

    fn ident(&mut self, message: &str) -> Option<String> {
        if let Token::Ident(name) = self.token() {
            let name = name.clone();
            self.advance();
            Some(name)
        } else {
            self.error(message);
            None
        }
    }

    fn import(&mut self) -> Option<Stmt> {
        self.advance();
        let module = self.ident("Expected a module name after 'import'")?;
        self.eat_newlines();
        Some(Stmt::Import(module))
    }

    fn module_decl(&mut self) -> Option<Stmt> {
        self.advance();
        let module = self.ident("Expected a module name after 'module'")?;
        self.eat_newlines();
        Some(Stmt::Module(module))
    }

    fn function(&mut self) -> Option<Stmt> {
        self.advance();
        let name = self.ident("Expected a function name after 'func'")?;

        self.consume_punct(Punct::OpenParen, "Expected '(' after the function name");
        let params = self.parameters();
        self.consume_punct(Punct::CloseParen, "Expected ')' after the parameters");

        let ret = if self.eat_punct(Punct::Colon) {
            self.type_expr()
        } else {
            None
        };

        self.consume_punct(Punct::OpenBrace, "Expected '{' to open the function body");
        self.eat_newlines();
        let body = self.block();
        self.consume_punct(Punct::CloseBrace, "Expected '}' to close the function body");
        self.eat_newlines();

        Some(Stmt::Function(Rc::new(Function { name, params, ret, body })))
    }

    fn parameters(&mut self) -> Vec<Param> {
        let mut params = vec![];

        if self.check_punct(Punct::CloseParen) {
            return params;
        }

        loop {
            if let Some(name) = self.ident("Expected a parameter name") {
                let ty = if self.eat_punct(Punct::Colon) {
                    self.type_expr()
                } else {
                    None
                };
                params.push(Param { name, ty });
            }

            if !self.eat_punct(Punct::Comma) { break; }
            if self.check_punct(Punct::CloseParen) || self.at_end() { break; }
        }

        params
    }

    /// A type annotation: a name, optionally followed by `[size]`.
    fn type_expr(&mut self) -> Option<TypeExpr> {
        let name = match self.token() {
            Token::Keyword(k) => k.as_str().to_string(),
            Token::Ident(name) => name.clone(),
            _ => {
                self.error("Expected a type name");
                return None;
            },
        };
        self.advance();

        if self.eat_punct(Punct::OpenBracket) {
            let size = self.expression()?;
            self.consume_punct(Punct::CloseBracket, "Expected ']' after the array size");
            return Some(TypeExpr::Array { element: name, size });
        }

        Some(TypeExpr::Scalar(name))
    }

    fn declaration(&mut self, terminated: bool) -> Option<Stmt> {
        let keyword = match self.token() {
            Token::Keyword(Keyword::Var)   => DeclKind::Var,
            Token::Keyword(Keyword::Val)   => DeclKind::Val,
            Token::Keyword(Keyword::Let)   => DeclKind::Let,
            Token::Keyword(Keyword::Const) => DeclKind::Const,
            _ => unreachable!("declaration() called off a declaration keyword"),
        };
        self.advance();

        let name = self.ident("Expected an identifier in the declaration")?;

        let ty = if self.eat_punct(Punct::Colon) {
            self.type_expr()
        } else {
            None
        };

        let init = if self.eat_punct(Punct::Assign) {
            self.expression()
        } else {
            None
        };

        if ty.is_none() && init.is_none() {
            let message = format!("Declaration of '{}' is missing type and initializer", name);
            self.error(&message);
        }

        if terminated {
            self.eat_newlines();
        }

        Some(Stmt::Declaration(Declaration { keyword, name, ty, init }))
    }

    fn block(&mut self) -> Block {
        let mut statements = vec![];

        loop {
            self.eat_newlines();
            if self.check_punct(Punct::CloseBrace) || self.at_end() {
                break;
            }

            match self.statement() {
                Some(stmt) => statements.push(stmt),
                None => {
                    if self.check_punct(Punct::CloseBrace) || self.at_end() {
                        break;
                    }
                    self.advance();
                },
            }

            self.eat_newlines();
        }

        Block { statements }
    }

    fn braced_block(&mut self, context: &str) -> Block {
        let open = format!("Expected '{{' to open the {} body", context);
        let close = format!("Expected '}}' to close the {} body", context);

        self.consume_punct(Punct::OpenBrace, &open);
        self.eat_newlines();
        let body = self.block();
        self.consume_punct(Punct::CloseBrace, &close);

        body
    }

    fn if_statement(&mut self) -> Option<Stmt> {
        self.advance();
        let condition = self.expression()?;
        let then = Stmt::Block(self.braced_block("if"));

        // an `else` may sit on the next line; look ahead past the
        // newlines, but give them back if it isn't there
        let saved = self.position;
        self.eat_newlines();

        let otherwise = if self.check_keyword(Keyword::Else) {
            self.advance();
            if self.check_keyword(Keyword::If) {
                self.if_statement().map(Box::new)
            } else {
                Some(Box::new(Stmt::Block(self.braced_block("else"))))
            }
        } else {
            self.position = saved;
            None
        };

        self.eat_newlines();
        Some(Stmt::If { condition, then: Box::new(then), otherwise })
    }

    fn while_statement(&mut self) -> Option<Stmt> {
        self.advance();
        let condition = self.expression()?;
        let body = self.braced_block("while");
        self.eat_newlines();

        Some(Stmt::While { condition, body })
    }

    /// Distinguishes `for x in …` from the classic three-clause form
    /// by peeking past the loop variable.
    fn for_statement(&mut self) -> Option<Stmt> {
        let is_for_in = matches!(self.peek_next(), Token::Ident(_))
            && matches!(
                self.tokens.get(self.position + 2).map(|t| &t.item),
                Some(Token::Keyword(Keyword::In))
            );

        if is_for_in {
            self.for_in_statement()
        } else {
            self.classic_for_statement()
        }
    }

    fn for_in_statement(&mut self) -> Option<Stmt> {
        self.advance();
        let var = self.ident("Expected a loop variable after 'for'")?;

        if !self.check_keyword(Keyword::In) {
            self.error("Expected 'in' in the for loop");
            return None;
        }
        self.advance();

        let iterable = match self.token() {
            Token::Ident(name) if name == "range" => self.range_expr()?,
            Token::Ident(name) => {
                let iterable = Expr::Ident(name.clone());
                self.advance();
                iterable
            },
            _ => {
                self.error("Expected 'range(…)' or an identifier to iterate");
                return None;
            },
        };

        let body = self.braced_block("loop");
        self.eat_newlines();

        Some(Stmt::ForIn { var, iterable, body })
    }

    fn classic_for_statement(&mut self) -> Option<Stmt> {
        self.advance();
        self.consume_punct(Punct::OpenParen, "Expected '(' after 'for'");

        let init = if self.check_punct(Punct::Semicolon) {
            None
        } else if matches!(
            self.token(),
            Token::Keyword(Keyword::Var)
                | Token::Keyword(Keyword::Val)
                | Token::Keyword(Keyword::Let)
                | Token::Keyword(Keyword::Const)
        ) {
            self.declaration(false).map(Box::new)
        } else {
            self.expression().map(|e| Box::new(Stmt::Expression(e)))
        };
        self.consume_punct(Punct::Semicolon, "Expected ';' after the loop initializer");

        let condition = if self.check_punct(Punct::Semicolon) {
            None
        } else {
            self.expression()
        };
        self.consume_punct(Punct::Semicolon, "Expected ';' after the loop condition");

        let step = if self.check_punct(Punct::CloseParen) {
            None
        } else {
            self.expression()
        };
        self.consume_punct(Punct::CloseParen, "Expected ')' after the loop step");

        let body = self.braced_block("loop");
        self.eat_newlines();

        Some(Stmt::For { init, condition, step, body })
    }

    fn return_statement(&mut self) -> Option<Stmt> {
        self.advance();

        let value = if matches!(self.token(), Token::Eol | Token::Eof)
            || self.check_punct(Punct::CloseBrace)
        {
            None
        } else {
            self.expression()
        };

        self.eat_newlines();
        Some(Stmt::Return(value))
    }

    // expressions, lowest to highest precedence

    fn expression(&mut self) -> Option<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Option<Expr> {
        let expr = self.logical_or()?;

        let compound = match self.token() {
            Token::Punct(Punct::Assign)      => None,
            Token::Punct(Punct::PlusAssign)  => Some(BinOp::Add),
            Token::Punct(Punct::MinusAssign) => Some(BinOp::Sub),
            Token::Punct(Punct::StarAssign)  => Some(BinOp::Mul),
            Token::Punct(Punct::SlashAssign) => Some(BinOp::Div),
            _ => return Some(expr),
        };

        if !expr.is_lvalue() {
            self.error("Left side of assignment must be an lvalue");
        }
        self.advance();
        let value = self.assignment()?;

        // `x op= e` is just `x = x op e`
        let value = match compound {
            Some(op) => Expr::binary(expr.clone(), op, value),
            None     => value,
        };

        Some(Expr::binary(expr, BinOp::Assign, value))
    }

    fn logical_or(&mut self) -> Option<Expr> {
        let mut expr = self.logical_and()?;

        while self.eat_punct(Punct::OrOr) {
            let right = self.logical_and()?;
            expr = Expr::binary(expr, BinOp::Or, right);
        }

        Some(expr)
    }

    fn logical_and(&mut self) -> Option<Expr> {
        let mut expr = self.equality()?;

        while self.eat_punct(Punct::AndAnd) {
            let right = self.equality()?;
            expr = Expr::binary(expr, BinOp::And, right);
        }

        Some(expr)
    }

    fn equality(&mut self) -> Option<Expr> {
        let mut expr = self.comparison()?;

        loop {
            let op = match self.token() {
                Token::Punct(Punct::Equal)    => BinOp::Equal,
                Token::Punct(Punct::NotEqual) => BinOp::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.comparison()?;
            expr = Expr::binary(expr, op, right);
        }

        Some(expr)
    }

    fn comparison(&mut self) -> Option<Expr> {
        let mut expr = self.additive()?;

        loop {
            let op = match self.token() {
                Token::Punct(Punct::Less)         => BinOp::Less,
                Token::Punct(Punct::LessEqual)    => BinOp::LessEqual,
                Token::Punct(Punct::Greater)      => BinOp::Greater,
                Token::Punct(Punct::GreaterEqual) => BinOp::GreaterEqual,
                _ => break,
            };
            self.advance();
            let right = self.additive()?;
            expr = Expr::binary(expr, op, right);
        }

        Some(expr)
    }

    fn additive(&mut self) -> Option<Expr> {
        let mut expr = self.multiplicative()?;

        loop {
            let op = match self.token() {
                Token::Punct(Punct::Plus)  => BinOp::Add,
                Token::Punct(Punct::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            expr = Expr::binary(expr, op, right);
        }

        Some(expr)
    }

    fn multiplicative(&mut self) -> Option<Expr> {
        let mut expr = self.unary()?;

        loop {
            let op = match self.token() {
                Token::Punct(Punct::Star)    => BinOp::Mul,
                Token::Punct(Punct::Slash)   => BinOp::Div,
                Token::Punct(Punct::Percent) => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            expr = Expr::binary(expr, op, right);
        }

        Some(expr)
    }

    fn unary(&mut self) -> Option<Expr> {
        let op = match self.token() {
            Token::Punct(Punct::Bang)  => UnOp::Not,
            Token::Punct(Punct::Minus) => UnOp::Neg,
            Token::Punct(Punct::Plus)  => UnOp::Pos,
            _ => return self.postfix(),
        };

        self.advance();
        let operand = self.unary()?;
        Some(Expr::unary(op, operand))
    }

    fn postfix(&mut self) -> Option<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.eat_punct(Punct::Dot) {
                let member = self.ident("Expected an identifier after '.'")?;
                expr = Expr::member(expr, &member);
            } else if self.check_punct(Punct::OpenParen) {
                let args = self.arguments();
                expr = Expr::call(expr, args);
            } else if self.eat_punct(Punct::OpenBracket) {
                let index = self.expression()?;
                self.consume_punct(Punct::CloseBracket, "Expected ']' after the index");
                expr = Expr::index(expr, index);
            } else {
                break;
            }
        }

        Some(expr)
    }

    fn arguments(&mut self) -> Vec<Expr> {
        self.consume_punct(Punct::OpenParen, "Expected '(' in the call");
        let mut args = vec![];

        if !self.check_punct(Punct::CloseParen) {
            loop {
                if let Some(arg) = self.expression() {
                    args.push(arg);
                }
                if !self.eat_punct(Punct::Comma) { break; }
                if self.check_punct(Punct::CloseParen) || self.at_end() { break; }
            }
        }

        self.consume_punct(Punct::CloseParen, "Expected ')' after the arguments");
        args
    }

    fn primary(&mut self) -> Option<Expr> {
        match self.token().clone() {
            Token::Ident(name) if name == "range"
                && matches!(self.peek_next(), Token::Punct(Punct::OpenParen)) =>
            {
                self.range_expr()
            },
            Token::Ident(name) => {
                self.advance();
                Some(Expr::Ident(name))
            },
            Token::Number(value) => {
                self.advance();
                Some(Expr::Number(value))
            },
            Token::Str(raw) => {
                self.advance();
                Some(Expr::Str(unescape(&raw)))
            },
            Token::FormatStr(raw) => {
                self.advance();
                Some(self.format_string(&raw))
            },
            Token::Keyword(Keyword::True) => {
                self.advance();
                Some(Expr::Bool(true))
            },
            Token::Keyword(Keyword::False) => {
                self.advance();
                Some(Expr::Bool(false))
            },
            Token::Punct(Punct::OpenParen) => {
                self.advance();
                let inner = self.expression()?;
                self.consume_punct(Punct::CloseParen, "Expected ')' after the expression");
                Some(Expr::grouped(inner))
            },
            other => {
                let message = format!("Unexpected token in expression: {}", other);
                self.error(&message);
                None
            },
        }
    }

    fn range_expr(&mut self) -> Option<Expr> {
        // sitting on the `range` identifier
        self.advance();
        let args = self.arguments();
        Some(Expr::Range(args))
    }

    /// Builds a `Format` expression from a format string's raw
    /// contents. Escapes are decoded first, so the stored offsets
    /// point at `{`s in the text as it will be displayed.
    fn format_string(&mut self, raw: &str) -> Expr {
        let raw = unescape(raw);
        let mut placeholders = vec![];
        let mut search = 0;

        while let Some(found) = raw[search..].find('{') {
            let open = search + found;
            let close = match raw[open..].find('}') {
                Some(c) => open + c,
                None    => break,
            };

            let inside = &raw[open + 1..close];
            match placeholder_expr(inside) {
                Some(expr) => placeholders.push((open, expr)),
                None => {
                    let message =
                        format!("Invalid placeholder '{{{}}}' in format string", inside);
                    self.error(&message);
                },
            }

            search = close + 1;
        }

        Expr::Format { raw, placeholders }
    }
}

/// Parses the restricted expression grammar allowed inside a format
/// placeholder: a literal, a bare identifier, a member chain, or an
/// indexed chain. Anything fancier is rejected.
fn placeholder_expr(text: &str) -> Option<Expr> {
    let mut cursor = Cursor { text: text.trim(), position: 0 };
    let expr = cursor.expr()?;

    if cursor.position == cursor.text.len() {
        Some(expr)
    } else {
        None
    }
}

struct Cursor<'a> {
    text:     &'a str,
    position: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.position..]
    }

    fn expr(&mut self) -> Option<Expr> {
        let mut expr = self.primary()?;

        loop {
            let rest = self.rest();
            if rest.starts_with('.') {
                self.position += 1;
                let name = self.word()?;
                expr = Expr::member(expr, &name);
            } else if rest.starts_with('[') {
                self.position += 1;
                let index = self.primary()?;
                if !self.rest().starts_with(']') { return None; }
                self.position += 1;
                expr = Expr::index(expr, index);
            } else {
                break;
            }
        }

        Some(expr)
    }

    fn primary(&mut self) -> Option<Expr> {
        let rest = self.rest();
        let first = rest.chars().next()?;

        if first == '"' {
            let close = rest[1..].find('"')? + 1;
            let contents = rest[1..close].to_string();
            self.position += close + 1;
            return Some(Expr::Str(contents));
        }

        if first.is_ascii_digit() {
            let len = rest
                .find(|c: char| !c.is_ascii_digit() && c != '.')
                .unwrap_or(rest.len());
            let number = rest[..len].parse::<f64>().ok()?;
            self.position += len;
            return Some(Expr::Number(number));
        }

        if first.is_ascii_alphabetic() || first == '_' {
            let word = self.word()?;
            return Some(match word.as_str() {
                "true"  => Expr::Bool(true),
                "false" => Expr::Bool(false),
                _       => Expr::Ident(word),
            });
        }

        None
    }

    fn word(&mut self) -> Option<String> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .unwrap_or(rest.len());

        if len == 0 { return None; }
        self.position += len;
        Some(rest[..len].to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::source::Source;
    use crate::compiler::lex::lex;

    fn parsed(source: &str) -> Program {
        parse(lex(Source::source(source))).expect("program should parse")
    }

    fn failed(source: &str) -> Vec<Syntax> {
        parse(lex(Source::source(source))).expect_err("program should not parse")
    }

    #[test]
    fn declaration_with_type_and_initializer() {
        let program = parsed("var s: int = 0\n");

        assert_eq!(program.statements, vec![Stmt::Declaration(Declaration {
            keyword: DeclKind::Var,
            name:    "s".to_string(),
            ty:      Some(TypeExpr::Scalar("int".to_string())),
            init:    Some(Expr::Number(0.0)),
        })]);
    }

    #[test]
    fn declaration_needs_type_or_initializer() {
        let errors = failed("var s\n");
        assert!(errors[0].message.contains("missing type and initializer"));
    }

    #[test]
    fn array_declaration() {
        let program = parsed("var a: int[3] = 0\n");

        if let Stmt::Declaration(decl) = &program.statements[0] {
            assert_eq!(decl.ty, Some(TypeExpr::Array {
                element: "int".to_string(),
                size:    Expr::Number(3.0),
            }));
        } else {
            panic!("expected a declaration");
        }
    }

    #[test]
    fn functions() {
        let program = parsed("func add(a: int, b: int): int {\n return a + b \n}\n");

        if let Stmt::Function(func) = &program.statements[0] {
            assert_eq!(func.name, "add");
            assert_eq!(func.params.len(), 2);
            assert_eq!(func.ret, Some(TypeExpr::Scalar("int".to_string())));
            assert_eq!(func.body.statements.len(), 1);
        } else {
            panic!("expected a function");
        }
    }

    #[test]
    fn precedence() {
        let program = parsed("x = 1 + 2 * 3\n");

        let expected = Expr::binary(
            Expr::Ident("x".to_string()),
            BinOp::Assign,
            Expr::binary(
                Expr::Number(1.0),
                BinOp::Add,
                Expr::binary(Expr::Number(2.0), BinOp::Mul, Expr::Number(3.0)),
            ),
        );
        assert_eq!(program.statements, vec![Stmt::Expression(expected)]);
    }

    #[test]
    fn assignment_is_right_associative() {
        let program = parsed("a = b = 1\n");

        let expected = Expr::binary(
            Expr::Ident("a".to_string()),
            BinOp::Assign,
            Expr::binary(
                Expr::Ident("b".to_string()),
                BinOp::Assign,
                Expr::Number(1.0),
            ),
        );
        assert_eq!(program.statements, vec![Stmt::Expression(expected)]);
    }

    #[test]
    fn compound_assignment_desugars() {
        let program = parsed("x += 2\n");

        let expected = Expr::binary(
            Expr::Ident("x".to_string()),
            BinOp::Assign,
            Expr::binary(Expr::Ident("x".to_string()), BinOp::Add, Expr::Number(2.0)),
        );
        assert_eq!(program.statements, vec![Stmt::Expression(expected)]);
    }

    #[test]
    fn assignment_to_non_lvalue_is_reported() {
        let errors = failed("1 = 2\n");
        assert!(errors[0].message.contains("must be an lvalue"));
    }

    #[test]
    fn for_in_and_classic_for() {
        let program = parsed(
            "for i in range(0, 3) {\n}\nfor (var i: int = 0; i < 3; i += 1) {\n}\n",
        );

        assert!(matches!(&program.statements[0], Stmt::ForIn { var, .. } if var == "i"));
        assert!(matches!(&program.statements[1], Stmt::For { init: Some(_), .. }));
    }

    #[test]
    fn if_else_chains() {
        let program = parsed("if a {\n} else if b {\n} else {\n}\n");

        if let Stmt::If { otherwise: Some(chain), .. } = &program.statements[0] {
            assert!(matches!(**chain, Stmt::If { otherwise: Some(_), .. }));
        } else {
            panic!("expected an if with an else");
        }
    }

    #[test]
    fn postfix_chains() {
        let program = parsed("io.print(a[1])\n");

        let expected = Expr::call(
            Expr::member(Expr::Ident("io".to_string()), "print"),
            vec![Expr::index(Expr::Ident("a".to_string()), Expr::Number(1.0))],
        );
        assert_eq!(program.statements, vec![Stmt::Expression(expected)]);
    }

    #[test]
    fn format_string_placeholders() {
        let program = parsed("x = @\"hi {name}, {a.b} and {v[0]}!\"\n");

        if let Stmt::Expression(Expr::Binary { right, .. }) = &program.statements[0] {
            if let Expr::Format { raw, placeholders } = &**right {
                assert_eq!(raw, "hi {name}, {a.b} and {v[0]}!");
                assert_eq!(placeholders.len(), 3);
                assert_eq!(placeholders[0], (3, Expr::Ident("name".to_string())));
                assert_eq!(
                    placeholders[1].1,
                    Expr::member(Expr::Ident("a".to_string()), "b"),
                );
                assert_eq!(
                    placeholders[2].1,
                    Expr::index(Expr::Ident("v".to_string()), Expr::Number(0.0)),
                );
                return;
            }
        }
        panic!("expected a format string assignment");
    }

    #[test]
    fn bad_placeholder_is_reported() {
        let errors = failed("x = @\"hi {a + b}\"\n");
        assert!(errors[0].message.contains("Invalid placeholder"));
    }

    #[test]
    fn recovery_collects_several_errors() {
        let errors = failed("var\nvar y\n");
        assert!(errors.len() >= 2);
    }
}
