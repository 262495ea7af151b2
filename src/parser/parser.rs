//! Parser implementation
//!
//! Statements are parsed by recursive descent; expressions by precedence
//! climbing over the binding strengths in [`BinaryOp::precedence`].

use tracing::debug;

use crate::error::{CinderError, CinderResult, SourceLocation};
use crate::lexer::{Keyword, Lexer, Literal as TokenLiteral, Token, TokenType};
use super::ast::*;

/// Parser for Cinder source code
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// Number of enclosing function bodies; `return` is only legal above zero
    function_depth: usize,
}

impl Parser {
    /// Create a new parser from tokens
    ///
    /// A trailing `Eof` is appended if the stream does not already end with one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(token) if token.token_type == TokenType::Eof) {
            let location = tokens
                .last()
                .map(|token| token.location.clone())
                .unwrap_or_else(|| SourceLocation::at(1, 1));
            tokens.push(Token::new(TokenType::Eof, String::new(), location));
        }

        Self {
            tokens,
            current: 0,
            function_depth: 0,
        }
    }

    /// Lex `source` and create a parser over the resulting tokens
    pub fn from_source(source: &str, filename: Option<&str>) -> CinderResult<Self> {
        let tokens = Lexer::new(source, filename).tokenize()?;
        Ok(Self::new(tokens))
    }

    /// Parse the whole token stream into an AST
    ///
    /// Stops at the first malformed construct; no partial AST is returned.
    pub fn parse(&mut self) -> CinderResult<Ast> {
        let mut nodes = Vec::new();

        self.skip_separators();
        while !self.is_at_end() {
            nodes.push(self.statement()?);
            self.end_of_statement()?;
            self.skip_separators();
        }

        debug!(nodes = nodes.len(), "parsed source unit");
        Ok(Ast { nodes })
    }

    // ===== Statements =====

    fn statement(&mut self) -> CinderResult<Expr> {
        match self.peek().token_type {
            TokenType::Keyword(Keyword::Var) => self.var_declaration(),
            TokenType::Keyword(Keyword::Func) => self.function_declaration(),
            TokenType::Keyword(Keyword::If) => self.if_statement(),
            TokenType::Keyword(Keyword::Return) => self.return_statement(),
            TokenType::LeftBrace => {
                let location = self.advance().location.clone();
                Ok(Expr::Block(self.block_body(location)?))
            }
            TokenType::Identifier if self.peek_next_is(&TokenType::Assign) => self.assignment(),
            _ => self.expression(),
        }
    }

    fn var_declaration(&mut self) -> CinderResult<Expr> {
        let location = self.advance().location.clone();
        let name = self.consume_identifier("variable name after 'var'")?;
        self.consume(TokenType::Assign, "'=' after variable name")?;
        let initializer = Box::new(self.expression()?);

        Ok(Expr::VarDecl {
            name,
            initializer,
            location,
        })
    }

    fn assignment(&mut self) -> CinderResult<Expr> {
        let location = self.peek().location.clone();
        let name = self.consume_identifier("assignment target")?;
        self.consume(TokenType::Assign, "'='")?;
        let value = Box::new(self.expression()?);

        Ok(Expr::Assignment {
            name,
            value,
            location,
        })
    }

    fn function_declaration(&mut self) -> CinderResult<Expr> {
        let location = self.advance().location.clone();
        let name = self.consume_identifier("function name after 'func'")?;

        self.consume(TokenType::LeftParen, "'(' after function name")?;

        let mut params: Vec<String> = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                let param = self.consume_identifier("parameter name")?;
                if params.contains(&param) {
                    return Err(CinderError::syntax_error(
                        format!("duplicate parameter '{}' in function '{}'", param, name),
                        self.previous().location.clone(),
                    ));
                }
                params.push(param);

                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "')' after parameters")?;
        let brace = self
            .consume(TokenType::LeftBrace, "'{' before function body")?
            .location
            .clone();

        self.function_depth += 1;
        let body = self.block_body(brace);
        self.function_depth -= 1;
        let mut body = body?;

        let ret = match body.statements.last() {
            Some(Expr::Return { .. }) => match body.statements.pop() {
                Some(Expr::Return { value, .. }) => Some(value),
                _ => None,
            },
            _ => None,
        };

        Ok(Expr::FunctionDecl {
            name,
            params,
            body,
            ret,
            location,
        })
    }

    fn if_statement(&mut self) -> CinderResult<Expr> {
        let location = self.advance().location.clone();

        self.consume(TokenType::LeftParen, "'(' after 'if'")?;
        let condition = Box::new(self.expression()?);
        self.consume(TokenType::RightParen, "')' after if condition")?;

        let brace = self
            .consume(TokenType::LeftBrace, "'{' after if condition")?
            .location
            .clone();
        let then_branch = self.block_body(brace)?;

        // `else` may sit on a later line than the closing brace
        let checkpoint = self.current;
        self.skip_newlines();
        let else_branch = if self.match_keyword(Keyword::Else) {
            if self.check_keyword(Keyword::If) {
                let nested = self.if_statement()?;
                Some(Block {
                    location: nested.location().clone(),
                    statements: vec![nested],
                })
            } else {
                let brace = self
                    .consume(TokenType::LeftBrace, "'{' after 'else'")?
                    .location
                    .clone();
                Some(self.block_body(brace)?)
            }
        } else {
            self.current = checkpoint;
            None
        };

        Ok(Expr::If {
            condition,
            then_branch,
            else_branch,
            location,
        })
    }

    fn return_statement(&mut self) -> CinderResult<Expr> {
        let location = self.advance().location.clone();

        if self.function_depth == 0 {
            return Err(CinderError::syntax_error(
                "'return' outside of a function body",
                location,
            ));
        }

        let value = Box::new(self.expression()?);
        Ok(Expr::Return { value, location })
    }

    /// Parse statements up to and including the closing `}`
    fn block_body(&mut self, location: SourceLocation) -> CinderResult<Block> {
        let mut statements = Vec::new();

        self.skip_separators();
        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.statement()?);
            self.end_of_statement()?;
            self.skip_separators();
        }

        self.consume(TokenType::RightBrace, "'}' to close block")?;
        Ok(Block {
            statements,
            location,
        })
    }

    fn end_of_statement(&mut self) -> CinderResult<()> {
        match self.peek().token_type {
            TokenType::Newline | TokenType::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenType::RightBrace | TokenType::Eof => Ok(()),
            _ => Err(self.expected("end of statement")),
        }
    }

    // ===== Expressions =====

    fn expression(&mut self) -> CinderResult<Expr> {
        self.binary_expression(1)
    }

    /// Precedence climbing: fold operators binding at least `min_precedence`
    fn binary_expression(&mut self, min_precedence: u8) -> CinderResult<Expr> {
        let mut left = self.unary()?;

        while let Some(operator) = self.peek_binary_operator() {
            if operator.precedence() < min_precedence {
                break;
            }
            let location = self.advance().location.clone();

            // Left associative: the right operand only takes tighter operators
            let right = self.binary_expression(operator.precedence() + 1)?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn unary(&mut self) -> CinderResult<Expr> {
        if self.match_token(&TokenType::Minus) {
            let location = self.previous().location.clone();
            let operand = Box::new(self.unary()?);
            return Ok(Expr::UnaryOp {
                operator: UnaryOp::Negate,
                operand,
                location,
            });
        }

        self.primary()
    }

    fn primary(&mut self) -> CinderResult<Expr> {
        let location = self.peek().location.clone();

        match self.peek().token_type {
            TokenType::Literal(literal) => {
                self.advance();
                let value = match literal {
                    TokenLiteral::Integer(n) => Number::Int(n),
                    TokenLiteral::Float(x) => Number::Float(x),
                };
                Ok(Expr::NumberLiteral { value, location })
            }
            TokenType::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::BoolLiteral {
                    value: true,
                    location,
                })
            }
            TokenType::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::BoolLiteral {
                    value: false,
                    location,
                })
            }
            TokenType::Identifier => {
                let name = self.advance().lexeme.clone();
                if self.match_token(&TokenType::LeftParen) {
                    self.finish_call(name, location)
                } else {
                    Ok(Expr::Identifier { name, location })
                }
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenType::RightParen, "')' after expression")?;
                Ok(expr)
            }
            _ => Err(self.expected("expression")),
        }
    }

    fn finish_call(&mut self, callee: String, location: SourceLocation) -> CinderResult<Expr> {
        let mut arguments = Vec::new();

        if !self.check(&TokenType::RightParen) {
            loop {
                arguments.push(self.expression()?);
                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "')' after arguments")?;

        Ok(Expr::FunctionCall {
            callee,
            arguments,
            location,
        })
    }

    fn peek_binary_operator(&self) -> Option<BinaryOp> {
        let operator = match self.peek().token_type {
            TokenType::Plus => BinaryOp::Add,
            TokenType::Minus => BinaryOp::Subtract,
            TokenType::Star => BinaryOp::Multiply,
            TokenType::Slash => BinaryOp::Divide,
            TokenType::Percent => BinaryOp::Modulo,
            TokenType::Caret => BinaryOp::Power,
            TokenType::Equal => BinaryOp::Equal,
            TokenType::Less => BinaryOp::Less,
            TokenType::LessEqual => BinaryOp::LessEqual,
            TokenType::Greater => BinaryOp::Greater,
            TokenType::GreaterEqual => BinaryOp::GreaterEqual,
            _ => return None,
        };
        Some(operator)
    }

    // ===== Helper Methods =====

    fn skip_newlines(&mut self) {
        while self.check(&TokenType::Newline) {
            self.advance();
        }
    }

    fn skip_separators(&mut self) {
        while self.check(&TokenType::Newline) || self.check(&TokenType::Semicolon) {
            self.advance();
        }
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(&self.peek().token_type) == std::mem::discriminant(token_type)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek().token_type, TokenType::Keyword(k) if k == keyword)
    }

    fn peek_next_is(&self, token_type: &TokenType) -> bool {
        self.tokens.get(self.current + 1).map_or(false, |token| {
            std::mem::discriminant(&token.token_type) == std::mem::discriminant(token_type)
        })
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume(&mut self, token_type: TokenType, expected: &str) -> CinderResult<&Token> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(self.expected(expected))
        }
    }

    fn consume_identifier(&mut self, expected: &str) -> CinderResult<String> {
        if self.check(&TokenType::Identifier) {
            Ok(self.advance().lexeme.clone())
        } else {
            Err(self.expected(expected))
        }
    }

    fn expected(&self, what: &str) -> CinderError {
        let found = self.peek();
        CinderError::syntax_error(
            format!("expected {}, found {}", what, found.token_type),
            found.location.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> CinderResult<Ast> {
        Parser::from_source(source, None)?.parse()
    }

    /// Compact rendering of a node's shape, ignoring locations
    fn shape(expr: &Expr) -> String {
        match expr {
            Expr::NumberLiteral { value: Number::Int(n), .. } => n.to_string(),
            Expr::NumberLiteral { value: Number::Float(x), .. } => format!("{:?}", x),
            Expr::BoolLiteral { value, .. } => value.to_string(),
            Expr::Identifier { name, .. } => name.clone(),
            Expr::UnaryOp { operand, .. } => format!("(neg {})", shape(operand)),
            Expr::BinaryOp { left, operator, right, .. } => {
                format!("({} {} {})", operator, shape(left), shape(right))
            }
            Expr::Assignment { name, value, .. } => format!("(set {} {})", name, shape(value)),
            Expr::VarDecl { name, initializer, .. } => {
                format!("(var {} {})", name, shape(initializer))
            }
            Expr::FunctionDecl { name, params, body, ret, .. } => format!(
                "(func {} [{}] {} -> {})",
                name,
                params.join(" "),
                block_shape(body),
                ret.as_deref().map_or_else(|| "void".to_string(), shape)
            ),
            Expr::FunctionCall { callee, arguments, .. } => {
                let args: Vec<String> = arguments.iter().map(shape).collect();
                format!("(call {} {})", callee, args.join(" "))
            }
            Expr::Block(block) => block_shape(block),
            Expr::If { condition, then_branch, else_branch, .. } => format!(
                "(if {} {}{})",
                shape(condition),
                block_shape(then_branch),
                else_branch
                    .as_ref()
                    .map_or_else(String::new, |b| format!(" {}", block_shape(b)))
            ),
            Expr::Return { value, .. } => format!("(return {})", shape(value)),
        }
    }

    fn block_shape(block: &Block) -> String {
        let statements: Vec<String> = block.statements.iter().map(shape).collect();
        format!("{{{}}}", statements.join("; "))
    }

    fn shapes(source: &str) -> Vec<String> {
        parse(source).unwrap().nodes.iter().map(shape).collect()
    }

    fn syntax_error(source: &str) -> (String, SourceLocation) {
        match parse(source) {
            Err(CinderError::SyntaxError { message, location }) => (message, location),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        assert_eq!(shapes("2 + 3 * 4"), vec!["(+ 2 (* 3 4))"]);
        assert_eq!(shapes("(2 + 3) * 4"), vec!["(* (+ 2 3) 4)"]);
    }

    #[test]
    fn test_operators_are_left_associative() {
        assert_eq!(shapes("10 - 4 - 3"), vec!["(- (- 10 4) 3)"]);
        assert_eq!(shapes("2 ^ 3 ^ 2"), vec!["(^ (^ 2 3) 2)"]);
        assert_eq!(shapes("8 / 4 % 3"), vec!["(% (/ 8 4) 3)"]);
    }

    #[test]
    fn test_precedence_ladder() {
        assert_eq!(
            shapes("1 + 2 >= 3 * 4 ^ 2"),
            vec!["(>= (+ 1 2) (* 3 (^ 4 2)))"]
        );
        assert_eq!(
            shapes("z + 23 * (23 - 4) * 4 / (1 + 2 ^ 4)"),
            vec!["(+ z (/ (* (* 23 (- 23 4)) 4) (+ 1 (^ 2 4))))"]
        );
    }

    #[test]
    fn test_unary_minus_binds_tightest() {
        assert_eq!(shapes("-2 ^ 2"), vec!["(^ (neg 2) 2)"]);
        assert_eq!(shapes("26 % -21"), vec!["(% 26 (neg 21))"]);
        assert_eq!(shapes("--x"), vec!["(neg (neg x))"]);
    }

    #[test]
    fn test_literals() {
        assert_eq!(shapes("3.5\ntrue\nfalse"), vec!["3.5", "true", "false"]);
    }

    #[test]
    fn test_declaration_and_assignment_are_distinct() {
        assert_eq!(
            shapes("var x = (2 + 3) * 4\nx = 2 + 3 * 4"),
            vec!["(var x (* (+ 2 3) 4))", "(set x (+ 2 (* 3 4)))"]
        );
    }

    #[test]
    fn test_function_declaration_lifts_trailing_return() {
        assert_eq!(
            shapes("func pow(x, y) {\n   return x^y\n}"),
            vec!["(func pow [x y] {} -> (^ x y))"]
        );
    }

    #[test]
    fn test_function_without_return_yields_void() {
        assert_eq!(
            shapes("func log(a) {\n  print(a)\n}"),
            vec!["(func log [a] {(call print a)} -> void)"]
        );
    }

    #[test]
    fn test_nested_return_stays_in_body() {
        assert_eq!(
            shapes("func f(a) {\n if (a > 0) {\n  return 1\n }\n return 2\n}"),
            vec!["(func f [a] {(if (> a 0) {(return 1)})} -> 2)"]
        );
    }

    #[test]
    fn test_one_line_function_with_semicolons() {
        assert_eq!(
            shapes("func max(x,z){ if (x>z) { x = z } ; return z }"),
            vec!["(func max [x z] {(if (> x z) {(set x z)})} -> z)"]
        );
    }

    #[test]
    fn test_calls_and_nested_calls() {
        assert_eq!(
            shapes("x = f(f(x,1),f(2, f(1,y)))\nf()"),
            vec![
                "(set x (call f (call f x 1) (call f 2 (call f 1 y))))",
                "(call f )"
            ]
        );
    }

    #[test]
    fn test_if_else_with_comments_and_blank_lines() {
        let source = "if (1+2 >= 3) {\n\n   # test !\n   var z = 12 + x * 3\n   x = z + 26 % -21\n} else {   x = (12 ^ 2) * pow(2,3) \n   x = fun(x) \n}";
        assert_eq!(
            shapes(source),
            vec![
                "(if (>= (+ 1 2) 3) {(var z (+ 12 (* x 3))); (set x (+ z (% 26 (neg 21))))} \
                 {(set x (* (^ 12 2) (call pow 2 3))); (set x (call fun x))})"
            ]
        );
    }

    #[test]
    fn test_else_on_following_line() {
        assert_eq!(
            shapes("if (a) {\n b = 1\n}\nelse {\n b = 2\n}"),
            vec!["(if a {(set b 1)} {(set b 2)})"]
        );
    }

    #[test]
    fn test_if_without_else_leaves_next_statement() {
        assert_eq!(
            shapes("if (a) { b = 1 }\n\nc"),
            vec!["(if a {(set b 1)})", "c"]
        );
    }

    #[test]
    fn test_else_if_chain() {
        assert_eq!(
            shapes("if (a) { 1 } else if (b) { 2 } else { 3 }"),
            vec!["(if a {1} {(if b {2} {3})})"]
        );
    }

    #[test]
    fn test_bare_block() {
        assert_eq!(shapes("{\n var a = 1\n a\n}"), vec!["{(var a 1); a}"]);
    }

    #[test]
    fn test_empty_program_and_empty_blocks() {
        assert!(parse("").unwrap().nodes.is_empty());
        assert!(parse("\n\n# only a comment\n").unwrap().nodes.is_empty());
        assert_eq!(shapes("if (z) {}"), vec!["(if z {})"]);
    }

    #[test]
    fn test_node_locations() {
        let ast = parse("var x = 5\n  f(1, x)").unwrap();
        assert_eq!(ast.nodes[0].location(), &SourceLocation::at(1, 1));
        assert_eq!(ast.nodes[1].location(), &SourceLocation::at(2, 3));
    }

    #[test]
    fn test_missing_closing_paren() {
        let (message, location) = syntax_error("var x = (1 + 2\nx");
        assert_eq!(message, "expected ')' after expression, found newline");
        assert_eq!(location, SourceLocation::at(1, 15));
    }

    #[test]
    fn test_missing_expression() {
        let (message, _) = syntax_error("var x = ");
        assert_eq!(message, "expected expression, found end of input");
    }

    #[test]
    fn test_unterminated_block() {
        let (message, _) = syntax_error("func f(a) {\n return a\n");
        assert_eq!(message, "expected '}' to close block, found end of input");
    }

    #[test]
    fn test_two_statements_on_one_line() {
        let (message, location) = syntax_error("var x = 1 var y = 2");
        assert_eq!(message, "expected end of statement, found keyword 'var'");
        assert_eq!(location, SourceLocation::at(1, 11));
    }

    #[test]
    fn test_return_outside_function() {
        let (message, location) = syntax_error("var x = 1\nreturn x");
        assert_eq!(message, "'return' outside of a function body");
        assert_eq!(location, SourceLocation::at(2, 1));

        let (message, _) = syntax_error("if (1) {\n return 2\n}");
        assert_eq!(message, "'return' outside of a function body");
    }

    #[test]
    fn test_duplicate_parameter() {
        let (message, _) = syntax_error("func f(a, a) { return a }");
        assert_eq!(message, "duplicate parameter 'a' in function 'f'");
    }

    #[test]
    fn test_var_requires_initializer() {
        let (message, _) = syntax_error("var x\n");
        assert_eq!(message, "expected '=' after variable name, found newline");
    }

    #[test]
    fn test_if_requires_parentheses() {
        let (message, _) = syntax_error("if x > 1 { x = 1 }");
        assert_eq!(message, "expected '(' after 'if', found identifier");
    }

    #[test]
    fn test_parser_accepts_stream_without_eof() {
        let mut tokens = Lexer::new("1 + 2", None).tokenize().unwrap();
        tokens.pop();
        let ast = Parser::new(tokens).parse().unwrap();
        assert_eq!(ast.nodes.len(), 1);
    }

    #[test]
    fn test_parser_accepts_empty_stream() {
        let ast = Parser::new(Vec::new()).parse().unwrap();
        assert!(ast.nodes.is_empty());
    }
}
