//! Recursive descent parser
//!
//! Turns the token stream into a [`Program`]. Precedence, lowest first:
//! comparison, `+ -`, `.+ .-`, `* /`, `.* ./`, unary `-`, postfix `'`.

use crate::ast::{
    AssignOp, BinOp, Builtin, CmpOp, Expr, FlowKeyword, Program, Range, Span, Spanned, Stmt,
    UnOp,
};
use crate::error::{CompileError, Result};
use crate::lexer::Token;


/// Parse tokens into AST
pub fn parse(source: &str, tokens: Vec<(Token, Span)>) -> Result<Program> {
    let eof_line = source.lines().count().max(1);
    let mut parser = Parser {
        tokens,
        pos: 0,
        eof: Span::new(source.len(), source.len(), eof_line),
    };
    parser.program()
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    eof: Span,
}

impl Parser {
    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn span(&self) -> Span {
        self.tokens.get(self.pos).map(|(_, s)| *s).unwrap_or(self.eof)
    }

    fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, s)| *s)
            .unwrap_or(self.eof)
    }

    fn at(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn bump(&mut self) -> Option<(Token, Span)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<Span> {
        if self.at(token) {
            let span = self.span();
            self.pos += 1;
            Ok(span)
        } else {
            Err(self.unexpected(&format!("`{token}`")))
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        match self.peek() {
            Some(found) => {
                CompileError::parser(format!("expected {expected}, found `{found}`"), self.span())
            }
            None => CompileError::parser(
                format!("expected {expected}, found end of input"),
                self.eof,
            ),
        }
    }

    fn ident(&mut self) -> Result<Spanned<String>> {
        match self.peek() {
            Some(Token::Ident(_)) => match self.bump() {
                Some((Token::Ident(name), span)) => Ok(Spanned::new(name, span)),
                _ => Err(self.unexpected("identifier")),
            },
            _ => Err(self.unexpected("identifier")),
        }
    }

    // ------------------------------------------------------------------
    // Instructions
    // ------------------------------------------------------------------

    fn program(&mut self) -> Result<Program> {
        let mut body = Vec::new();
        while self.peek().is_some() {
            body.push(self.instruction()?);
        }
        Ok(Program { body })
    }

    fn instruction(&mut self) -> Result<Spanned<Stmt>> {
        match self.peek() {
            Some(Token::LBrace) => self.block(),
            Some(Token::If) => self.if_stmt(),
            Some(Token::While) => self.while_stmt(),
            Some(Token::For) => self.for_stmt(),
            _ => {
                let stmt = self.statement()?;
                self.expect(&Token::Semi)?;
                Ok(stmt)
            }
        }
    }

    fn block(&mut self) -> Result<Spanned<Stmt>> {
        let open = self.expect(&Token::LBrace)?;
        let mut content = Vec::new();
        while !self.at(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(self.unexpected("`}`"));
            }
            content.push(self.instruction()?);
        }
        let close = self.expect(&Token::RBrace)?;
        Ok(Spanned::new(Stmt::Block(content), open.merge(close)))
    }

    fn if_stmt(&mut self) -> Result<Spanned<Stmt>> {
        let start = self.expect(&Token::If)?;
        let cond = self.paren_expr()?;
        let then_branch = Box::new(self.instruction()?);
        let else_branch = if self.eat(&Token::Else) {
            Some(Box::new(self.instruction()?))
        } else {
            None
        };
        let end = else_branch
            .as_ref()
            .map(|e| e.span)
            .unwrap_or(then_branch.span);
        Ok(Spanned::new(
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            },
            start.merge(end),
        ))
    }

    fn while_stmt(&mut self) -> Result<Spanned<Stmt>> {
        let start = self.expect(&Token::While)?;
        let cond = self.paren_expr()?;
        let body = Box::new(self.instruction()?);
        let span = start.merge(body.span);
        Ok(Spanned::new(Stmt::While { cond, body }, span))
    }

    fn for_stmt(&mut self) -> Result<Spanned<Stmt>> {
        let start = self.expect(&Token::For)?;
        let iterator = self.ident()?;
        self.expect(&Token::Eq)?;
        let range_start = self.expr()?;
        self.expect(&Token::Colon)?;
        let range_end = self.expr()?;
        let body = Box::new(self.instruction()?);
        let span = start.merge(body.span);
        Ok(Spanned::new(
            Stmt::For {
                iterator,
                range: Range {
                    start: range_start,
                    end: range_end,
                },
                body,
            },
            span,
        ))
    }

    fn paren_expr(&mut self) -> Result<Spanned<Expr>> {
        self.expect(&Token::LParen)?;
        let expr = self.expr()?;
        self.expect(&Token::RParen)?;
        Ok(expr)
    }

    fn statement(&mut self) -> Result<Spanned<Stmt>> {
        let start = self.span();
        match self.peek() {
            Some(Token::Break) => {
                self.bump();
                Ok(Spanned::new(Stmt::Flow(FlowKeyword::Break), start))
            }
            Some(Token::Continue) => {
                self.bump();
                Ok(Spanned::new(Stmt::Flow(FlowKeyword::Continue), start))
            }
            Some(Token::Return) => {
                self.bump();
                if self.at(&Token::Semi) {
                    Ok(Spanned::new(Stmt::Return(None), start))
                } else {
                    let value = self.expr()?;
                    let span = start.merge(value.span);
                    Ok(Spanned::new(Stmt::Return(Some(value)), span))
                }
            }
            Some(Token::Print) => {
                self.bump();
                let mut args = vec![self.expr()?];
                while self.eat(&Token::Comma) {
                    args.push(self.expr()?);
                }
                let span = start.merge(self.prev_span());
                Ok(Spanned::new(Stmt::Print(args), span))
            }
            Some(Token::Ident(_)) => self.assignment(),
            _ => Err(self.unexpected("statement")),
        }
    }

    fn assignment(&mut self) -> Result<Spanned<Stmt>> {
        let name = self.ident()?;
        let target = if self.at(&Token::LBracket) {
            self.reference(name)?
        } else {
            let span = name.span;
            Spanned::new(Expr::Var(name.node), span)
        };
        let op = match self.peek() {
            Some(Token::Eq) => AssignOp::Assign,
            Some(Token::PlusEq) => AssignOp::AddAssign,
            Some(Token::MinusEq) => AssignOp::SubAssign,
            Some(Token::StarEq) => AssignOp::MulAssign,
            Some(Token::SlashEq) => AssignOp::DivAssign,
            _ => return Err(self.unexpected("assignment operator")),
        };
        self.bump();
        let value = self.expr()?;
        let span = target.span.merge(value.span);
        Ok(Spanned::new(Stmt::Assign { target, op, value }, span))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expr(&mut self) -> Result<Spanned<Expr>> {
        stacker::maybe_grow(32 * 1024, 1024 * 1024, || self.comparison())
    }

    fn comparison(&mut self) -> Result<Spanned<Expr>> {
        let left = self.additive()?;
        let op = match self.peek() {
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::LtEq) => CmpOp::Le,
            Some(Token::GtEq) => CmpOp::Ge,
            Some(Token::EqEq) => CmpOp::Eq,
            Some(Token::NotEq) => CmpOp::Ne,
            _ => return Ok(left),
        };
        self.bump();
        let right = self.additive()?;
        let span = left.span.merge(right.span);
        Ok(Spanned::new(
            Expr::Compare {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        ))
    }

    /// One left-associative binary precedence level.
    fn binary_level(
        &mut self,
        ops: &[(Token, BinOp)],
        next: fn(&mut Self) -> Result<Spanned<Expr>>,
    ) -> Result<Spanned<Expr>> {
        let mut left = next(self)?;
        loop {
            let Some(op) = ops
                .iter()
                .find(|(tok, _)| self.at(tok))
                .map(|(_, op)| *op)
            else {
                return Ok(left);
            };
            self.bump();
            let right = next(self)?;
            let span = left.span.merge(right.span);
            left = Spanned::new(
                Expr::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
    }

    fn additive(&mut self) -> Result<Spanned<Expr>> {
        self.binary_level(
            &[(Token::Plus, BinOp::Add), (Token::Minus, BinOp::Sub)],
            Self::dot_additive,
        )
    }

    fn dot_additive(&mut self) -> Result<Spanned<Expr>> {
        self.binary_level(
            &[(Token::DotPlus, BinOp::DotAdd), (Token::DotMinus, BinOp::DotSub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Spanned<Expr>> {
        self.binary_level(
            &[(Token::Star, BinOp::Mul), (Token::Slash, BinOp::Div)],
            Self::dot_multiplicative,
        )
    }

    fn dot_multiplicative(&mut self) -> Result<Spanned<Expr>> {
        self.binary_level(
            &[(Token::DotStar, BinOp::DotMul), (Token::DotSlash, BinOp::DotDiv)],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Spanned<Expr>> {
        if self.at(&Token::Minus) {
            let start = self.span();
            self.bump();
            let operand = self.unary()?;
            let span = start.merge(operand.span);
            return Ok(Spanned::new(
                Expr::Unary {
                    op: UnOp::Negate,
                    expr: Box::new(operand),
                },
                span,
            ));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Spanned<Expr>> {
        let mut expr = self.primary()?;
        while self.at(&Token::Quote) {
            let quote = self.span();
            self.bump();
            let span = expr.span.merge(quote);
            expr = Spanned::new(
                Expr::Unary {
                    op: UnOp::Transpose,
                    expr: Box::new(expr),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Spanned<Expr>> {
        let start = self.span();
        match self.peek() {
            Some(Token::IntLit(n)) => {
                let n = *n;
                self.bump();
                Ok(Spanned::new(Expr::IntLit(n), start))
            }
            Some(Token::FloatLit(x)) => {
                let x = *x;
                self.bump();
                Ok(Spanned::new(Expr::FloatLit(x), start))
            }
            Some(Token::StringLit(_)) => match self.bump() {
                Some((Token::StringLit(s), span)) => Ok(Spanned::new(Expr::StringLit(s), span)),
                _ => Err(self.unexpected("string")),
            },
            Some(Token::Ident(_)) => {
                let name = self.ident()?;
                if self.at(&Token::LBracket) {
                    self.reference(name)
                } else {
                    let span = name.span;
                    Ok(Spanned::new(Expr::Var(name.node), span))
                }
            }
            Some(Token::Zeros | Token::Ones | Token::Eye) => self.call(),
            Some(Token::LBracket) => self.array_literal(),
            Some(Token::LParen) => {
                self.bump();
                let inner = self.expr()?;
                let close = self.expect(&Token::RParen)?;
                Ok(Spanned::new(inner.node, start.merge(close)))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn call(&mut self) -> Result<Spanned<Expr>> {
        let start = self.span();
        let func = match self.bump() {
            Some((Token::Zeros, _)) => Builtin::Zeros,
            Some((Token::Ones, _)) => Builtin::Ones,
            Some((Token::Eye, _)) => Builtin::Eye,
            _ => return Err(CompileError::parser("expected builtin function", start)),
        };
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if !self.at(&Token::RParen) {
            args.push(self.expr()?);
            while self.eat(&Token::Comma) {
                args.push(self.expr()?);
            }
        }
        let close = self.expect(&Token::RParen)?;
        Ok(Spanned::new(Expr::Call { func, args }, start.merge(close)))
    }

    /// `name[c1, c2, :]` with the name already consumed.
    ///
    /// Trailing `:` coordinates select a whole dimension and are dropped, so
    /// `m[0, :]` and `m[0]` denote the same reference.
    fn reference(&mut self, name: Spanned<String>) -> Result<Spanned<Expr>> {
        self.expect(&Token::LBracket)?;
        let mut coords = Vec::new();
        let mut sliced = false;
        loop {
            if self.at(&Token::Colon) {
                self.bump();
                sliced = true;
            } else if sliced {
                return Err(CompileError::parser(
                    "only trailing dimensions can be sliced with `:`",
                    self.span(),
                ));
            } else if self.at(&Token::RBracket) {
                return Err(self.unexpected("coordinate"));
            } else {
                coords.push(self.expr()?);
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        let close = self.expect(&Token::RBracket)?;
        if coords.is_empty() {
            return Err(CompileError::parser(
                "reference needs at least one explicit coordinate",
                name.span.merge(close),
            ));
        }
        let span = name.span.merge(close);
        Ok(Spanned::new(Expr::Reference { name, coords }, span))
    }

    /// `[]`, `[a, b]` or `[[a, b], [c, d]]`
    fn array_literal(&mut self) -> Result<Spanned<Expr>> {
        let open = self.expect(&Token::LBracket)?;
        if self.at(&Token::RBracket) {
            let close = self.expect(&Token::RBracket)?;
            return Ok(Spanned::new(Expr::Vector(Vec::new()), open.merge(close)));
        }
        if self.at(&Token::LBracket) {
            let mut rows = vec![self.row()?];
            while self.eat(&Token::Comma) {
                rows.push(self.row()?);
            }
            let close = self.expect(&Token::RBracket)?;
            return Ok(Spanned::new(Expr::Matrix(rows), open.merge(close)));
        }
        let mut elements = vec![self.expr()?];
        while self.eat(&Token::Comma) {
            elements.push(self.expr()?);
        }
        let close = self.expect(&Token::RBracket)?;
        Ok(Spanned::new(Expr::Vector(elements), open.merge(close)))
    }

    fn row(&mut self) -> Result<Spanned<Vec<Spanned<Expr>>>> {
        let open = self.expect(&Token::LBracket)?;
        let mut elements = Vec::new();
        if !self.at(&Token::RBracket) {
            elements.push(self.expr()?);
            while self.eat(&Token::Comma) {
                elements.push(self.expr()?);
            }
        }
        let close = self.expect(&Token::RBracket)?;
        Ok(Spanned::new(elements, open.merge(close)))
    }
}
