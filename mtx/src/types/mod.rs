//! Type and shape checking
//!
//! A single pass over the program that assigns a [`Descriptor`] to every
//! expression. Violations are collected as [`Diagnostic`]s and never stop
//! the traversal; an offending expression yields an `undefined` descriptor,
//! which later operators pass along without reporting again.

pub mod descriptor;
pub mod symbols;
pub mod table;

pub use descriptor::{Descriptor, Dim, VarType};
pub use symbols::{ScopeRef, SymbolTable};
pub use table::{OperationTable, Operator};

use crate::ast::*;
use crate::error::Diagnostic;
use crate::util::suggestion_hint;
use descriptor::{format_shape, shapes_match};
use symbols::create_child;

/// Static checker state for one or more programs
#[derive(Debug)]
pub struct TypeChecker {
    table: OperationTable,
    /// Innermost scope
    scope: ScopeRef,
    /// Number of enclosing `while`/`for` bodies
    loop_depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker {
            table: OperationTable::new(),
            scope: SymbolTable::new().into_ref(),
            loop_depth: 0,
            diagnostics: Vec::new(),
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Collected diagnostics as a slice
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take all diagnostics (clears the internal collection)
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Whether any error was reported since the last `take_diagnostics`
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.report(Diagnostic::new(message, span));
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(line = diagnostic.line, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    /// Descriptor of a name visible from the current scope
    pub fn lookup(&self, name: &str) -> Option<Descriptor> {
        self.scope.borrow().get(name)
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    fn enter_scope(&mut self) {
        self.scope = create_child(&self.scope);
    }

    fn exit_scope(&mut self) {
        let parent = self.scope.borrow().parent_scope();
        if let Some(parent) = parent {
            self.scope = parent;
        }
    }

    fn in_scope(&mut self, f: impl FnOnce(&mut Self)) {
        self.enter_scope();
        f(self);
        self.exit_scope();
    }

    fn in_loop(&mut self, f: impl FnOnce(&mut Self)) {
        self.loop_depth += 1;
        f(self);
        self.loop_depth -= 1;
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Check an entire program. Returns `true` when no error was found.
    pub fn check_program(&mut self, program: &Program) -> bool {
        let before = self.diagnostics.len();
        tracing::debug!(instructions = program.body.len(), "type check started");
        for stmt in &program.body {
            self.check_stmt(stmt);
        }
        let found = self.diagnostics.len() - before;
        tracing::debug!(errors = found, "type check finished");
        found == 0
    }

    /// Check a program against bindings that outlive it. When an error is
    /// found the current scope is rolled back, so nothing the rejected
    /// program declared stays visible.
    pub fn check_incremental(&mut self, program: &Program) -> bool {
        let saved = self.scope.borrow().clone();
        let ok = self.check_program(program);
        if !ok {
            *self.scope.borrow_mut() = saved;
        }
        ok
    }

    fn check_stmt(&mut self, stmt: &Spanned<Stmt>) {
        stacker::maybe_grow(32 * 1024, 1024 * 1024, || self.check_stmt_inner(stmt))
    }

    fn check_stmt_inner(&mut self, stmt: &Spanned<Stmt>) {
        match &stmt.node {
            Stmt::Block(content) => self.in_scope(|this| {
                for s in content {
                    this.check_stmt(s);
                }
            }),

            Stmt::Flow(keyword) => {
                if self.loop_depth == 0 {
                    self.error(
                        stmt.span,
                        format!("flow keyword {keyword} must be used inside a loop"),
                    );
                }
            }

            Stmt::Print(args) => {
                for arg in args {
                    self.check_expr(arg);
                }
            }

            Stmt::Return(value) => {
                if let Some(value) = value {
                    self.check_expr(value);
                }
            }

            Stmt::Assign { target, op, value } => self.check_assign(target, *op, value, stmt.span),

            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_expr(cond);
                self.check_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
            }

            Stmt::While { cond, body } => {
                self.check_expr(cond);
                self.in_loop(|this| this.check_stmt(body));
            }

            Stmt::For {
                iterator,
                range,
                body,
            } => {
                for bound in [&range.start, &range.end] {
                    let d = self.check_expr(bound);
                    if !d.is_undefined() && d.ty != VarType::Int {
                        self.error(bound.span, format!("range bound must be int, found {}", d.ty));
                    }
                }
                self.in_loop(|this| {
                    this.in_scope(|this| {
                        let descriptor = Descriptor::scalar(VarType::Int).named(&iterator.node);
                        this.scope.borrow_mut().put(&iterator.node, descriptor);
                        this.check_stmt(body);
                    })
                });
            }
        }
    }

    fn check_assign(
        &mut self,
        target: &Spanned<Expr>,
        op: AssignOp,
        value: &Spanned<Expr>,
        span: Span,
    ) {
        let Some(bin) = op.binary() else {
            return self.check_plain_assign(target, value, span);
        };

        let current = self.check_expr(target);
        let rhs = self.check_expr(value);
        if current.is_undefined() || rhs.is_undefined() {
            return;
        }
        let Some(ty) = self.table.binary(bin, current.ty, rhs.ty) else {
            self.error(
                span,
                format!("cannot {} {} to {}", op.describe(), rhs.ty, current.ty),
            );
            return;
        };
        let Some(shape) = self.result_shape(bin, &current, &rhs, span) else {
            return;
        };

        match &target.node {
            Expr::Var(name) => {
                let updated = Descriptor::new(ty, shape).named(name);
                self.scope.borrow_mut().put(name, updated);
            }
            Expr::Reference { .. } => {
                self.check_slot_assignment(&current, &Descriptor::new(ty, shape), span);
            }
            _ => self.error(target.span, "invalid assignment target"),
        }
    }

    fn check_plain_assign(&mut self, target: &Spanned<Expr>, value: &Spanned<Expr>, span: Span) {
        match &target.node {
            Expr::Var(name) => {
                // First use of a name on the left of `=` declares it.
                let rhs = self.check_expr(value);
                let declared = Descriptor::new(rhs.ty, rhs.shape).named(name);
                self.scope.borrow_mut().put(name, declared);
            }
            Expr::Reference { name, coords } => {
                let slot = self.check_reference(name, coords, target.span);
                let rhs = self.check_expr(value);
                if slot.is_undefined() || rhs.is_undefined() {
                    return;
                }
                self.check_slot_assignment(&slot, &rhs, span);
            }
            _ => {
                self.check_expr(value);
                self.error(target.span, "invalid assignment target");
            }
        }
    }

    /// What may be stored into a matrix slot: a row takes a vector of the
    /// row's length, an element takes a number.
    fn check_slot_assignment(&mut self, slot: &Descriptor, value: &Descriptor, span: Span) {
        match slot.ty {
            VarType::Vector if value.ty != VarType::Vector => self.error(
                span,
                format!("cannot assign {} to a matrix slice, expected vector", value.ty),
            ),
            VarType::Vector if !shapes_match(&slot.shape, &value.shape) => self.error(
                span,
                format!(
                    "vector sized {} does not match matrix dimensions {}",
                    format_shape(&value.shape),
                    format_shape(&slot.shape)
                ),
            ),
            VarType::Float if !value.ty.is_numeric() => self.error(
                span,
                format!("matrix element must be int or float, found {}", value.ty),
            ),
            _ => {}
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Descriptor of an expression
    pub fn check_expr(&mut self, expr: &Spanned<Expr>) -> Descriptor {
        stacker::maybe_grow(32 * 1024, 1024 * 1024, || self.check_expr_inner(expr))
    }

    fn check_expr_inner(&mut self, expr: &Spanned<Expr>) -> Descriptor {
        match &expr.node {
            Expr::IntLit(_) => Descriptor::scalar(VarType::Int),
            Expr::FloatLit(_) => Descriptor::scalar(VarType::Float),
            Expr::StringLit(_) => Descriptor::scalar(VarType::Str),

            Expr::Var(name) => self.check_variable(name, expr.span),

            Expr::Vector(elements) => {
                for e in elements {
                    self.check_expr(e);
                }
                Descriptor::vector(Dim::Known(elements.len()))
            }

            Expr::Matrix(rows) => {
                for row in rows {
                    for e in &row.node {
                        self.check_expr(e);
                    }
                }
                let cols = rows.first().map_or(0, |r| r.node.len());
                if rows.iter().any(|r| r.node.len() != cols) {
                    self.error(
                        expr.span,
                        "vectors with different sizes in matrix initialization",
                    );
                    return Descriptor::undefined();
                }
                Descriptor::matrix(Dim::Known(rows.len()), Dim::Known(cols))
            }

            Expr::Reference { name, coords } => self.check_reference(name, coords, expr.span),

            Expr::Call { func, args } => self.check_call(*func, args, expr.span),

            Expr::Binary { left, op, right } => {
                let l = self.check_expr(left);
                let r = self.check_expr(right);
                if l.is_undefined() || r.is_undefined() {
                    return Descriptor::undefined();
                }
                let Some(ty) = self.table.binary(*op, l.ty, r.ty) else {
                    self.error(
                        expr.span,
                        format!("cannot {} {} and {}", op.describe(), l.ty, r.ty),
                    );
                    return Descriptor::undefined();
                };
                match self.result_shape(*op, &l, &r, expr.span) {
                    Some(shape) => Descriptor::new(ty, shape),
                    None => Descriptor::undefined(),
                }
            }

            Expr::Compare { left, op, right } => {
                let l = self.check_expr(left);
                let r = self.check_expr(right);
                if l.is_undefined() || r.is_undefined() {
                    return Descriptor::undefined();
                }
                match self.table.compare(l.ty, r.ty) {
                    Some(ty) => Descriptor::scalar(ty),
                    None => {
                        self.error(
                            expr.span,
                            format!("cannot compare {} and {} with `{op}`", l.ty, r.ty),
                        );
                        Descriptor::undefined()
                    }
                }
            }

            Expr::Unary { op, expr: operand } => {
                let d = self.check_expr(operand);
                if d.is_undefined() {
                    return d;
                }
                let Some(ty) = self.table.unary(*op, d.ty) else {
                    self.error(expr.span, format!("cannot perform {op} on {}", d.ty));
                    return Descriptor::undefined();
                };
                let shape = match op {
                    UnOp::Transpose => d.shape.iter().rev().copied().collect(),
                    UnOp::Negate => d.shape,
                };
                Descriptor::new(ty, shape)
            }
        }
    }

    fn check_variable(&mut self, name: &str, span: Span) -> Descriptor {
        if let Some(descriptor) = self.lookup(name) {
            return descriptor;
        }
        let visible = self.scope.borrow().visible_names();
        let candidates: Vec<&str> = visible.iter().map(String::as_str).collect();
        let hint = suggestion_hint(name, &candidates);
        self.report(Diagnostic::new(format!("undefined variable {name}"), span).with_hint(hint));
        Descriptor::undefined().named(name)
    }

    fn check_reference(
        &mut self,
        name: &Spanned<String>,
        coords: &[Spanned<Expr>],
        span: Span,
    ) -> Descriptor {
        let container = self.check_variable(&name.node, name.span);
        if container.is_undefined() {
            return Descriptor::undefined();
        }

        let rank = container.shape.len();
        if coords.len() > rank {
            self.error(span, "too many dimensions in vector reference");
            return Descriptor::undefined();
        }

        let mut failed = false;
        for coord in coords {
            let d = self.check_expr(coord);
            if d.is_undefined() {
                failed = true;
            } else if d.ty != VarType::Int {
                self.error(
                    coord.span,
                    format!("expected int as array coordinate, found {}", d.ty),
                );
                failed = true;
            }
        }
        if failed {
            return Descriptor::undefined();
        }

        for (coord, dim) in coords.iter().zip(&container.shape) {
            if let Some(index) = coord.node.as_int_literal()
                && dim.excludes(index)
            {
                self.error(
                    coord.span,
                    format!("reference {index} out of bounds for size {dim}"),
                );
                failed = true;
            }
        }
        if failed {
            return Descriptor::undefined();
        }

        if coords.len() == rank {
            Descriptor::scalar(VarType::Float)
        } else {
            // Only matrices can be partially indexed; a row is left.
            let cols = container.shape.last().copied().unwrap_or(Dim::Unbounded);
            Descriptor::vector(cols)
        }
    }

    fn check_call(&mut self, func: Builtin, args: &[Spanned<Expr>], span: Span) -> Descriptor {
        for arg in args {
            let d = self.check_expr(arg);
            if d.is_undefined() {
                return Descriptor::undefined();
            }
            if d.ty != VarType::Int {
                self.error(arg.span, format!("expected int as array size, found {}", d.ty));
                return Descriptor::undefined();
            }
        }

        let dims: Vec<Dim> = args
            .iter()
            .map(|arg| match arg.node.as_int_literal() {
                Some(n) if n >= 0 => Dim::Known(n as usize),
                _ => Dim::Unbounded,
            })
            .collect();
        match dims.as_slice() {
            [n] => Descriptor::matrix(*n, *n),
            [rows, cols] => Descriptor::matrix(*rows, *cols),
            _ => {
                self.error(
                    span,
                    format!("{func} expects 1 or 2 arguments, got {}", args.len()),
                );
                Descriptor::undefined()
            }
        }
    }

    /// Shape of `l op r` for a type-legal combination, or `None` after
    /// reporting a mismatch.
    fn result_shape(
        &mut self,
        op: BinOp,
        l: &Descriptor,
        r: &Descriptor,
        span: Span,
    ) -> Option<Vec<Dim>> {
        match (l.ty.is_aggregate(), r.ty.is_aggregate()) {
            (true, true) => {}
            (true, false) => return Some(l.shape.clone()),
            (false, true) => return Some(r.shape.clone()),
            (false, false) => return Some(Vec::new()),
        }

        let compatible = match (op, l.shape.as_slice(), r.shape.as_slice()) {
            (BinOp::Mul, [n], [m]) => n.matches(*m),
            (BinOp::Mul, [_, inner_l], [inner_r, _]) => inner_l.matches(*inner_r),
            _ => shapes_match(&l.shape, &r.shape),
        };
        if !compatible {
            self.error(
                span,
                format!(
                    "shape mismatch: {} and {}",
                    format_shape(&l.shape),
                    format_shape(&r.shape)
                ),
            );
            return None;
        }

        Some(match (op, l.shape.as_slice(), r.shape.as_slice()) {
            (BinOp::Mul, [_], [_]) => Vec::new(),
            (BinOp::Mul, [rows, _], [_, cols]) => vec![*rows, *cols],
            _ => l
                .shape
                .iter()
                .zip(&r.shape)
                .map(|(a, b)| if *a == Dim::Unbounded { *b } else { *a })
                .collect(),
        })
    }
}
