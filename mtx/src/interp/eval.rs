//! Tree-walking evaluator

use super::builtins;
use super::error::{InterpResult, RuntimeError};
use super::memory::{ConcreteRef, Frame, MemoryStack, Target};
use super::ops;
use super::output::PrintHandler;
use super::value::Value;
use crate::ast::{AssignOp, Expr, FlowKeyword, Program, Range, Spanned, Stmt};

/// Stack growth parameters for deeply nested programs
const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

/// How a statement finished
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Fell through to the next statement
    Normal,
    /// `break`: leave the nearest loop
    Break,
    /// `continue`: next iteration of the nearest loop
    Continue,
    /// `return [value]`: stop the enclosing instruction sequence
    Return(Option<Value>),
}

/// The interpreter
#[derive(Debug, Default)]
pub struct Interpreter {
    memory: MemoryStack,
    output: PrintHandler,
}

impl Interpreter {
    /// Create an interpreter that prints to stdout
    pub fn new() -> Self {
        Self::with_output(PrintHandler::Stdout)
    }

    /// Create an interpreter that prints through `output`
    pub fn with_output(output: PrintHandler) -> Self {
        Interpreter {
            memory: MemoryStack::new(),
            output,
        }
    }

    /// Output captured so far (only a `Buffer` handler captures)
    pub fn output(&self) -> &str {
        self.output.output()
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    /// Runtime memory, for inspection
    pub fn memory(&self) -> &MemoryStack {
        &self.memory
    }

    /// Run a program. A top-level `return` stops it and yields its value.
    pub fn run(&mut self, program: &Program) -> InterpResult<Option<Value>> {
        tracing::debug!(instructions = program.body.len(), "run started");
        for stmt in &program.body {
            match self.exec(stmt)? {
                Flow::Normal => {}
                Flow::Return(value) => {
                    tracing::debug!(line = stmt.line(), "top-level return");
                    return Ok(value);
                }
                Flow::Break | Flow::Continue => {
                    tracing::warn!(line = stmt.line(), "loop control outside a loop; stopping");
                    return Ok(None);
                }
            }
        }
        tracing::debug!("run finished");
        Ok(None)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn exec(&mut self, stmt: &Spanned<Stmt>) -> InterpResult<Flow> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.exec_inner(stmt))
            .map_err(|e| e.at_line(stmt.line()))
    }

    fn exec_all(&mut self, stmts: &[Spanned<Stmt>]) -> InterpResult<Flow> {
        for stmt in stmts {
            let flow = self.exec(stmt)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    /// Run `f` inside a fresh frame that is popped on every exit path
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> InterpResult<T>) -> InterpResult<T> {
        self.memory.push(Frame::new());
        let result = f(self);
        self.memory.pop();
        result
    }

    fn exec_inner(&mut self, stmt: &Spanned<Stmt>) -> InterpResult<Flow> {
        match &stmt.node {
            Stmt::Block(content) => self.scoped(|this| this.exec_all(content)),

            Stmt::Flow(FlowKeyword::Break) => Ok(Flow::Break),
            Stmt::Flow(FlowKeyword::Continue) => Ok(Flow::Continue),

            Stmt::Print(args) => {
                let mut parts = Vec::with_capacity(args.len());
                for arg in args {
                    parts.push(self.eval(arg)?.to_string());
                }
                self.output.println(&parts.join(", "));
                Ok(Flow::Normal)
            }

            Stmt::Return(value) => {
                let value = value.as_ref().map(|v| self.eval(v)).transpose()?;
                Ok(Flow::Return(value))
            }

            Stmt::Assign { target, op, value } => {
                self.assign(target, *op, value)?;
                Ok(Flow::Normal)
            }

            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.exec(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { cond, body } => {
                while self.eval(cond)?.is_truthy() {
                    match self.exec(body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::For {
                iterator,
                range,
                body,
            } => {
                let (start, end) = self.eval_range(range)?;
                let counter = Target::Var(iterator.node.clone());
                self.scoped(|this| {
                    this.memory.insert(&counter, Value::Int(start))?;
                    loop {
                        if this.read_counter(&counter)? >= end {
                            break;
                        }
                        match this.exec(body)? {
                            Flow::Break => break,
                            Flow::Normal | Flow::Continue => {}
                            ret @ Flow::Return(_) => return Ok(ret),
                        }
                        let next = this.read_counter(&counter)?.wrapping_add(1);
                        this.memory.set(&counter, Value::Int(next))?;
                    }
                    Ok(Flow::Normal)
                })
            }
        }
    }

    fn eval_range(&mut self, range: &Range) -> InterpResult<(i64, i64)> {
        let start = self.eval_int(&range.start)?;
        let end = self.eval_int(&range.end)?;
        Ok((start, end))
    }

    fn read_counter(&self, counter: &Target) -> InterpResult<i64> {
        let value = self.memory.get(counter)?;
        value
            .as_int()
            .ok_or_else(|| RuntimeError::type_error("int", value.type_name()))
    }

    fn assign(
        &mut self,
        target: &Spanned<Expr>,
        op: AssignOp,
        value: &Spanned<Expr>,
    ) -> InterpResult<()> {
        let location = self.resolve_target(target)?;
        let rhs = self.eval(value)?;
        match op.binary() {
            None => match location {
                Target::Var(_) => self.memory.insert(&location, rhs),
                Target::Ref(_) => self.memory.set(&location, rhs),
            },
            Some(bin) => {
                let current = self.memory.get(&location)?;
                let updated = ops::binary(bin, &current, &rhs)?;
                self.memory.set(&location, updated)
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Evaluate an assignment target to a storage location without reading it
    fn resolve_target(&mut self, target: &Spanned<Expr>) -> InterpResult<Target> {
        match &target.node {
            Expr::Var(name) => Ok(Target::Var(name.clone())),
            Expr::Reference { name, coords } => self.resolve_reference(&name.node, coords),
            other => Err(RuntimeError::type_error(
                "variable or reference",
                expr_kind(other),
            )),
        }
    }

    fn resolve_reference(&mut self, name: &str, coords: &[Spanned<Expr>]) -> InterpResult<Target> {
        let mut concrete = Vec::with_capacity(coords.len());
        for coord in coords {
            concrete.push(self.eval_int(coord)?);
        }
        Ok(Target::Ref(ConcreteRef {
            name: name.to_string(),
            coords: concrete,
        }))
    }

    fn eval_int(&mut self, expr: &Spanned<Expr>) -> InterpResult<i64> {
        let value = self.eval(expr)?;
        value
            .as_int()
            .ok_or_else(|| RuntimeError::type_error("int", value.type_name()))
    }

    /// Evaluate an expression to its value
    pub fn eval(&mut self, expr: &Spanned<Expr>) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr))
    }

    fn eval_inner(&mut self, expr: &Spanned<Expr>) -> InterpResult<Value> {
        match &expr.node {
            Expr::IntLit(n) => Ok(Value::Int(*n)),
            Expr::FloatLit(x) => Ok(Value::Float(*x)),
            Expr::StringLit(s) => Ok(Value::Str(s.clone())),

            Expr::Var(name) => self.memory.get(&Target::Var(name.clone())),

            Expr::Vector(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for e in elements {
                    items.push(self.eval(e)?);
                }
                Ok(Value::Array(items))
            }

            Expr::Matrix(rows) => {
                let mut items = Vec::with_capacity(rows.len());
                for row in rows {
                    let mut cells = Vec::with_capacity(row.node.len());
                    for e in &row.node {
                        cells.push(self.eval(e)?);
                    }
                    items.push(Value::Array(cells));
                }
                Ok(Value::Array(items))
            }

            Expr::Reference { name, coords } => {
                let target = self.resolve_reference(&name.node, coords)?;
                self.memory.get(&target)
            }

            Expr::Call { func, args } => {
                let mut sizes = Vec::with_capacity(args.len());
                for arg in args {
                    sizes.push(self.eval_int(arg)?);
                }
                builtins::call(*func, &sizes)
            }

            Expr::Binary { left, op, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                ops::binary(*op, &l, &r)
            }

            Expr::Compare { left, op, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                ops::compare(*op, &l, &r)
            }

            Expr::Unary { op, expr } => {
                let v = self.eval(expr)?;
                ops::unary(*op, &v)
            }
        }
    }
}

fn expr_kind(expr: &Expr) -> &'static str {
    match expr {
        Expr::IntLit(_) | Expr::FloatLit(_) | Expr::StringLit(_) => "literal",
        Expr::Var(_) => "variable",
        Expr::Vector(_) | Expr::Matrix(_) => "array literal",
        Expr::Reference { .. } => "reference",
        Expr::Call { .. } => "call",
        Expr::Binary { .. } | Expr::Compare { .. } | Expr::Unary { .. } => "expression",
    }
}
