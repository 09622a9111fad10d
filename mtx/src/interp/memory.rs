//! Scoped runtime memory
//!
//! A stack of frames, index 0 is the root. Blocks and `for` loops push a
//! frame on entry and pop it on exit, so their locals are dropped at once.

use super::{InterpResult, RuntimeError, Value};
use std::collections::HashMap;

/// One scope's worth of name -> value bindings
#[derive(Debug, Clone, Default)]
pub struct Frame {
    values: HashMap<String, Value>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn put(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

/// An indexed access with every coordinate already evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcreteRef {
    pub name: String,
    pub coords: Vec<i64>,
}

/// A storage location: a whole variable or one slot inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Var(String),
    Ref(ConcreteRef),
}

impl Target {
    /// Name of the variable that owns the location
    pub fn name(&self) -> &str {
        match self {
            Target::Var(name) => name,
            Target::Ref(r) => &r.name,
        }
    }
}

/// Stack of frames; never empty
#[derive(Debug)]
pub struct MemoryStack {
    frames: Vec<Frame>,
}

impl Default for MemoryStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStack {
    /// Create a new stack holding only the root frame
    pub fn new() -> Self {
        MemoryStack {
            frames: vec![Frame::new()],
        }
    }

    /// Current number of frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
        tracing::trace!(depth = self.frames.len(), "frame pushed");
    }

    /// Remove the innermost frame. The root frame is never popped.
    pub fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() <= 1 {
            return None;
        }
        let frame = self.frames.pop();
        tracing::trace!(depth = self.frames.len(), "frame popped");
        frame
    }

    /// Bind in the innermost frame, shadowing outer bindings.
    ///
    /// A slot inside an array cannot be declared, so a `Ref` target is
    /// written wherever its container lives, as with [`MemoryStack::set`].
    pub fn insert(&mut self, target: &Target, value: Value) -> InterpResult<()> {
        match target {
            Target::Var(name) => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.put(name.as_str(), value);
                }
                Ok(())
            }
            Target::Ref(r) => self.write_slot(r, value),
        }
    }

    /// Overwrite in the frame that owns the name, falling back to `insert`
    pub fn set(&mut self, target: &Target, value: Value) -> InterpResult<()> {
        match target {
            Target::Var(name) => match self.owner_mut(name) {
                Some(frame) => {
                    frame.put(name.as_str(), value);
                    Ok(())
                }
                None => self.insert(target, value),
            },
            Target::Ref(r) => self.write_slot(r, value),
        }
    }

    /// Current value at `target`
    pub fn get(&self, target: &Target) -> InterpResult<Value> {
        let root = self
            .frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(target.name()))
            .ok_or_else(|| RuntimeError::undefined_variable(target.name()))?;
        match target {
            Target::Var(_) => Ok(root.clone()),
            Target::Ref(r) => {
                let mut current = root;
                for &coord in &r.coords {
                    current = element(current, coord)?;
                }
                Ok(current.clone())
            }
        }
    }

    /// Every visible binding, innermost shadowing outer, sorted by name
    pub fn visible(&self) -> Vec<(String, Value)> {
        let mut seen: HashMap<&str, &Value> = HashMap::new();
        for frame in self.frames.iter().rev() {
            for (name, value) in &frame.values {
                seen.entry(name.as_str()).or_insert(value);
            }
        }
        let mut bindings: Vec<(String, Value)> = seen
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }

    fn owner_mut(&mut self, name: &str) -> Option<&mut Frame> {
        self.frames.iter_mut().rev().find(|frame| frame.contains(name))
    }

    /// Walk to the parent of the addressed slot and replace the slot in place
    fn write_slot(&mut self, r: &ConcreteRef, value: Value) -> InterpResult<()> {
        let Some((&last, path)) = r.coords.split_last() else {
            return self.set(&Target::Var(r.name.clone()), value);
        };
        let frame = self
            .owner_mut(&r.name)
            .ok_or_else(|| RuntimeError::undefined_variable(&r.name))?;
        let mut current = frame
            .values
            .get_mut(&r.name)
            .ok_or_else(|| RuntimeError::undefined_variable(&r.name))?;
        for &coord in path {
            current = element_mut(current, coord)?;
        }
        *element_mut(current, last)? = value;
        Ok(())
    }
}

fn index(coord: i64, len: usize) -> InterpResult<usize> {
    usize::try_from(coord)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| RuntimeError::index_out_of_bounds(coord, len))
}

fn element(value: &Value, coord: i64) -> InterpResult<&Value> {
    match value {
        Value::Array(items) => Ok(&items[index(coord, items.len())?]),
        other => Err(RuntimeError::type_error("vector or matrix", other.type_name())),
    }
}

fn element_mut(value: &mut Value, coord: i64) -> InterpResult<&mut Value> {
    match value {
        Value::Array(items) => {
            let i = index(coord, items.len())?;
            Ok(&mut items[i])
        }
        other => Err(RuntimeError::type_error("vector or matrix", other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::ErrorKind;

    fn var(name: &str) -> Target {
        Target::Var(name.to_string())
    }

    fn slot(name: &str, coords: &[i64]) -> Target {
        Target::Ref(ConcreteRef {
            name: name.to_string(),
            coords: coords.to_vec(),
        })
    }

    fn matrix(rows: &[&[i64]]) -> Value {
        Value::Array(
            rows.iter()
                .map(|r| Value::Array(r.iter().map(|&n| Value::Int(n)).collect()))
                .collect(),
        )
    }

    #[test]
    fn test_basic_insert_get() {
        let mut stack = MemoryStack::new();
        stack.insert(&var("x"), Value::Int(42)).unwrap();
        assert_eq!(stack.get(&var("x")).unwrap(), Value::Int(42));
        assert_eq!(
            stack.get(&var("y")).unwrap_err().kind,
            ErrorKind::UndefinedVariable
        );
    }

    #[test]
    fn test_frame_push_pop() {
        let mut stack = MemoryStack::new();
        stack.insert(&var("x"), Value::Int(1)).unwrap();

        stack.push(Frame::new());
        stack.insert(&var("y"), Value::Int(2)).unwrap();
        assert_eq!(stack.get(&var("x")).unwrap(), Value::Int(1));
        assert_eq!(stack.get(&var("y")).unwrap(), Value::Int(2));

        let popped = stack.pop().unwrap();
        assert!(popped.contains("y"));

        // y is gone, x remains
        assert!(stack.get(&var("y")).is_err());
        assert_eq!(stack.get(&var("x")).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_root_frame_never_popped() {
        let mut stack = MemoryStack::new();
        assert!(stack.pop().is_none());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_insert_shadows() {
        let mut stack = MemoryStack::new();
        stack.insert(&var("x"), Value::Int(1)).unwrap();
        stack.push(Frame::new());
        stack.insert(&var("x"), Value::Int(2)).unwrap();
        assert_eq!(stack.get(&var("x")).unwrap(), Value::Int(2));
        stack.pop();
        assert_eq!(stack.get(&var("x")).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_set_in_parent_frame() {
        let mut stack = MemoryStack::new();
        stack.insert(&var("x"), Value::Int(1)).unwrap();
        stack.push(Frame::new());
        stack.set(&var("x"), Value::Int(99)).unwrap();
        stack.pop();
        // Change persisted
        assert_eq!(stack.get(&var("x")).unwrap(), Value::Int(99));
    }

    #[test]
    fn test_set_falls_back_to_insert() {
        let mut stack = MemoryStack::new();
        stack.push(Frame::new());
        stack.set(&var("z"), Value::Int(3)).unwrap();
        assert_eq!(stack.get(&var("z")).unwrap(), Value::Int(3));
        stack.pop();
        assert!(stack.get(&var("z")).is_err());
    }

    #[test]
    fn test_reference_read() {
        let mut stack = MemoryStack::new();
        stack.insert(&var("m"), matrix(&[&[1, 2], &[3, 4]])).unwrap();
        assert_eq!(stack.get(&slot("m", &[1, 0])).unwrap(), Value::Int(3));
        assert_eq!(
            stack.get(&slot("m", &[0])).unwrap(),
            Value::Array(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_reference_write_from_inner_frame() {
        let mut stack = MemoryStack::new();
        stack.insert(&var("m"), matrix(&[&[1, 2], &[3, 4]])).unwrap();
        stack.push(Frame::new());
        stack.set(&slot("m", &[0, 1]), Value::Int(7)).unwrap();
        stack.pop();
        assert_eq!(stack.get(&var("m")).unwrap(), matrix(&[&[1, 7], &[3, 4]]));
    }

    #[test]
    fn test_reference_out_of_bounds() {
        let mut stack = MemoryStack::new();
        stack.insert(&var("v"), matrix(&[&[1, 2]])).unwrap();
        let err = stack.get(&slot("v", &[0, 2])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndexOutOfBounds);
        let err = stack.set(&slot("v", &[-1]), Value::Int(0)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndexOutOfBounds);
    }

    #[test]
    fn test_reference_to_missing_container() {
        let mut stack = MemoryStack::new();
        let err = stack.set(&slot("q", &[0]), Value::Int(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedVariable);
    }

    #[test]
    fn test_indexing_a_scalar() {
        let mut stack = MemoryStack::new();
        stack.insert(&var("x"), Value::Int(1)).unwrap();
        let err = stack.get(&slot("x", &[0])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
    }

    #[test]
    fn test_visible_bindings() {
        let mut stack = MemoryStack::new();
        stack.insert(&var("b"), Value::Int(1)).unwrap();
        stack.insert(&var("a"), Value::Int(2)).unwrap();
        stack.push(Frame::new());
        stack.insert(&var("b"), Value::Int(3)).unwrap();
        assert_eq!(
            stack.visible(),
            vec![
                ("a".to_string(), Value::Int(2)),
                ("b".to_string(), Value::Int(3))
            ]
        );
    }

    #[test]
    fn test_deep_nesting() {
        let mut stack = MemoryStack::new();
        for i in 0..1000 {
            stack.push(Frame::new());
            stack.insert(&var(&format!("var_{i}")), Value::Int(i)).unwrap();
        }
        assert_eq!(stack.depth(), 1001);
        assert_eq!(stack.get(&var("var_0")).unwrap(), Value::Int(0));
        for _ in 0..1000 {
            stack.pop();
        }
        assert_eq!(stack.depth(), 1);
        assert!(stack.get(&var("var_0")).is_err());
    }
}
