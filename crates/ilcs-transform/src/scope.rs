//! Lexical scopes and the method-level collision set.
//!
//! Scopes are a plain stack of frames owned by the transform context;
//! nothing global, nothing shared. The collision set deliberately lives
//! outside the frame stack: C# rejects redeclaring a simple name anywhere
//! in a method body (CS0136), even in sibling blocks where JavaScript is
//! happy to reuse it, so popped frames must not release their target
//! names.

use ilcs_csharp::types::TypeId;
use rustc_hash::{FxHashMap, FxHashSet};

/// One lexical scope.
#[derive(Debug, Default)]
struct ScopeFrame {
    /// Source identifier -> inferred C# type.
    var_types: FxHashMap<String, TypeId>,
    /// Source identifier -> target identifier, for names that collided.
    renamed: FxHashMap<String, String>,
    /// Variables backed by an ArrayBuffer (views over them become
    /// conversion helper calls).
    array_buffers: FxHashSet<String>,
    /// Variables proven to need jagged (`T[][]`) storage.
    jagged_vars: FxHashSet<String>,
}

/// The scope stack for one method/constructor/function body.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
    /// Every target identifier declared anywhere in the current method.
    /// Not popped at block exit (CS0136).
    declared_in_method: FxHashSet<String>,
}

/// What `declare` did with the requested name.
#[derive(Debug, PartialEq, Eq)]
pub struct Declared {
    pub target_name: String,
    pub renamed: bool,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a new method body: clears every frame and the
    /// method-level collision set, then pushes the body frame.
    pub fn enter_method(&mut self) {
        self.frames.clear();
        self.declared_in_method.clear();
        self.push();
    }

    pub fn push(&mut self) {
        self.frames.push(ScopeFrame::default());
    }

    /// Popping restores whatever the popped frame shadowed; outer
    /// bindings were never touched.
    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Declare `source` with `ty` in the innermost frame.
    ///
    /// The target identifier is the source identifier unless that name was
    /// already declared somewhere in this method, in which case the
    /// smallest integer suffix (starting at 2) that makes it unique is
    /// appended. The mapping is recorded so later lookups stay stable for
    /// the variable's entire live range.
    pub fn declare(&mut self, source: &str, ty: TypeId) -> Declared {
        let target = if self.declared_in_method.contains(source) {
            let mut n = 2u32;
            loop {
                let candidate = format!("{source}{n}");
                if !self.declared_in_method.contains(&candidate) {
                    break candidate;
                }
                n += 1;
            }
        } else {
            source.to_string()
        };
        let renamed = target != source;
        self.declared_in_method.insert(target.clone());
        let frame = self
            .frames
            .last_mut()
            .expect("declare called with no open scope");
        frame.var_types.insert(source.to_string(), ty);
        if renamed {
            frame.renamed.insert(source.to_string(), target.clone());
        }
        Declared {
            target_name: target,
            renamed,
        }
    }

    /// Innermost type binding for a source identifier.
    pub fn lookup(&self, source: &str) -> Option<TypeId> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.var_types.get(source).copied())
    }

    /// The target identifier a source identifier resolves to.
    pub fn target_name<'a>(&'a self, source: &'a str) -> Option<&'a str> {
        for frame in self.frames.iter().rev() {
            if let Some(renamed) = frame.renamed.get(source) {
                return Some(renamed);
            }
            if frame.var_types.contains_key(source) {
                return Some(source);
            }
        }
        None
    }

    /// Upgrade the innermost binding of `source` to a wider type, as
    /// later-assignment analysis proves it.
    pub fn update_type(&mut self, source: &str, ty: TypeId) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.var_types.get_mut(source) {
                *slot = ty;
                return;
            }
        }
    }

    pub fn mark_array_buffer(&mut self, source: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.array_buffers.insert(source.to_string());
        }
    }

    pub fn is_array_buffer(&self, source: &str) -> bool {
        self.frames
            .iter()
            .rev()
            .any(|f| f.array_buffers.contains(source))
    }

    pub fn mark_jagged(&mut self, source: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.jagged_vars.insert(source.to_string());
        }
    }

    pub fn is_jagged(&self, source: &str) -> bool {
        self.frames
            .iter()
            .rev()
            .any(|f| f.jagged_vars.contains(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_and_lookup() {
        let mut scopes = ScopeStack::new();
        scopes.enter_method();
        let d = scopes.declare("key", TypeId::BYTE_ARRAY);
        assert_eq!(d.target_name, "key");
        assert!(!d.renamed);
        assert_eq!(scopes.lookup("key"), Some(TypeId::BYTE_ARRAY));
    }

    #[test]
    fn pop_restores_shadowed_binding() {
        let mut scopes = ScopeStack::new();
        scopes.enter_method();
        scopes.declare("x", TypeId::UINT);
        scopes.push();
        scopes.declare("x", TypeId::BYTE_ARRAY);
        assert_eq!(scopes.lookup("x"), Some(TypeId::BYTE_ARRAY));
        scopes.pop();
        assert_eq!(scopes.lookup("x"), Some(TypeId::UINT));
    }

    #[test]
    fn collision_set_survives_block_exit() {
        // `for (let i...) {}` twice in one method: the second `i` must be
        // renamed even though the first frame is long gone.
        let mut scopes = ScopeStack::new();
        scopes.enter_method();
        scopes.push();
        let first = scopes.declare("i", TypeId::INT);
        assert_eq!(first.target_name, "i");
        scopes.pop();
        scopes.push();
        let second = scopes.declare("i", TypeId::INT);
        assert_eq!(second.target_name, "i2");
        assert!(second.renamed);
        // Rename is stable for the live range.
        assert_eq!(scopes.target_name("i"), Some("i2"));
        scopes.pop();
    }

    #[test]
    fn smallest_free_suffix_wins() {
        let mut scopes = ScopeStack::new();
        scopes.enter_method();
        scopes.declare("t", TypeId::INT);
        scopes.declare("t2", TypeId::INT);
        let d = scopes.declare("t", TypeId::INT);
        assert_eq!(d.target_name, "t3");
    }

    #[test]
    fn enter_method_clears_collisions() {
        let mut scopes = ScopeStack::new();
        scopes.enter_method();
        scopes.declare("i", TypeId::INT);
        scopes.enter_method();
        let d = scopes.declare("i", TypeId::INT);
        assert_eq!(d.target_name, "i");
    }

    #[test]
    fn jagged_and_buffer_marks() {
        let mut scopes = ScopeStack::new();
        scopes.enter_method();
        scopes.declare("state", TypeId::UINT_ARRAY);
        scopes.mark_jagged("state");
        scopes.mark_array_buffer("buf");
        assert!(scopes.is_jagged("state"));
        assert!(scopes.is_array_buffer("buf"));
        assert!(!scopes.is_jagged("buf"));
    }
}
