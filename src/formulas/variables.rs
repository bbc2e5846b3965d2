use std::collections::HashMap;

/// The ordered table of distinct propositional variables of a problem.
///
/// Identifiers are registered in observation order and keep their index for
/// the lifetime of the table. Index `j` of a valuation bitvector refers to
/// the variable `name(j)`.
#[derive(Debug, Default, Clone)]
pub struct VariableTable {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl VariableTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` if it is not yet present and returns its index.
    pub fn insert(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Returns the index of `name`, if registered.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns the name at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    /// All registered names in observation order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The number of registered variables.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// `true` iff no variable has been registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
