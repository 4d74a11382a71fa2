//! The identifier table: every declared name of a compilation unit.
//!
//! Entries live in a single registry vector and reference each other by
//! index, the way the bytecode pools reference constants: a callable lists
//! its variables and parameters as [`EntryId`]s, and a variable points back
//! at its owning callable. Name resolution is a flat first-match scan over
//! the registry in declaration order — not a lexical-scope walk — so a name
//! reused in two callables resolves to whichever was declared first. The
//! generated code depends on this, so it is kept as-is.

use std::fmt;

use crate::error::{Error, Result};

/// Index of an entry in the registry.
pub type EntryId = usize;

/// Declared type of a variable or of a function result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Integer,
    Boolean,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer => f.write_str("integer"),
            Type::Boolean => f.write_str("boolean"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    Procedure,
    Function,
}

impl fmt::Display for CallableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallableKind::Procedure => f.write_str("procedure"),
            CallableKind::Function => f.write_str("function"),
        }
    }
}

/// A declared variable, local or parameter, of some callable.
#[derive(Debug, Clone)]
pub struct VariableEntry {
    pub name: String,
    /// The callable whose frame holds this variable.
    pub scope: EntryId,
    pub ty: Type,
    /// True for parameters (all formals are passed in).
    pub in_status: bool,
    /// True for `in out` parameters, passed by reference.
    pub out_status: bool,
    /// Slot offset within the enclosing frame, from the top of the linkage
    /// block.
    pub address: usize,
}

impl VariableEntry {
    pub fn is_parameter(&self) -> bool {
        self.in_status
    }
}

/// A declared procedure or function.
#[derive(Debug, Clone)]
pub struct CallableEntry {
    pub name: String,
    /// Lexically enclosing callable; `None` for the program itself.
    pub scope: Option<EntryId>,
    pub kind: CallableKind,
    /// Function result type; `None` for procedures.
    pub return_type: Option<Type>,
    /// Recorded machine-code entry address: one less than the address of
    /// the callable's first instruction. Call sites compensate by targeting
    /// `address + 1`; the program entry keeps the conventional 0.
    pub address: usize,
    /// All variables of the frame, parameters first, in declaration order.
    pub variables: Vec<EntryId>,
    /// The parameter prefix of `variables`.
    pub parameters: Vec<EntryId>,
}

#[derive(Debug, Clone)]
pub enum Entry {
    Variable(VariableEntry),
    Callable(CallableEntry),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Variable(v) => &v.name,
            Entry::Callable(c) => &c.name,
        }
    }
}

/// Registry of all identifiers declared during one compilation.
#[derive(Debug, Default)]
pub struct IdentifierTable {
    entries: Vec<Entry>,
}

impl IdentifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable in `scope` and record it in the scope's frame.
    ///
    /// Fails if the scope already holds a variable of the same name. The
    /// caller supplies the frame `address` (the scope's current variable
    /// count).
    pub fn add_variable(
        &mut self,
        name: String,
        ty: Type,
        scope: EntryId,
        is_in: bool,
        is_out: bool,
        address: usize,
    ) -> Result<EntryId> {
        let owner = self.callable(scope);
        for &var_id in &owner.variables {
            if self.entry(var_id).name() == name {
                let owner_name = owner.name.clone();
                return Err(Error::Runtime(format!(
                    "variable '{name}' is already declared in '{owner_name}'"
                )));
            }
        }

        let id = self.entries.len();
        self.entries.push(Entry::Variable(VariableEntry {
            name,
            scope,
            ty,
            in_status: is_in,
            out_status: is_out,
            address,
        }));

        let owner = self.callable_mut(scope);
        owner.variables.push(id);
        if is_in {
            owner.parameters.push(id);
        }
        Ok(id)
    }

    /// Declare a procedure or function with the given entry address.
    pub fn add_callable(
        &mut self,
        name: String,
        kind: CallableKind,
        scope: Option<EntryId>,
        address: usize,
    ) -> EntryId {
        let id = self.entries.len();
        self.entries.push(Entry::Callable(CallableEntry {
            name,
            scope,
            kind,
            return_type: None,
            address,
            variables: Vec::new(),
            parameters: Vec::new(),
        }));
        id
    }

    /// Resolve a name to the first entry declared with it, in registry order.
    pub fn get_by_name(&self, name: &str) -> Option<(EntryId, &Entry)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, e)| e.name() == name)
    }

    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id]
    }

    /// The entry, which must be a callable.
    pub fn callable(&self, id: EntryId) -> &CallableEntry {
        match &self.entries[id] {
            Entry::Callable(c) => c,
            Entry::Variable(v) => panic!("entry '{}' is not a callable", v.name),
        }
    }

    pub fn callable_mut(&mut self, id: EntryId) -> &mut CallableEntry {
        match &mut self.entries[id] {
            Entry::Callable(c) => c,
            Entry::Variable(v) => panic!("entry '{}' is not a callable", v.name),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    fn scope_name(&self, scope: Option<EntryId>) -> &str {
        match scope {
            Some(id) => self.entry(id).name(),
            None => "-",
        }
    }
}

impl fmt::Display for IdentifierTable {
    /// Tabular dump used by `nnp-comp --show-ident-table`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<5} {:<5} {:<12} {:<7} {:<12} type", "index", "entry", "name", "addr", "scope")?;
        for (index, entry) in self.entries.iter().enumerate() {
            match entry {
                Entry::Variable(v) => {
                    let mode = match (v.in_status, v.out_status) {
                        (true, true) => " (in out)",
                        (true, false) => " (in)",
                        _ => "",
                    };
                    writeln!(
                        f,
                        "{:<5} {:<5} {:<12} {:<7} {:<12} {}{}",
                        index,
                        "var",
                        v.name,
                        v.address,
                        self.scope_name(Some(v.scope)),
                        v.ty,
                        mode,
                    )?;
                }
                Entry::Callable(c) => {
                    let kind = match c.kind {
                        CallableKind::Procedure => "proc",
                        CallableKind::Function => "func",
                    };
                    let ret = match c.return_type {
                        Some(ty) => ty.to_string(),
                        None => "-".to_string(),
                    };
                    writeln!(
                        f,
                        "{:<5} {:<5} {:<12} {:<7} {:<12} {}",
                        index,
                        kind,
                        c.name,
                        c.address,
                        self.scope_name(c.scope),
                        ret,
                    )?;
                }
            }
        }
        Ok(())
    }
}
