//! Symbol table with overload sets
//!
//! Each name maps to an ordered list of [`Candidate`]s. Several candidates
//! under one name are overloads; resolution picks among them by argument
//! types. Candidates are never removed by `erase!`, only hidden.

mod structs;

pub use structs::{StructData, StructTable};

use crate::frontend::sequence::Sequence;
use crate::frontend::types::Type;
use indexmap::IndexMap;
use serde::Serialize;

/// Body attached to a candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Body {
    /// Declared only (argument, variable or prototype)
    None,
    /// Translated Oak body
    Sequence(Sequence),
    /// C definition emitted verbatim when referenced
    Builtin(String),
}

impl Body {
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Body::None)
    }
}

/// One overload of a named symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub ty: Type,
    pub body: Body,
    pub erased: bool,
}

impl Candidate {
    pub fn new(
        ty: Type,
        body: Body,
    ) -> Self {
        Self {
            ty,
            body,
            erased: false,
        }
    }
}

/// Name → overload set
#[derive(Debug, Clone, Default, Serialize)]
pub struct SymbolTable {
    entries: IndexMap<String, Vec<Candidate>>,
}

/// Saved table state taken on scope entry
#[derive(Debug, Clone)]
pub struct Snapshot(SymbolTable);

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate, returning its index in the overload set
    pub fn declare(
        &mut self,
        name: &str,
        ty: Type,
        body: Body,
    ) -> usize {
        let set = self.entries.entry(name.to_string()).or_default();
        set.push(Candidate::new(ty, body));
        set.len() - 1
    }

    /// Every candidate under a name, erased ones included
    pub fn candidates(
        &self,
        name: &str,
    ) -> &[Candidate] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn candidate_mut(
        &mut self,
        name: &str,
        index: usize,
    ) -> Option<&mut Candidate> {
        self.entries.get_mut(name)?.get_mut(index)
    }

    /// Candidates still visible to resolution
    pub fn visible<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a Candidate> + 'a {
        self.candidates(name).iter().filter(|c| !c.erased)
    }

    /// Most recently added visible candidate
    pub fn latest(
        &self,
        name: &str,
    ) -> Option<&Candidate> {
        self.visible(name).last()
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.entries.get(name).is_some_and(|set| !set.is_empty())
    }

    /// Index of a visible candidate with exactly this type
    pub fn find_exact(
        &self,
        name: &str,
        ty: &Type,
    ) -> Option<usize> {
        self.candidates(name)
            .iter()
            .position(|c| !c.erased && &c.ty == ty)
    }

    /// Whether a visible overload with this type exists
    pub fn has_overload(
        &self,
        name: &str,
        ty: &Type,
    ) -> bool {
        self.find_exact(name, ty).is_some()
    }

    /// Hide every candidate under a name; false when there were none
    pub fn erase(
        &mut self,
        name: &str,
    ) -> bool {
        match self.entries.get_mut(name) {
            Some(set) if !set.is_empty() => {
                for candidate in set.iter_mut() {
                    candidate.erased = true;
                }
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Candidate>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Save the current state before entering a scope
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.clone())
    }

    /// Leave a scope
    ///
    /// Function candidates survive. Any other candidate survives only when
    /// the snapshot holds a not-yet-matched candidate of the same name with an
    /// identical type; the rest are dropped. Dropped bindings that need a
    /// destructor yield one `Del` call each, latest declaration first.
    pub fn restore(
        &mut self,
        snapshot: Snapshot,
        needs_destructor: impl Fn(&Type) -> bool,
    ) -> Vec<String> {
        let before = snapshot.0;
        let mut teardown = Vec::new();

        for (name, set) in self.entries.iter_mut() {
            let old = before.candidates(name);
            let mut used = vec![false; old.len()];

            set.retain(|candidate| {
                if candidate.ty.is_function() {
                    return true;
                }
                let matched = old
                    .iter()
                    .enumerate()
                    .find(|(i, c)| !used[*i] && c.ty == candidate.ty)
                    .map(|(i, _)| i);
                if let Some(i) = matched {
                    used[i] = true;
                    return true;
                }
                if !name.is_empty() && needs_destructor(&candidate.ty) {
                    teardown.push(destructor_call(name, &candidate.ty));
                }
                false
            });
        }
        self.entries.retain(|_, set| !set.is_empty());

        teardown.reverse();
        teardown
    }
}

/// Signature of `New`/`Del` for a type: `(what: ^T) -> void`
pub fn lifecycle_signature(ty: &Type) -> Type {
    Type::function(&[("what".to_string(), ty.clone().pointer_to())], Type::void())
}

/// C name of an overload: `name_<mangled type>`, `main` stays as is
pub fn mangle_symbol(
    name: &str,
    ty: &Type,
) -> String {
    if name == "main" {
        return name.to_string();
    }
    format!("{}_{}", name, ty.mangled())
}

/// `Del_FN_PTR_<T>_MAPS_void(&name);`
pub fn destructor_call(
    name: &str,
    ty: &Type,
) -> String {
    format!(
        "{}(&{});",
        mangle_symbol("Del", &lifecycle_signature(ty)),
        name
    )
}

#[cfg(test)]
mod tests;
