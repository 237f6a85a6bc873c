//! Structural type model
//!
//! A [`Type`] is a flat chain of [`TypeKind`] nodes read left to right:
//! `^i32` is `[Pointer, Atomic("i32")]`, and a function signature is
//! `Function, [VarName, arg...] (Join ...)*, Maps, return`. The empty chain
//! is the null type of statements that produce no value.
//!
//! Equality is structural and ignores parameter names.

mod parse;

pub use parse::{canonical_name, parse_type, parse_type_tokens, GenericResolver, NoGenerics};
pub(crate) use parse::generic_actuals;

use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// One node of a type chain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Named leaf type (`i32`, `node`, `List__i32_`)
    Atomic(String),
    /// `^T`
    Pointer,
    /// `[]T`
    Array,
    /// `[N]T`
    SizedArray(String),
    /// Opens a signature
    Function,
    /// Separates arguments from the return type
    Maps,
    /// Separates two arguments
    Join,
    /// Parameter label, ignored by equality
    VarName(String),
}

/// Type model invariant violation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeModelError {
    #[error("unbalanced function type '{rendered}'")]
    Unbalanced { rendered: String },

    #[error("'{modifier}' has no target in '{rendered}'")]
    DanglingModifier { modifier: String, rendered: String },

    #[error("'{rendered}' is not a function type")]
    NotAFunction { rendered: String },
}

/// Structural type
#[derive(Debug, Clone, Default)]
pub struct Type {
    nodes: Vec<TypeKind>,
}

impl Type {
    /// The null type
    #[inline]
    pub fn null() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Single atomic type
    pub fn atomic(name: impl Into<String>) -> Self {
        Self {
            nodes: vec![TypeKind::Atomic(name.into())],
        }
    }

    pub fn bool() -> Self {
        Self::atomic("bool")
    }

    pub fn void() -> Self {
        Self::atomic("void")
    }

    /// Build a type from raw nodes
    pub fn from_nodes(nodes: Vec<TypeKind>) -> Self {
        Self { nodes }
    }

    /// `^self`
    pub fn pointer_to(self) -> Self {
        let mut nodes = Vec::with_capacity(self.nodes.len() + 1);
        nodes.push(TypeKind::Pointer);
        nodes.extend(self.nodes);
        Self { nodes }
    }

    /// Function type from named arguments and a return type
    pub fn function(
        args: &[(String, Type)],
        ret: Type,
    ) -> Self {
        let mut out = Type::null();
        out.append(TypeKind::Function);
        for (i, (name, ty)) in args.iter().enumerate() {
            if i > 0 {
                out.append(TypeKind::Join);
            }
            if !name.is_empty() {
                out.append(TypeKind::VarName(name.clone()));
            }
            out.extend(ty);
        }
        out.append(TypeKind::Maps);
        out.extend(&ret);
        out
    }

    /// Grow the chain by one node
    #[inline]
    pub fn append(
        &mut self,
        kind: TypeKind,
    ) {
        self.nodes.push(kind);
    }

    /// Append every node of another chain
    pub fn extend(
        &mut self,
        other: &Type,
    ) {
        self.nodes.extend(other.nodes.iter().cloned());
    }

    #[inline]
    pub fn nodes(&self) -> &[TypeKind] {
        &self.nodes
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn is_pointer(&self) -> bool {
        matches!(self.nodes.first(), Some(TypeKind::Pointer))
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self.nodes.first(), Some(TypeKind::Function))
    }

    /// Pointer, array or sized array at the head
    pub fn is_indirect(&self) -> bool {
        matches!(
            self.nodes.first(),
            Some(TypeKind::Pointer | TypeKind::Array | TypeKind::SizedArray(_))
        )
    }

    /// Name of a lone atomic type
    pub fn atomic_name(&self) -> Option<&str> {
        match self.nodes.as_slice() {
            [TypeKind::Atomic(name)] => Some(name),
            _ => None,
        }
    }

    /// Whether this is exactly the named atomic type
    pub fn is_atomic(
        &self,
        name: &str,
    ) -> bool {
        self.atomic_name() == Some(name)
    }

    /// Drop one level of pointer or array
    pub fn pointee(&self) -> Option<Type> {
        if self.is_indirect() {
            Some(Type {
                nodes: self.nodes[1..].to_vec(),
            })
        } else {
            None
        }
    }

    /// Same chain without parameter labels
    pub fn without_names(&self) -> Type {
        Type {
            nodes: self
                .nodes
                .iter()
                .filter(|n| !matches!(n, TypeKind::VarName(_)))
                .cloned()
                .collect(),
        }
    }

    fn significant(&self) -> impl Iterator<Item = &TypeKind> {
        self.nodes
            .iter()
            .filter(|n| !matches!(n, TypeKind::VarName(_)))
    }

    /// Index of the `Maps` balancing the `Function` at `open`
    fn matching_maps(
        &self,
        open: usize,
    ) -> Result<usize, TypeModelError> {
        let mut depth = 0usize;
        for (i, node) in self.nodes.iter().enumerate().skip(open) {
            match node {
                TypeKind::Function => depth += 1,
                TypeKind::Maps => {
                    depth = depth.checked_sub(1).ok_or_else(|| self.unbalanced())?;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                _ => {}
            }
        }
        Err(self.unbalanced())
    }

    fn unbalanced(&self) -> TypeModelError {
        TypeModelError::Unbalanced {
            rendered: self.to_string(),
        }
    }

    /// Payload of a depth-0 `Function … Maps` wrapper, or the type itself
    pub fn get_return_type(&self) -> Result<Type, TypeModelError> {
        if !self.is_function() {
            return Ok(self.clone());
        }
        let maps = self.matching_maps(0)?;
        Ok(Type {
            nodes: self.nodes[maps + 1..].to_vec(),
        })
    }

    /// Split a (possibly pointed-to) function type into named arguments
    pub fn get_arguments(&self) -> Result<Vec<(String, Type)>, TypeModelError> {
        let start = self
            .nodes
            .iter()
            .position(|n| !matches!(n, TypeKind::Pointer))
            .unwrap_or(self.nodes.len());
        if !matches!(self.nodes.get(start), Some(TypeKind::Function)) {
            return Err(TypeModelError::NotAFunction {
                rendered: self.to_string(),
            });
        }
        let maps = self.matching_maps(start)?;

        let mut args = Vec::new();
        let mut name = String::new();
        let mut current = Type::null();
        let mut depth = 0usize;
        for node in &self.nodes[start + 1..maps] {
            match node {
                TypeKind::Join if depth == 0 => {
                    current.check_arg()?;
                    args.push((std::mem::take(&mut name), std::mem::take(&mut current)));
                }
                TypeKind::VarName(label) if depth == 0 && current.is_null() => {
                    name = label.clone();
                }
                other => {
                    match other {
                        TypeKind::Function => depth += 1,
                        TypeKind::Maps => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    current.append(other.clone());
                }
            }
        }
        if !current.is_null() {
            current.check_arg()?;
            args.push((name, current));
        } else if !args.is_empty() || !name.is_empty() {
            return Err(self.unbalanced());
        }
        Ok(args)
    }

    fn check_arg(&self) -> Result<(), TypeModelError> {
        if self.is_null() {
            return Err(self.unbalanced());
        }
        self.validate()
    }

    /// Check the chain invariants
    pub fn validate(&self) -> Result<(), TypeModelError> {
        let mut depth = 0usize;
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TypeKind::Function => depth += 1,
                TypeKind::Maps => {
                    depth = depth.checked_sub(1).ok_or_else(|| self.unbalanced())?;
                }
                TypeKind::Pointer | TypeKind::Array | TypeKind::SizedArray(_) => {
                    let target = self.nodes.get(i + 1);
                    if matches!(target, None | Some(TypeKind::Maps | TypeKind::Join)) {
                        return Err(TypeModelError::DanglingModifier {
                            modifier: render_node(node),
                            rendered: self.to_string(),
                        });
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(self.unbalanced());
        }
        Ok(())
    }

    /// Identifier-safe encoding used for symbol names
    pub fn mangled(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for node in &self.nodes {
            match node {
                TypeKind::Atomic(name) => parts.push(name.clone()),
                TypeKind::Pointer => parts.push("PTR".into()),
                TypeKind::Array => parts.push("ARR".into()),
                TypeKind::SizedArray(n) => parts.push(format!("SARR_{}", n)),
                TypeKind::Function => parts.push("FN".into()),
                TypeKind::Maps => parts.push("MAPS".into()),
                TypeKind::Join => parts.push("JOIN".into()),
                TypeKind::VarName(_) => {}
            }
        }
        parts.join("_")
    }
}

fn render_node(node: &TypeKind) -> String {
    match node {
        TypeKind::Atomic(name) => name.clone(),
        TypeKind::Pointer => "^".into(),
        TypeKind::Array => "[]".into(),
        TypeKind::SizedArray(n) => format!("[{}]", n),
        TypeKind::Function => "(".into(),
        TypeKind::Maps => ") -> ".into(),
        TypeKind::Join => ", ".into(),
        TypeKind::VarName(name) => format!("{}: ", name),
    }
}

impl fmt::Display for Type {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.nodes.is_empty() {
            return write!(f, "NULL");
        }
        for node in &self.nodes {
            write!(f, "{}", render_node(node))?;
        }
        Ok(())
    }
}

impl PartialEq for Type {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.significant().eq(other.significant())
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        for node in self.significant() {
            node.hash(state);
        }
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
