//! Struct table

use crate::frontend::types::Type;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

/// Members of one struct, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructData {
    pub members: IndexMap<String, Type>,
    pub erased: bool,
}

impl StructData {
    pub fn member(
        &self,
        name: &str,
    ) -> Option<&Type> {
        self.members.get(name)
    }
}

/// Struct name → layout, in definition order
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructTable {
    structs: IndexMap<String, StructData>,
}

impl StructTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a struct; a redefinition replaces the old layout with a warning
    pub fn define(
        &mut self,
        name: &str,
        data: StructData,
    ) {
        if let Some(old) = self.structs.get_mut(name) {
            if !old.members.is_empty() {
                warn!("redefinition of struct '{}'", name);
            }
            *old = data;
        } else {
            self.structs.insert(name.to_string(), data);
        }
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&StructData> {
        self.structs.get(name)
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.structs.contains_key(name)
    }

    /// Hide a struct from member access; false when unknown
    pub fn erase(
        &mut self,
        name: &str,
    ) -> bool {
        match self.structs.get_mut(name) {
            Some(data) => {
                data.erased = true;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StructData)> {
        self.structs.iter()
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }
}
