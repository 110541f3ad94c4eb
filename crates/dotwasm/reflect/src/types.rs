// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Host type registry

use crate::{ReflectError, ReflectResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Shared handle to a registered type. Two handles denote the same type only
/// when they point at the same allocation (`Arc::ptr_eq`).
pub type TypeHandle = Arc<Type>;

/// Primitive kinds understood by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Bool,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Buffer,
    Function,
    Null,
}

/// A named host type
#[derive(Debug, PartialEq, Eq)]
pub struct Type {
    /// Primitive kind backing the type
    kind: TypeKind,
    /// Registered name
    name: String,
}

impl Type {
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Registry of named types, queryable by name after creation
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeHandle>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a type. Names are unique within the registry.
    pub fn create_type(&mut self, kind: TypeKind, name: impl Into<String>) -> ReflectResult<TypeHandle> {
        let name = name.into();
        if self.types.contains_key(&name) {
            return Err(ReflectError::DuplicateType { name });
        }

        let handle = Arc::new(Type { kind, name: name.clone() });
        self.types.insert(name, Arc::clone(&handle));
        debug!("Registered type {} ({:?})", handle.name, kind);

        Ok(handle)
    }

    /// Look up a type by name
    pub fn get(&self, name: &str) -> Option<TypeHandle> {
        self.types.get(name).cloned()
    }

    /// Remove a type from the registry. Outstanding handles stay valid.
    pub fn remove(&mut self, name: &str) -> Option<TypeHandle> {
        self.types.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
