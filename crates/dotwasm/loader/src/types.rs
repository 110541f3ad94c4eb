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

//! Mapping from WASM value kinds to host types

use crate::{LoaderError, LoaderResult};
use dotwasm_reflect::{TypeHandle, TypeKind, TypeRegistry};
use tracing::{debug, error};
use wasmi::core::ValType;

/// Host type names and kinds registered for the numeric WASM value kinds
const NUMERIC_TYPES: [(&str, TypeKind); 4] = [("i32", TypeKind::Int), ("i64", TypeKind::Long), ("f32", TypeKind::Float), ("f64", TypeKind::Double)];

/// Fixed mapping {i32, i64, f32, f64} to host type handles.
///
/// Filled once at loader initialization and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TypeTable {
    i32: TypeHandle,
    i64: TypeHandle,
    f32: TypeHandle,
    f64: TypeHandle,
}

impl TypeTable {
    /// Register the four numeric types in `registry`.
    ///
    /// A type that already exists under the same name and kind is reused. If
    /// any registration fails, the types created by this call are removed again.
    pub fn register(registry: &mut TypeRegistry) -> LoaderResult<Self> {
        let mut created = Vec::with_capacity(NUMERIC_TYPES.len());
        let mut handles = Vec::with_capacity(NUMERIC_TYPES.len());

        for (name, kind) in NUMERIC_TYPES {
            match Self::register_one(registry, name, kind, &mut created) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!("Failed to initialize type {}: {}", name, e);
                    for name in created {
                        registry.remove(name);
                    }
                    return Err(e);
                }
            }
        }

        let mut handles = handles.into_iter();
        match (handles.next(), handles.next(), handles.next(), handles.next()) {
            (Some(i32), Some(i64), Some(f32), Some(f64)) => Ok(Self { i32, i64, f32, f64 }),
            _ => Err(LoaderError::type_init("numeric type table incomplete")),
        }
    }

    fn register_one(registry: &mut TypeRegistry, name: &'static str, kind: TypeKind, created: &mut Vec<&'static str>) -> LoaderResult<TypeHandle> {
        if let Some(existing) = registry.get(name) {
            if existing.kind() != kind {
                return Err(LoaderError::type_init(format!("type {name} already registered as {:?}", existing.kind())));
            }
            debug!("Reusing registered type {}", name);
            return Ok(existing);
        }

        let handle = registry.create_type(kind, name).map_err(|e| LoaderError::type_init(e.to_string()))?;
        created.push(name);
        Ok(handle)
    }

    /// Map a WASM value kind to its host type
    pub fn map_value_kind(&self, kind: ValType) -> LoaderResult<TypeHandle> {
        match kind {
            ValType::I32 => Ok(self.i32.clone()),
            ValType::I64 => Ok(self.i64.clone()),
            ValType::F32 => Ok(self.f32.clone()),
            ValType::F64 => Ok(self.f64.clone()),
            other => Err(LoaderError::UnsupportedType { kind: format!("{other:?}") }),
        }
    }

    /// Names of the registered numeric types
    pub fn names() -> impl Iterator<Item = &'static str> {
        NUMERIC_TYPES.iter().map(|(name, _)| *name)
    }
}
