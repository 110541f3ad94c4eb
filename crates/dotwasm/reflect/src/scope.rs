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

//! Scopes and contexts

use crate::{Function, ReflectError, ReflectResult, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A named collection of values, ordered by name
#[derive(Debug, Default)]
pub struct Scope {
    name: String,
    values: BTreeMap<String, Value>,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), values: BTreeMap::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Define `name` in the scope. Redefinition is an error.
    pub fn define(&mut self, name: impl Into<String>, value: Value) -> ReflectResult<()> {
        let name = name.into();
        if self.values.contains_key(&name) {
            return Err(ReflectError::AlreadyDefined { scope: self.name.clone(), name });
        }

        debug!("Defined {} in scope {}", name, self.name);
        self.values.insert(name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Look up a function value by name
    pub fn function(&self, name: &str) -> Option<&Arc<Function>> {
        self.get(name).and_then(Value::as_function)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Arc<Function>> {
        self.values.values().filter_map(Value::as_function)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Evaluation context owning the scope that loaders discover into
#[derive(Debug)]
pub struct Context {
    scope: Scope,
}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        Self { scope: Scope::new(name) }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }
}
