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

//! Reflection registry error types

use thiserror::Error;

/// Result type for registry operations
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Errors raised by the reflection registry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReflectError {
    #[error("Type already registered: {name}")]
    DuplicateType { name: String },

    #[error("Parameter index {index} out of range for arity {arity}")]
    ParameterOutOfRange { index: usize, arity: usize },

    #[error("Name already defined in scope {scope}: {name}")]
    AlreadyDefined { scope: String, name: String },

    #[error("Operation not implemented: {operation}")]
    NotImplemented { operation: String },

    #[error("Invocation failed: {message}")]
    Invocation { message: String },
}

impl ReflectError {
    /// Create a not implemented error
    pub fn not_implemented(operation: impl Into<String>) -> Self {
        Self::NotImplemented { operation: operation.into() }
    }

    /// Create an invocation error
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::Invocation { message: message.into() }
    }

    /// Check whether the error marks a missing capability rather than a fault
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }
}
