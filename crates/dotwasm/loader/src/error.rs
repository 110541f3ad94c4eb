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

//! Loader error types

use dotwasm_reflect::ReflectError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Loader error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoaderError {
    #[error("Allocation failed: {message}")]
    Alloc { message: String },

    #[error("Engine initialization failed: {message}")]
    EngineInit { message: String },

    #[error("Type initialization failed: {message}")]
    TypeInit { message: String },

    #[error("Module not found in any search path: {name}")]
    NotFound { name: String },

    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Module too large: {size} bytes exceeds limit of {limit} bytes")]
    ModuleTooLarge { size: u64, limit: u64 },

    #[error("Module compilation failed for {module}: {message}")]
    Compile { module: String, message: String },

    #[error("Module instantiation failed for {module}: {message}")]
    Instantiate { module: String, message: String },

    #[error("Unsupported value type: {kind}")]
    UnsupportedType { kind: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error("Registry operation failed: {message}")]
    Registry { message: String },

    #[error("Not implemented: {operation}")]
    NotImplemented { operation: String },

    #[error("Unknown module handle: {id}")]
    UnknownHandle { id: u64 },

    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl LoaderError {
    /// Create an allocation error
    pub fn alloc(message: impl Into<String>) -> Self {
        Self::Alloc { message: message.into() }
    }

    /// Create an engine initialization error
    pub fn engine_init(message: impl Into<String>) -> Self {
        Self::EngineInit { message: message.into() }
    }

    /// Create a type initialization error
    pub fn type_init(message: impl Into<String>) -> Self {
        Self::TypeInit { message: message.into() }
    }

    /// Create a read error
    pub fn read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Read { path: path.into(), message: message.into() }
    }

    /// Create a compile error
    pub fn compile(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Compile { module: module.into(), message: message.into() }
    }

    /// Create an instantiation error
    pub fn instantiate(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Instantiate { module: module.into(), message: message.into() }
    }

    /// Create an unsupported operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported { message: message.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Whether the error aborts a batch load (as opposed to a startup failure)
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::Alloc { .. } | Self::NotFound { .. } | Self::Read { .. } | Self::ModuleTooLarge { .. } | Self::Compile { .. } | Self::Instantiate { .. } | Self::Unsupported { .. }
        )
    }
}

impl From<ReflectError> for LoaderError {
    fn from(err: ReflectError) -> Self {
        match err {
            ReflectError::NotImplemented { operation } => Self::NotImplemented { operation },
            other => Self::Registry { message: other.to_string() },
        }
    }
}
