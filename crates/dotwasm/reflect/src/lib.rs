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

//! DotWasm Reflection Registry
//!
//! The host-side registry that loaders publish into: named types, function
//! objects with signatures, and scopes that map names to values. Loaders only
//! see the narrow capabilities exposed here ("create a type", "create a
//! function", "define a value in a scope").

pub mod error;
pub mod function;
pub mod scope;
pub mod types;
pub mod value;

pub use error::{ReflectError, ReflectResult};
pub use function::{Function, FunctionInterface, Parameter, RejectCallback, ResolveCallback, Signature};
pub use scope::{Context, Scope};
pub use types::{Type, TypeHandle, TypeKind, TypeRegistry};
pub use value::Value;
