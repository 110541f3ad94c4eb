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

//! Function objects and signatures

use crate::{ReflectError, ReflectResult, TypeHandle, Value};
use std::fmt;

/// Called with the settled value of an asynchronous call
pub type ResolveCallback = Box<dyn FnOnce(Value) -> Value + Send>;

/// Called with the error value of a failed asynchronous call
pub type RejectCallback = Box<dyn FnOnce(Value) -> Value + Send>;

/// A single typed parameter slot
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Parameter name, empty when the source carries none
    pub name: String,
    /// Parameter type
    pub ty: TypeHandle,
}

/// Function signature with a fixed arity
#[derive(Debug, Clone)]
pub struct Signature {
    params: Vec<Option<Parameter>>,
    ret: Option<TypeHandle>,
}

impl Signature {
    /// Create a signature with `arity` unset parameter slots and no return type
    pub fn new(arity: usize) -> Self {
        Self { params: vec![None; arity], ret: None }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn set_return(&mut self, ty: TypeHandle) {
        self.ret = Some(ty);
    }

    pub fn return_type(&self) -> Option<&TypeHandle> {
        self.ret.as_ref()
    }

    /// Set the parameter at `index`
    pub fn set(&mut self, index: usize, name: impl Into<String>, ty: TypeHandle) -> ReflectResult<()> {
        let arity = self.params.len();
        let slot = self.params.get_mut(index).ok_or(ReflectError::ParameterOutOfRange { index, arity })?;
        *slot = Some(Parameter { name: name.into(), ty });
        Ok(())
    }

    pub fn parameter(&self, index: usize) -> Option<&Parameter> {
        self.params.get(index).and_then(Option::as_ref)
    }

    /// Iterate over parameter slots in declared order
    pub fn parameters(&self) -> impl Iterator<Item = Option<&Parameter>> {
        self.params.iter().map(Option::as_ref)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            match param {
                Some(param) => f.write_str(param.ty.name())?,
                None => f.write_str("?")?,
            }
        }
        f.write_str(")")?;
        if let Some(ret) = &self.ret {
            write!(f, " -> {}", ret.name())?;
        }
        Ok(())
    }
}

/// Implementation behind a host function object.
///
/// The four methods mirror the host's function vtable. Implementations that
/// cannot execute calls must return [`ReflectError::NotImplemented`] from
/// `invoke`/`await_call` instead of fabricating a value.
pub trait FunctionInterface: Send + Sync {
    /// Called once when the owning function object is created
    fn create(&mut self, _name: &str, _signature: &Signature) -> ReflectResult<()> {
        Ok(())
    }

    fn invoke(&self, function: &Function, args: &[Value]) -> ReflectResult<Value>;

    fn await_call(&self, function: &Function, args: &[Value], resolve: ResolveCallback, reject: RejectCallback) -> ReflectResult<Value>;

    /// Called once when the owning function object is dropped
    fn destroy(&mut self) {}
}

/// A named host function object
pub struct Function {
    name: String,
    signature: Signature,
    implementation: Box<dyn FunctionInterface>,
}

impl Function {
    /// Create a function with `arity` parameters backed by `implementation`
    pub fn create(name: impl Into<String>, arity: usize, mut implementation: Box<dyn FunctionInterface>) -> ReflectResult<Self> {
        let name = name.into();
        let signature = Signature::new(arity);
        implementation.create(&name, &signature)?;

        Ok(Self { name, signature, implementation })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn signature_mut(&mut self) -> &mut Signature {
        &mut self.signature
    }

    /// Invoke the function synchronously
    pub fn invoke(&self, args: &[Value]) -> ReflectResult<Value> {
        self.check_arity(args)?;
        self.implementation.invoke(self, args)
    }

    /// Invoke the function asynchronously
    pub fn await_call(&self, args: &[Value], resolve: ResolveCallback, reject: RejectCallback) -> ReflectResult<Value> {
        self.check_arity(args)?;
        self.implementation.await_call(self, args, resolve, reject)
    }

    fn check_arity(&self, args: &[Value]) -> ReflectResult<()> {
        if args.len() != self.signature.arity() {
            return Err(ReflectError::invocation(format!("{} expects {} arguments, got {}", self.name, self.signature.arity(), args.len())));
        }
        Ok(())
    }
}

impl Drop for Function {
    fn drop(&mut self) {
        self.implementation.destroy();
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("name", &self.name).field("signature", &self.signature).field("implementation", &"<dyn FunctionInterface>").finish()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TypeKind, TypeRegistry};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo {
        destroyed: Arc<AtomicUsize>,
    }

    impl FunctionInterface for Echo {
        fn invoke(&self, _function: &Function, args: &[Value]) -> ReflectResult<Value> {
            Ok(args.first().cloned().unwrap_or(Value::Null))
        }

        fn await_call(&self, _function: &Function, args: &[Value], resolve: ResolveCallback, _reject: RejectCallback) -> ReflectResult<Value> {
            Ok(resolve(args.first().cloned().unwrap_or(Value::Null)))
        }

        fn destroy(&mut self) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn echo(arity: usize) -> (Function, Arc<AtomicUsize>) {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let function = Function::create("echo", arity, Box::new(Echo { destroyed: Arc::clone(&destroyed) })).unwrap();
        (function, destroyed)
    }

    #[test]
    fn test_signature_slots() {
        let mut registry = TypeRegistry::new();
        let int = registry.create_type(TypeKind::Int, "i32").unwrap();
        let mut signature = Signature::new(2);

        assert!(signature.parameter(0).is_none());
        signature.set(1, "", Arc::clone(&int)).unwrap();
        assert!(Arc::ptr_eq(&signature.parameter(1).unwrap().ty, &int));

        let err = signature.set(2, "", int).unwrap_err();
        assert_eq!(err, ReflectError::ParameterOutOfRange { index: 2, arity: 2 });
    }

    #[test]
    fn test_signature_display() {
        let mut registry = TypeRegistry::new();
        let int = registry.create_type(TypeKind::Int, "i32").unwrap();
        let double = registry.create_type(TypeKind::Double, "f64").unwrap();

        let mut signature = Signature::new(2);
        signature.set(0, "", int).unwrap();
        assert_eq!(signature.to_string(), "(i32, ?)");

        signature.set_return(double);
        assert_eq!(signature.to_string(), "(i32, ?) -> f64");
    }

    #[test]
    fn test_invoke_checks_arity() {
        let (function, _) = echo(1);

        assert_eq!(function.invoke(&[Value::Int(7)]).unwrap(), Value::Int(7));
        assert!(matches!(function.invoke(&[]), Err(ReflectError::Invocation { .. })));
    }

    #[test]
    fn test_await_resolves() {
        let (function, _) = echo(1);
        let result = function.await_call(&[Value::Long(3)], Box::new(|value| value), Box::new(|_| Value::Null));
        assert_eq!(result.unwrap(), Value::Long(3));
    }

    #[test]
    fn test_drop_destroys_implementation_once() {
        let (function, destroyed) = echo(0);
        assert_eq!(destroyed.load(Ordering::SeqCst), 0);

        drop(function);
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }
}
