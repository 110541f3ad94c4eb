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

//! Module handles: the unit of load/unload

use crate::{EngineContext, LoaderError, LoaderResult};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error};
use wasmi::{Extern, ExternType, Instance, Linker, Module, Store};

/// Opaque identifier of a module handle owned by a loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandleId(pub(crate) u64);

impl HandleId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a module handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Created, no module added yet
    Empty,
    /// Modules are being compiled and instantiated
    Populating,
    /// Every requested module is loaded
    Ready,
    /// Torn down; holds no modules
    Destroyed,
}

/// An export of a loaded module: its static type paired with its runtime value
#[derive(Debug, Clone)]
pub struct ResolvedExport {
    name: String,
    ty: ExternType,
    value: Extern,
}

impl ResolvedExport {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &ExternType {
        &self.ty
    }

    pub fn value(&self) -> Extern {
        self.value
    }

    /// Short name of the export kind, used in logs
    pub fn kind_name(&self) -> &'static str {
        match self.ty {
            ExternType::Func(_) => "function",
            ExternType::Global(_) => "global",
            ExternType::Memory(_) => "memory",
            ExternType::Table(_) => "table",
        }
    }
}

/// Decrements the loader's live module count when a module is released
#[derive(Debug)]
struct LiveModule(Arc<AtomicUsize>);

impl LiveModule {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LiveModule {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A compiled module, its instance and its resolved exports.
///
/// Fields drop in declaration order: liveness token, exports, instance, module.
/// The instance data itself lives in the owning handle's store.
#[derive(Debug)]
pub struct LoadedModule {
    /// Bindings hold a weak reference; it dies with the module
    liveness: Arc<()>,
    /// Exports in module declaration order
    exports: Vec<ResolvedExport>,
    instance: Instance,
    module: Module,
    name: String,
    _live: LiveModule,
}

impl LoadedModule {
    /// Compile `bytes`, reject modules with imports, instantiate with the empty linker
    /// and pair each export type with its runtime value.
    fn load(context: &EngineContext, linker: &Linker<()>, store: &mut Store<()>, name: &str, bytes: &[u8]) -> LoaderResult<Self> {
        let module = Module::new(context.engine(), bytes).map_err(|e| LoaderError::compile(name, e.to_string()))?;

        let imports: Vec<String> = module.imports().map(|import| format!("{}::{}", import.module(), import.name())).collect();
        if !imports.is_empty() {
            return Err(LoaderError::unsupported(format!("module {name} requires imports ({}); import linking is not supported", imports.join(", "))));
        }

        let live = LiveModule::acquire(context.live_modules());
        let pre = linker.instantiate(&mut *store, &module).map_err(|e| LoaderError::instantiate(name, e.to_string()))?;
        let instance = pre.start(&mut *store).map_err(|e| LoaderError::instantiate(name, e.to_string()))?;

        let mut exports = Vec::new();
        for export_type in module.exports() {
            let export_name = export_type.name();
            let value = instance
                .get_export(&*store, export_name)
                .ok_or_else(|| LoaderError::instantiate(name, format!("export {export_name} missing from instance")))?;
            exports.push(ResolvedExport { name: export_name.to_string(), ty: export_type.ty().clone(), value });
        }

        Ok(Self { liveness: Arc::new(()), exports, instance, module, name: name.to_string(), _live: live })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn instance(&self) -> Instance {
        self.instance
    }

    pub fn exports(&self) -> &[ResolvedExport] {
        &self.exports
    }

    pub(crate) fn liveness(&self) -> &Arc<()> {
        &self.liveness
    }
}

/// One or more modules loaded together, loaded and unloaded as a unit.
///
/// The handle owns the store its modules are instantiated in; dropping or
/// clearing it frees their instance data and linear memories.
pub struct ModuleHandle {
    id: HandleId,
    state: HandleState,
    /// Released before the store they were instantiated in
    modules: Vec<LoadedModule>,
    /// Linker with no definitions
    linker: Linker<()>,
    store: Store<()>,
}

impl ModuleHandle {
    /// Create an empty handle with room for `expected_count` modules and a fresh store
    pub fn create(id: HandleId, expected_count: usize, context: &EngineContext) -> LoaderResult<Self> {
        let mut modules = Vec::new();
        modules.try_reserve_exact(expected_count).map_err(|e| {
            error!("Failed to allocate memory for {} modules: {}", expected_count, e);
            LoaderError::alloc(format!("handle {id} with {expected_count} modules: {e}"))
        })?;

        let store = context.new_store()?;
        let linker = Linker::new(context.engine());

        Ok(Self { id, state: HandleState::Empty, modules, linker, store })
    }

    /// Compile and instantiate `bytes` into this handle.
    ///
    /// Any load failure tears down the whole handle, including modules added by
    /// earlier calls. A handle that is already `Ready` or `Destroyed` refuses
    /// new modules and is left untouched.
    pub fn add_module(&mut self, context: &EngineContext, name: &str, bytes: &[u8]) -> LoaderResult<()> {
        if !matches!(self.state, HandleState::Empty | HandleState::Populating) {
            return Err(LoaderError::unsupported(format!("adding module {name} to {:?} handle {}", self.state, self.id)));
        }
        self.state = HandleState::Populating;

        let loaded = match self.modules.try_reserve(1) {
            Ok(()) => LoadedModule::load(context, &self.linker, &mut self.store, name, bytes),
            Err(e) => Err(LoaderError::alloc(e.to_string())),
        };

        match loaded {
            Ok(module) => {
                debug!("Loaded module {} into handle {} ({} exports)", name, self.id, module.exports.len());
                self.modules.push(module);
                Ok(())
            }
            Err(e) => {
                error!("Failed to load module {}: {}", name, e);
                self.clear();
                Err(e)
            }
        }
    }

    /// Mark the handle fully populated
    pub fn finish(&mut self) {
        self.state = HandleState::Ready;
    }

    /// Release every module, then replace the store so its instances are freed
    pub fn clear(&mut self) {
        self.release_modules();
        self.store = Store::new(self.store.engine(), ());
        self.state = HandleState::Destroyed;
    }

    fn release_modules(&mut self) {
        while let Some(module) = self.modules.pop() {
            debug!("Releasing module {} from handle {}", module.name, self.id);
            drop(module);
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    /// Modules in load order
    pub fn modules(&self) -> &[LoadedModule] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Drop for ModuleHandle {
    fn drop(&mut self) {
        // The store goes with the handle
        self.release_modules();
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle").field("id", &self.id).field("state", &self.state).field("modules", &self.modules).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoaderConfig;
    use wasm_encoder::{CodeSection, EntityType, ExportKind, ExportSection, Function, FunctionSection, ImportSection, Instruction, TypeSection};

    fn context() -> EngineContext {
        EngineContext::new(&LoaderConfig::default()).unwrap()
    }

    fn single_export(name: &str) -> Vec<u8> {
        let mut module = wasm_encoder::Module::new();
        let mut types = TypeSection::new();
        types.ty().function(vec![], vec![]);
        let mut functions = FunctionSection::new();
        functions.function(0);
        let mut exports = ExportSection::new();
        exports.export(name, ExportKind::Func, 0);
        let mut code = CodeSection::new();
        let mut body = Function::new(vec![]);
        body.instruction(&Instruction::End);
        code.function(&body);

        module.section(&types);
        module.section(&functions);
        module.section(&exports);
        module.section(&code);
        module.finish()
    }

    fn with_import() -> Vec<u8> {
        let mut module = wasm_encoder::Module::new();
        let mut types = TypeSection::new();
        types.ty().function(vec![], vec![]);
        let mut imports = ImportSection::new();
        imports.import("env", "host", EntityType::Function(0));

        module.section(&types);
        module.section(&imports);
        module.finish()
    }

    #[test]
    fn test_create_reserve_failure() {
        let err = ModuleHandle::create(HandleId(1), usize::MAX, &context()).unwrap_err();
        assert!(matches!(err, LoaderError::Alloc { .. }));
    }

    #[test]
    fn test_populate_then_ready() {
        let context = context();
        let mut handle = ModuleHandle::create(HandleId(1), 2, &context).unwrap();
        assert_eq!(handle.state(), HandleState::Empty);

        handle.add_module(&context, "a", &single_export("a")).unwrap();
        assert_eq!(handle.state(), HandleState::Populating);
        handle.add_module(&context, "b", &single_export("b")).unwrap();
        handle.finish();

        assert_eq!(handle.state(), HandleState::Ready);
        let names: Vec<&str> = handle.modules().iter().map(LoadedModule::name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(handle.modules()[0].exports()[0].name(), "a");
        assert_eq!(handle.modules()[0].exports()[0].kind_name(), "function");
        assert_eq!(context.live_module_count(), 2);
    }

    #[test]
    fn test_compile_failure_tears_down_handle() {
        let context = context();
        let mut handle = ModuleHandle::create(HandleId(1), 2, &context).unwrap();
        handle.add_module(&context, "good", &single_export("f")).unwrap();

        let err = handle.add_module(&context, "bad", b"\0asm\x01\0\0\0\xff").unwrap_err();
        assert!(matches!(err, LoaderError::Compile { .. }));
        assert_eq!(handle.state(), HandleState::Destroyed);
        assert!(handle.is_empty());
        assert_eq!(context.live_module_count(), 0);
    }

    #[test]
    fn test_imports_rejected() {
        let context = context();
        let mut handle = ModuleHandle::create(HandleId(1), 1, &context).unwrap();

        let err = handle.add_module(&context, "needs-env", &with_import()).unwrap_err();
        match err {
            LoaderError::Unsupported { message } => assert!(message.contains("env::host")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(handle.state(), HandleState::Destroyed);
    }

    #[test]
    fn test_drop_releases_modules() {
        let context = context();
        {
            let mut handle = ModuleHandle::create(HandleId(1), 1, &context).unwrap();
            handle.add_module(&context, "a", &single_export("a")).unwrap();
            handle.finish();
            assert_eq!(context.live_module_count(), 1);
        }
        assert_eq!(context.live_module_count(), 0);
    }

    #[test]
    fn test_finished_handle_refuses_modules() {
        let context = context();
        let mut handle = ModuleHandle::create(HandleId(1), 1, &context).unwrap();
        handle.add_module(&context, "a", &single_export("a")).unwrap();
        handle.finish();

        let err = handle.add_module(&context, "late", &single_export("late")).unwrap_err();
        assert!(matches!(err, LoaderError::Unsupported { .. }));
        assert_eq!(handle.state(), HandleState::Ready);
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn test_destroyed_handle_refuses_modules() {
        let context = context();
        let mut handle = ModuleHandle::create(HandleId(1), 1, &context).unwrap();
        handle.clear();

        let err = handle.add_module(&context, "a", &single_export("a")).unwrap_err();
        assert!(matches!(err, LoaderError::Unsupported { .. }));
        assert_eq!(handle.state(), HandleState::Destroyed);
        assert_eq!(context.live_module_count(), 0);
    }
}
