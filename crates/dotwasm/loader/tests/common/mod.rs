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

//! Shared fixtures: small WASM modules built with wasm-encoder

#![allow(dead_code)]

use dotwasm_loader::{LoaderConfig, WasmLoader};
use dotwasm_reflect::TypeRegistry;
use std::path::{Path, PathBuf};
use wasm_encoder::{
    CodeSection, ConstExpr, EntityType, ExportKind, ExportSection, Function, FunctionSection, GlobalSection, GlobalType, ImportSection, Instruction, MemorySection, MemoryType, Module,
    StartSection, TypeSection, ValType,
};

enum Body {
    Zeroes,
    AddI32,
    Unreachable,
    Nop,
    IllTyped,
}

enum Target {
    Func(u32),
    Memory(u32),
    Global(u32),
}

/// Builds a module with one type entry per function
#[derive(Default)]
pub struct ModuleBuilder {
    types: Vec<(Vec<ValType>, Vec<ValType>)>,
    imports: Vec<(String, String, u32)>,
    functions: Vec<(u32, Body)>,
    exports: Vec<(String, Target)>,
    memories: Vec<u64>,
    globals: Vec<i32>,
    start: Option<u32>,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_type(&mut self, params: &[ValType], results: &[ValType]) -> u32 {
        self.types.push((params.to_vec(), results.to_vec()));
        self.types.len() as u32 - 1
    }

    fn push_function(&mut self, params: &[ValType], results: &[ValType], body: Body) -> u32 {
        let ty = self.push_type(params, results);
        self.functions.push((ty, body));
        self.functions.len() as u32 - 1
    }

    /// Exported function returning zero for every result
    pub fn func(mut self, name: &str, params: &[ValType], results: &[ValType]) -> Self {
        let index = self.push_function(params, results, Body::Zeroes);
        self.exports.push((name.to_string(), Target::Func(index)));
        self
    }

    /// Exported `(i32, i32) -> i32` addition
    pub fn add_i32(mut self, name: &str) -> Self {
        let index = self.push_function(&[ValType::I32, ValType::I32], &[ValType::I32], Body::AddI32);
        self.exports.push((name.to_string(), Target::Func(index)));
        self
    }

    /// Start function that traps during instantiation
    pub fn trapping_start(mut self) -> Self {
        let index = self.push_function(&[], &[], Body::Unreachable);
        self.start = Some(index);
        self
    }

    /// Start function that returns without doing anything
    pub fn nop_start(mut self) -> Self {
        let index = self.push_function(&[], &[], Body::Nop);
        self.start = Some(index);
        self
    }

    /// Exported `() -> i32` whose body pushes an i64
    pub fn ill_typed(mut self, name: &str) -> Self {
        let index = self.push_function(&[], &[ValType::I32], Body::IllTyped);
        self.exports.push((name.to_string(), Target::Func(index)));
        self
    }

    pub fn import_func(mut self, module: &str, name: &str) -> Self {
        let ty = self.push_type(&[], &[]);
        self.imports.push((module.to_string(), name.to_string(), ty));
        self
    }

    pub fn memory(self, name: &str) -> Self {
        self.memory_pages(name, 1)
    }

    /// Exported memory with `pages` 64 KiB pages
    pub fn memory_pages(mut self, name: &str, pages: u64) -> Self {
        self.exports.push((name.to_string(), Target::Memory(self.memories.len() as u32)));
        self.memories.push(pages);
        self
    }

    pub fn global(mut self, name: &str, value: i32) -> Self {
        self.exports.push((name.to_string(), Target::Global(self.globals.len() as u32)));
        self.globals.push(value);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let imported = self.imports.len() as u32;
        let mut module = Module::new();

        let mut types = TypeSection::new();
        for (params, results) in &self.types {
            types.ty().function(params.clone(), results.clone());
        }
        module.section(&types);

        if !self.imports.is_empty() {
            let mut imports = ImportSection::new();
            for (module_name, name, ty) in &self.imports {
                imports.import(module_name, name, EntityType::Function(*ty));
            }
            module.section(&imports);
        }

        let mut functions = FunctionSection::new();
        for (ty, _) in &self.functions {
            functions.function(*ty);
        }
        module.section(&functions);

        if !self.memories.is_empty() {
            let mut memories = MemorySection::new();
            for pages in &self.memories {
                memories.memory(MemoryType { minimum: *pages, maximum: None, memory64: false, shared: false, page_size_log2: None });
            }
            module.section(&memories);
        }

        if !self.globals.is_empty() {
            let mut globals = GlobalSection::new();
            for value in &self.globals {
                globals.global(GlobalType { val_type: ValType::I32, mutable: false, shared: false }, &ConstExpr::i32_const(*value));
            }
            module.section(&globals);
        }

        let mut exports = ExportSection::new();
        for (name, target) in &self.exports {
            match target {
                Target::Func(index) => exports.export(name, ExportKind::Func, imported + index),
                Target::Memory(index) => exports.export(name, ExportKind::Memory, *index),
                Target::Global(index) => exports.export(name, ExportKind::Global, *index),
            };
        }
        module.section(&exports);

        if let Some(index) = self.start {
            module.section(&StartSection { function_index: imported + index });
        }

        let mut code = CodeSection::new();
        for (ty, body) in &self.functions {
            let (_, results) = &self.types[*ty as usize];
            code.function(&emit_body(body, results));
        }
        module.section(&code);

        module.finish()
    }
}

fn emit_body(body: &Body, results: &[ValType]) -> Function {
    let mut f = Function::new(vec![]);
    match body {
        Body::Zeroes => {
            for result in results {
                match result {
                    ValType::I32 => {
                        f.instruction(&Instruction::I32Const(0));
                    }
                    ValType::I64 => {
                        f.instruction(&Instruction::I64Const(0));
                    }
                    ValType::F32 => {
                        f.instruction(&Instruction::I32Const(0));
                        f.instruction(&Instruction::F32ReinterpretI32);
                    }
                    ValType::F64 => {
                        f.instruction(&Instruction::I64Const(0));
                        f.instruction(&Instruction::F64ReinterpretI64);
                    }
                    other => panic!("fixture cannot produce a {other:?} result"),
                }
            }
        }
        Body::AddI32 => {
            f.instruction(&Instruction::LocalGet(0));
            f.instruction(&Instruction::LocalGet(1));
            f.instruction(&Instruction::I32Add);
        }
        Body::Unreachable => {
            f.instruction(&Instruction::Unreachable);
        }
        Body::Nop => {
            f.instruction(&Instruction::Nop);
        }
        Body::IllTyped => {
            f.instruction(&Instruction::I64Const(0));
        }
    }
    f.instruction(&Instruction::End);
    f
}

/// Bytes the engine refuses to compile: valid header, bogus section id
pub fn invalid_module() -> Vec<u8> {
    b"\0asm\x01\0\0\0\xff\x00".to_vec()
}

pub fn loader() -> (WasmLoader, TypeRegistry) {
    loader_with(LoaderConfig::default())
}

pub fn loader_with(config: LoaderConfig) -> (WasmLoader, TypeRegistry) {
    let mut registry = TypeRegistry::new();
    let loader = WasmLoader::initialize(config, &mut registry).unwrap();
    (loader, registry)
}

/// Write `bytes` to `dir/name` and return the full path
pub fn write_module(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
