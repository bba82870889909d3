//! Asset compilers and the registry that resolves them.
//!
//! - [`AssetCompiler`]: the capability every type-specific compiler implements
//! - [`CompileResult`]: steps plus log returned by any compile operation
//! - [`CompilerRegistry`]: `(kind, context)` to compiler resolution with
//!   context fallback and deferred plugin (un)registration
//! - [`CommandCompiler`]: a configurable compiler emitting one command per asset

mod command;
mod registry;
mod result;
mod types;

pub use command::{CommandCompiler, CommandCompilerConfig, InputTypeConfig};
pub use registry::{CompilerDeclaration, CompilerFactory, CompilerPlugin, CompilerRegistry, ModuleEvent, RegistryError};
pub use result::CompileResult;
pub use types::{AssetCompiled, AssetCompiler, CompiledObserver, CompilerContext, CompilerError, InputType};
