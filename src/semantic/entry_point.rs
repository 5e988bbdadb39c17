//! Entry point wiring.
//!
//! Finds the program's `main` or creates one in the only user module, then
//! makes it run the module initializers first. At program start the order is
//! prelude, common module, the module holding `main`, then `main`'s own body.

use log::debug;

use crate::ast::NodeRef;
use crate::source_manager::SourceLoc;

use super::context::CompilationContext;
use super::error::SynthesisError;
use super::function_query::{ENTRY_POINT_NAME, FunctionQuery};
use super::symbol_table::{ModType, SymbolRef};

/// How the entry point was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    pub main_fn: SymbolRef,
    pub module: SymbolRef,
    /// `main` was not written by the user.
    pub fabricated: bool,
}

impl CompilationContext {
    /// Resolve or create `main` and prepend the module initializer calls to
    /// its body. Runs once, after every module is registered; later calls
    /// return the entry point already wired.
    pub fn build_main(&mut self) -> Result<EntryPoint, SynthesisError> {
        if let Some(entry) = self.entry_point {
            debug!("EntryPoint: already wired, main is symbol {}", entry.main_fn.get());
            return Ok(entry);
        }
        let found = FunctionQuery::named(ENTRY_POINT_NAME).with_formals(0).run(self)?;

        let entry = match found {
            Some(main_fn) => EntryPoint {
                main_fn,
                module: self.module_of_main(main_fn)?,
                fabricated: false,
            },
            None => {
                let module = self.unique_user_module()?;
                let loc = self.symbols.get(module).loc;
                let main_fn = self.new_function(ENTRY_POINT_NAME, self.types.type_void, loc);
                self.append_def(self.module_stmts(module), self.def_of(main_fn));
                debug!("EntryPoint: created main in module '{}'", self.name(module));
                EntryPoint {
                    main_fn,
                    module,
                    fabricated: true,
                }
            }
        };

        let prelude = self.prelude.ok_or_else(|| self.missing_module("prelude", entry.main_fn))?;
        let common = self.common.ok_or_else(|| self.missing_module("common", entry.main_fn))?;

        // each call goes to the head, so the last one inserted runs first
        let body = self.fn_body(entry.main_fn);
        for module in [entry.module, common, prelude] {
            let init_fn = self.module_init_fn(module);
            let call = self.init_call(init_fn, self.symbols.get(entry.main_fn).loc);
            self.ast.insert_at_head(body, call);
        }

        self.entry_point = Some(entry);
        debug!(
            "EntryPoint: main is symbol {} in module '{}'",
            entry.main_fn.get(),
            self.name(entry.module)
        );
        Ok(entry)
    }

    /// Module directly enclosing a user-written `main`, which must be a user
    /// module.
    fn module_of_main(&self, main_fn: SymbolRef) -> Result<SymbolRef, SynthesisError> {
        let entry = self.symbols.get(main_fn);
        let module = entry
            .def_point
            .and_then(|def| self.enclosing_module(def))
            .ok_or_else(|| SynthesisError::MainNotInModule {
                name: entry.name.to_string(),
                location: entry.loc,
            })?;
        match self.symbols.module(module).map(|data| data.mod_type) {
            Some(ModType::User) => Ok(module),
            _ => Err(SynthesisError::MainInNonUserModule {
                module: self.name(module).to_string(),
                location: entry.loc,
            }),
        }
    }

    /// The one user module, when no `main` was written.
    fn unique_user_module(&self) -> Result<SymbolRef, SynthesisError> {
        let user_modules = self.modules_of_type(ModType::User);
        match user_modules.as_slice() {
            [module] => Ok(*module),
            [] => Err(SynthesisError::NoUserModule {
                location: SourceLoc::builtin(),
            }),
            [_, second, ..] => Err(SynthesisError::MultipleModulesNoMain {
                location: self.symbols.get(*second).loc,
            }),
        }
    }

    fn missing_module(&self, which: &'static str, main_fn: SymbolRef) -> SynthesisError {
        SynthesisError::MissingModule {
            which,
            location: self.symbols.get(main_fn).loc,
        }
    }

    /// `init_fn();`
    fn init_call(&mut self, init_fn: SymbolRef, loc: SourceLoc) -> NodeRef {
        let callee = self.ast.sym_ref(init_fn, loc);
        let call = self.ast.call(callee, [], loc);
        self.ast.expr_stmt(call, loc)
    }
}
