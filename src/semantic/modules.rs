use log::debug;

use crate::ast::NodeKind;

use super::context::CompilationContext;
use super::symbol_table::SymbolRef;

impl CompilationContext {
    /// Initializer of a module, created on first request.
    ///
    /// Creating it moves every top-level statement that is not a definition
    /// into its body, in order, and appends its definition to the module.
    pub fn module_init_fn(&mut self, module: SymbolRef) -> SymbolRef {
        let Some(data) = self.symbols.module(module) else {
            panic!("ICE: symbol {} is not a module", self.name(module));
        };
        if let Some(init_fn) = data.init_fn {
            return init_fn;
        }
        let stmts = data.stmts;
        let loc = self.symbols.get(module).loc;

        let init_fn = self.new_function(&format!("__init_{}", self.name(module)), self.types.type_void, loc);
        let body = self.fn_body(init_fn);
        let top_level: Vec<_> = self.ast.block_stmts(stmts).to_vec();
        let mut moved = 0usize;
        for stmt in top_level {
            if matches!(self.ast.get_kind(stmt), NodeKind::Def(_)) {
                continue;
            }
            self.ast.remove(stmt);
            self.ast.insert_at_tail(body, stmt);
            moved += 1;
        }

        self.append_def(stmts, self.def_of(init_fn));
        if let Some(data) = self.symbols.get_mut(module).as_module_mut() {
            data.init_fn = Some(init_fn);
        }
        debug!(
            "Modules: created initializer for '{}' ({} statements moved)",
            self.name(module),
            moved
        );
        init_fn
    }
}
