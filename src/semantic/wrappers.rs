//! Function wrappers.
//!
//! Call resolution adapts a call to a function by calling a wrapper instead:
//! one that takes the actuals in call order, one that coerces some actuals,
//! one that supplies omitted defaults, or a copy of a generic function with
//! its type parameters substituted. Each wrapper is a new function defined
//! right after the one it wraps.

use hashbrown::HashMap;
use log::debug;

use crate::ast::{NameId, NodeRef};

use super::context::{CompilationContext, CopyMap};
use super::error::SynthesisError;
use super::symbol_table::{ConsClass, FunctionData, SymbolEntry, SymbolKind, SymbolRef, VariableData};
use super::types::TypeRef;

impl CompilationContext {
    /// Empty function mirroring the wrapped one's signature shape: same
    /// name, return type, receiver binding and call syntax.
    fn wrapper_shell(&mut self, func: SymbolRef, prefix: &str) -> (SymbolRef, FunctionData) {
        let entry = self.symbols.get(func);
        let (name, cname, loc) = (entry.name, entry.cname, entry.loc);
        let Some(data) = entry.as_function().cloned() else {
            panic!("ICE: cannot wrap non-function {}", name);
        };

        let wrapper = self.new_function(name.as_str(), data.ret_type, loc);
        self.symbols.get_mut(wrapper).cname = NameId::new(format!("{}_{}", prefix, cname));
        if let Some(wrapper_data) = self.symbols.function_mut(wrapper) {
            wrapper_data.type_binding = data.type_binding;
            wrapper_data.method_type = data.method_type;
            wrapper_data.ret_ref = data.ret_ref;
            wrapper_data.no_parens = data.no_parens;
        }
        (wrapper, data)
    }

    fn formal_count(&self, func: SymbolRef) -> usize {
        self.symbols.function(func).map_or(0, |data| data.formals.len())
    }

    fn copy_formal(&mut self, formal: NodeRef) -> (NodeRef, SymbolRef) {
        let copy = self.copy(formal, &mut CopyMap::new());
        let sym = match self.ast.def_data(copy) {
            Some(data) => data.sym,
            None => panic!("ICE: formal {} is not a definition", formal.get()),
        };
        (copy, sym)
    }

    /// `return func(args);`, or a bare call for functions returning void.
    fn forward_call(&mut self, wrapper: SymbolRef, func: SymbolRef, args: Vec<NodeRef>) {
        let loc = self.symbols.get(wrapper).loc;
        let callee = self.ast.sym_ref(func, loc);
        let call = self.ast.call(callee, args, loc);
        let stmt = if self.symbols.get(func).ty == self.types.type_void {
            self.ast.expr_stmt(call, loc)
        } else {
            self.ast.return_stmt(Some(call), loc)
        };
        self.ast.insert_at_tail(self.fn_body(wrapper), stmt);
    }

    fn place_after(&mut self, func: SymbolRef, wrapper: SymbolRef) {
        let anchor = self.def_of(func);
        let def = self.def_of(wrapper);
        if self.ast.parent(anchor).is_some() {
            self.ast.insert_after(anchor, def);
            self.register_def(def);
        }
    }

    /// Wrapper taking the formals of `func` in call order.
    ///
    /// `formals_to_actuals[i]` is the call position of the `i`th formal and
    /// must be a permutation of the formal positions.
    pub fn order_wrapper(&mut self, func: SymbolRef, formals_to_actuals: &[usize]) -> Result<SymbolRef, SynthesisError> {
        let count = self.formal_count(func);
        let mut seen = vec![false; count];
        let is_permutation = formals_to_actuals.len() == count
            && formals_to_actuals
                .iter()
                .all(|&actual| actual < count && !std::mem::replace(&mut seen[actual], true));
        if !is_permutation {
            return Err(SynthesisError::InvalidArgumentOrder {
                name: self.name(func).to_string(),
                expected: count,
                location: self.symbols.get(func).loc,
            });
        }

        let (wrapper, data) = self.wrapper_shell(func, "_order_wrap");
        let mut by_actual: Vec<(usize, NodeRef)> = formals_to_actuals.iter().copied().zip(data.formals.iter().copied()).collect();
        by_actual.sort_by_key(|&(actual, _)| actual);
        let mut copies = HashMap::new();
        for (_, formal) in by_actual {
            let (copy, sym) = self.copy_formal(formal);
            self.attach_formal(wrapper, copy);
            copies.insert(formal, sym);
        }

        let loc = self.symbols.get(wrapper).loc;
        let args = data.formals.iter().map(|formal| self.ast.sym_ref(copies[formal], loc)).collect();
        self.forward_call(wrapper, func, args);
        self.place_after(func, wrapper);
        debug!("Wrappers: order wrapper for '{}' ({:?})", self.name(func), formals_to_actuals);
        Ok(wrapper)
    }

    /// Wrapper accepting some formals at a different type and casting them
    /// to the declared type before the call.
    pub fn coercion_wrapper(&mut self, func: SymbolRef, coercions: &[(usize, TypeRef)]) -> Result<SymbolRef, SynthesisError> {
        let count = self.formal_count(func);
        if let Some(&(index, _)) = coercions.iter().find(|(index, _)| *index >= count) {
            return Err(self.unknown_formal(func, index));
        }

        let (wrapper, data) = self.wrapper_shell(func, "_coerce_wrap");
        let loc = self.symbols.get(wrapper).loc;
        let mut args = Vec::with_capacity(data.formals.len());
        for (index, &formal) in data.formals.iter().enumerate() {
            let (copy, sym) = self.copy_formal(formal);
            self.attach_formal(wrapper, copy);
            let arg = self.ast.sym_ref(sym, loc);
            let arg = match coercions.iter().find(|(i, _)| *i == index) {
                Some(&(_, actual_ty)) => {
                    let declared = self.symbols.get(sym).ty;
                    self.symbols.get_mut(sym).ty = actual_ty;
                    self.ast.cast(declared, arg, loc)
                }
                None => arg,
            };
            args.push(arg);
        }

        self.forward_call(wrapper, func, args);
        self.place_after(func, wrapper);
        debug!("Wrappers: coercion wrapper for '{}'", self.name(func));
        Ok(wrapper)
    }

    /// Wrapper omitting the formals at `defaults`, passing their default
    /// values instead.
    pub fn default_wrapper(&mut self, func: SymbolRef, defaults: &[usize]) -> Result<SymbolRef, SynthesisError> {
        let count = self.formal_count(func);
        if let Some(&index) = defaults.iter().find(|&&index| index >= count) {
            return Err(self.unknown_formal(func, index));
        }

        let (wrapper, data) = self.wrapper_shell(func, "_default_wrap");
        let loc = self.symbols.get(wrapper).loc;
        let body = self.fn_body(wrapper);
        let mut args = Vec::with_capacity(data.formals.len());
        for (index, &formal) in data.formals.iter().enumerate() {
            if !defaults.contains(&index) {
                let (copy, sym) = self.copy_formal(formal);
                self.attach_formal(wrapper, copy);
                args.push(self.ast.sym_ref(sym, loc));
                continue;
            }
            // the default is evaluated into a local of the wrapper
            let Some(formal_data) = self.ast.def_data(formal).cloned() else {
                continue;
            };
            let formal_entry = self.symbols.get(formal_data.sym);
            let local = SymbolEntry::new(
                NameId::new(format!("_default_{}", formal_entry.name)),
                formal_entry.ty,
                loc,
                SymbolKind::Variable(VariableData::new(ConsClass::Const)),
            );
            let local = self.symbols.add(local);
            let init = match formal_data.init {
                Some(init) => self.copy(init, &mut CopyMap::new()),
                None => self.ast.sym_ref(self.nil, loc),
            };
            let def = self.ast.def(local, Some(init), None, loc);
            self.symbols.set_def_points(&[local], def);
            self.append_def(body, def);
            args.push(self.ast.sym_ref(local, loc));
        }

        self.forward_call(wrapper, func, args);
        self.place_after(func, wrapper);
        debug!("Wrappers: default wrapper for '{}' ({:?})", self.name(func), defaults);
        Ok(wrapper)
    }

    /// Copy of a generic function with types replaced per `substitutions`.
    ///
    /// Instantiations are cached per function and substitution set.
    pub fn instantiate_generic(&mut self, func: SymbolRef, substitutions: &HashMap<TypeRef, TypeRef>) -> SymbolRef {
        let mut key: Vec<(TypeRef, TypeRef)> = substitutions.iter().map(|(&from, &to)| (from, to)).collect();
        key.sort();
        if let Some(&instance) = self.memo.instantiations.get(&(func, key.clone())) {
            return instance;
        }

        let def = self.def_of(func);
        let mut map = CopyMap::new();
        let copy = self.copy(def, &mut map);
        let instance = map.symbol(func);

        let ret_type = self.types.substitute(self.symbols.get(instance).ty, substitutions);
        self.set_ret_type(instance, ret_type);
        for formal in self.formal_symbols(instance) {
            let declared = self.symbols.get(formal).ty;
            let substituted = self.types.substitute(declared, substitutions);
            if substituted == declared {
                continue;
            }
            let entry = self.symbols.get_mut(formal);
            entry.ty = substituted;
            if let SymbolKind::Param(param) = &mut entry.kind {
                param.is_generic = false;
            }
        }
        let cname = self.symbols.get(func).cname;
        self.symbols.get_mut(instance).cname = NameId::new(format!("{}_inst{}", cname, self.memo.instantiations.len() + 1));

        if self.ast.parent(def).is_some() {
            self.ast.insert_after(def, copy);
            self.register_def(copy);
        }
        self.memo.instantiations.insert((func, key), instance);
        debug!("Wrappers: instantiated '{}' as symbol {}", self.name(func), instance.get());
        instance
    }

    fn unknown_formal(&self, func: SymbolRef, index: usize) -> SynthesisError {
        SynthesisError::UnknownFormal {
            name: self.name(func).to_string(),
            index,
            location: self.symbols.get(func).loc,
        }
    }
}
