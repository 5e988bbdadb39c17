//! Type Registry
//!
//! Arena for semantic types. All TypeRef creation goes through this registry.

use hashbrown::HashMap;
use thin_vec::ThinVec;

use crate::ast::NameId;

use super::types::{StructuredType, Type, TypeKind, TypeRef};

/// Central arena for semantic types.
///
/// Invariants:
/// - All TypeRef come from this registry
/// - Types are never removed
/// - Tuple types are canonical per component list
pub struct TypeRegistry {
    pub types: Vec<Type>,

    tuple_cache: HashMap<ThinVec<TypeRef>, TypeRef>,

    // --- Common builtin types ---
    pub type_unknown: TypeRef,
    pub type_void: TypeRef,
    pub type_bool: TypeRef,
    pub type_int: TypeRef,
    pub type_float: TypeRef,
    pub type_string: TypeRef,
    pub type_nil: TypeRef,
    pub type_setter_token: TypeRef,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a new TypeRegistry with builtin types initialized.
    pub fn new() -> Self {
        let mut types = Vec::new();
        let mut builtin = |name: &str, kind: TypeKind| {
            types.push(Type::new(NameId::new(name), kind));
            TypeRef::new(types.len() as u32).expect("TypeRef overflow")
        };

        let type_unknown = builtin("_unknown", TypeKind::Unknown);
        let type_void = builtin("void", TypeKind::Void);
        let type_bool = builtin("bool", TypeKind::Bool);
        let type_int = builtin("int", TypeKind::Int);
        let type_float = builtin("float", TypeKind::Float);
        let type_string = builtin("string", TypeKind::String);
        let type_nil = builtin("_nilType", TypeKind::Nil);
        let type_setter_token = builtin("_setterToken", TypeKind::SetterToken);

        TypeRegistry {
            types,
            tuple_cache: HashMap::new(),
            type_unknown,
            type_void,
            type_bool,
            type_int,
            type_float,
            type_string,
            type_nil,
            type_setter_token,
        }
    }

    /// Builtin types, in allocation order.
    pub fn builtins(&self) -> [TypeRef; 8] {
        [
            self.type_unknown,
            self.type_void,
            self.type_bool,
            self.type_int,
            self.type_float,
            self.type_string,
            self.type_nil,
            self.type_setter_token,
        ]
    }

    pub fn alloc(&mut self, name: NameId, kind: TypeKind) -> TypeRef {
        self.types.push(Type::new(name, kind));
        TypeRef::new(self.types.len() as u32).expect("TypeRef overflow")
    }

    pub fn get(&self, ty: TypeRef) -> &Type {
        &self.types[ty.index()]
    }

    pub fn get_mut(&mut self, ty: TypeRef) -> &mut Type {
        &mut self.types[ty.index()]
    }

    pub fn name_of(&self, ty: TypeRef) -> NameId {
        self.get(ty).name
    }

    pub fn structured(&self, ty: TypeRef) -> Option<&StructuredType> {
        self.get(ty).as_structured()
    }

    pub fn structured_mut(&mut self, ty: TypeRef) -> Option<&mut StructuredType> {
        self.get_mut(ty).as_structured_mut()
    }

    pub fn is_unknown(&self, ty: TypeRef) -> bool {
        matches!(self.get(ty).kind, TypeKind::Unknown)
    }

    /// Look up an already canonicalized tuple type.
    pub fn lookup_tuple(&self, components: &[TypeRef]) -> Option<TypeRef> {
        self.tuple_cache.get(components).copied()
    }

    /// Allocate the canonical tuple type for `components`, reusing the cached
    /// one if present.
    pub fn intern_tuple(&mut self, components: &[TypeRef]) -> TypeRef {
        if let Some(ty) = self.lookup_tuple(components) {
            return ty;
        }
        let name = NameId::new(format!("_tuple{}", components.len()));
        let key: ThinVec<TypeRef> = components.iter().copied().collect();
        let ty = self.alloc(
            name,
            TypeKind::Tuple {
                components: key.clone(),
            },
        );
        self.tuple_cache.insert(key, ty);
        ty
    }

    /// Replace every occurrence of a key type by its substitute, leaving
    /// other types untouched.
    pub fn substitute(&self, ty: TypeRef, substitutions: &HashMap<TypeRef, TypeRef>) -> TypeRef {
        substitutions.get(&ty).copied().unwrap_or(ty)
    }
}
