//! Type representation used by the synthesis stage.
//!
//! Types here are deliberately shallow: the stage only needs to know a type's
//! name, the symbol that declares it and, for structured types, the ordered
//! fields, nested type parameters and accumulated methods. Full type checking
//! happens in a later pass.

use std::num::NonZeroU32;

use serde::Serialize;
use thin_vec::ThinVec;

use crate::ast::{NameId, NodeRef};
use crate::semantic::SymbolRef;

/// Type representation.
/// Types are stored in a separate Vec<Type> with TypeRef references.
#[derive(Debug, Clone)]
pub struct Type {
    pub name: NameId,
    /// The type symbol declaring this type; set once the symbol is allocated.
    pub symbol: Option<SymbolRef>,
    pub kind: TypeKind,
}

impl Type {
    /// can only be called by TypeRegistry
    pub(crate) fn new(name: NameId, kind: TypeKind) -> Self {
        Type {
            name,
            symbol: None,
            kind,
        }
    }

    pub fn as_structured(&self) -> Option<&StructuredType> {
        match &self.kind {
            TypeKind::Structured(st) => Some(st),
            _ => None,
        }
    }

    pub fn as_structured_mut(&mut self) -> Option<&mut StructuredType> {
        match &mut self.kind {
            TypeKind::Structured(st) => Some(st),
            _ => None,
        }
    }

    /// Statements nested in this type's declaration, if it has a body.
    pub(crate) fn decls(&self) -> Option<NodeRef> {
        match &self.kind {
            TypeKind::Structured(st) => Some(st.decls),
            TypeKind::Enum { decls, .. } => Some(*decls),
            _ => None,
        }
    }
}

/// Opaque reference to a type.
/// Internally index + 1 (NonZeroU32 for niche optimization).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeRef(NonZeroU32);

impl TypeRef {
    #[inline]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(TypeRef)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    #[inline]
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    /// Not yet inferred.
    Unknown,
    Void,
    Bool,
    Int,
    Float,
    String,
    Nil,
    /// Witness type threaded through setters so fields are only written through them.
    SetterToken,
    /// Opaque type provided by a library module (e.g. the `file` stream handle).
    Primitive,
    Structured(Box<StructuredType>),
    /// Generic type parameter with its bound.
    Variable { bound: TypeRef },
    /// First-class type alias declared inside another type.
    User { underlying: TypeRef },
    Enum { decls: NodeRef, constants: Vec<SymbolRef> },
    Tuple { components: ThinVec<TypeRef> },
}

/// Class, record, value class or union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ClassTag {
    Record,
    Class,
    ValueClass,
    Union,
}

impl ClassTag {
    /// Records and value classes compare and assign field by field.
    pub fn has_value_semantics(self) -> bool {
        matches!(self, ClassTag::Record | ClassTag::ValueClass)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ClassTag::Record => "record",
            ClassTag::Class => "class",
            ClassTag::ValueClass => "value class",
            ClassTag::Union => "union",
        }
    }
}

/// Record/class-like type.
///
/// Field order is semantically significant: it fixes constructor formal order
/// and the order of the structural comparison and assignment folds.
#[derive(Debug, Clone)]
pub struct StructuredType {
    pub class_tag: ClassTag,
    /// Block holding field and nested type definitions.
    pub decls: NodeRef,
    pub fields: Vec<SymbolRef>,
    /// Nested type parameters and aliases, in declaration order.
    pub types: Vec<SymbolRef>,
    pub methods: Vec<SymbolRef>,
    pub default_constructor: Option<SymbolRef>,
}

impl StructuredType {
    pub(crate) fn new(class_tag: ClassTag, decls: NodeRef) -> Self {
        StructuredType {
            class_tag,
            decls,
            fields: Vec::new(),
            types: Vec::new(),
            methods: Vec::new(),
            default_constructor: None,
        }
    }
}
