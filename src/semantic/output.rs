use indexmap::IndexMap;
use serde::Serialize;

/// What a synthesized declaration is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeclKind {
    Getter,
    Setter,
    Constructor,
    Equality,
    Inequality,
    Assignment,
    Write,
    Read,
}

/// One declaration fabricated for a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesizedDecl {
    pub kind: DeclKind,
    /// Field or type parameter the declaration was built for, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl SynthesizedDecl {
    pub fn new(kind: DeclKind) -> Self {
        SynthesizedDecl { kind, target: None }
    }

    pub fn for_member(kind: DeclKind, member: &str) -> Self {
        SynthesizedDecl {
            kind,
            target: Some(member.to_string()),
        }
    }
}

/// Outcome of one synthesis run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SynthesisReport {
    pub entry_point: String,
    /// The entry point did not exist in the program and was created.
    pub fabricated_main: bool,
    /// Declarations synthesized per type, in processing order. Types that
    /// got nothing are left out.
    pub types: IndexMap<String, Vec<SynthesizedDecl>>,
}

impl SynthesisReport {
    pub(crate) fn record(&mut self, type_name: &str, decls: Vec<SynthesizedDecl>) {
        if decls.is_empty() {
            return;
        }
        self.types.entry(type_name.to_string()).or_default().extend(decls);
    }

    /// Number of declarations synthesized across all types.
    pub fn total(&self) -> usize {
        self.types.values().map(Vec::len).sum()
    }
}
