use hashbrown::HashMap;
use serde::Serialize;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

/// Source ID for identifying source files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceId(pub(crate) NonZeroU32);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

impl SourceId {
    /// Reserved for compiler-fabricated entities with no user-visible origin.
    pub const BUILTIN: SourceId = SourceId(NonZeroU32::new(1).unwrap());

    /// create a new SourceId from a u32. panics if id is zero.
    pub(crate) fn new(id: u32) -> Self {
        SourceId(NonZeroU32::new(id).expect("SourceId must be non-zero"))
    }

    fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Source ID and line number.
///
/// Every AST node and symbol carries one of these. Synthesized declarations
/// are stamped with the location of the symbol that caused them, so later
/// diagnostics point at user code rather than at the insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLoc {
    pub source_id: SourceId,
    pub line: u32,
}

impl Default for SourceLoc {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SourceLoc {
    pub fn new(source_id: SourceId, line: u32) -> Self {
        SourceLoc { source_id, line }
    }

    /// built-in source location (SourceId = 1, line = 0)
    pub fn builtin() -> Self {
        SourceLoc::new(SourceId::BUILTIN, 0)
    }

    pub fn is_builtin(&self) -> bool {
        self.source_id == SourceId::BUILTIN
    }
}

impl std::fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceLoc(source_id={}, line={})", self.source_id, self.line)
    }
}

/// File information for tracking source files
#[derive(Debug)]
pub struct FileInfo {
    pub file_id: SourceId,
    pub path: PathBuf,
}

/// Maps source ids to the files the parser read them from.
///
/// The synthesis stage never reads file contents; it only needs stable ids for
/// locations and a way to render them in diagnostics.
#[derive(Debug)]
pub struct SourceManager {
    file_infos: Vec<FileInfo>,
    path_to_id: HashMap<PathBuf, SourceId>,
}

impl Default for SourceManager {
    fn default() -> Self {
        let mut manager = Self {
            file_infos: Vec::new(),
            path_to_id: HashMap::new(),
        };
        // id 1 is reserved for built-ins
        manager.add_file(Path::new("<built-in>"));
        manager
    }
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file path, returning the existing id if it was seen before.
    pub fn add_file(&mut self, path: &Path) -> SourceId {
        if let Some(&id) = self.path_to_id.get(path) {
            return id;
        }
        let id = SourceId::new(self.file_infos.len() as u32 + 1);
        self.file_infos.push(FileInfo {
            file_id: id,
            path: path.to_path_buf(),
        });
        self.path_to_id.insert(path.to_path_buf(), id);
        id
    }

    pub fn get_file_info(&self, id: SourceId) -> Option<&FileInfo> {
        self.file_infos.get(id.index())
    }

    /// Render a location as `file:line`.
    pub fn describe(&self, loc: SourceLoc) -> String {
        let file = self
            .get_file_info(loc.source_id)
            .and_then(|info| info.path.to_str())
            .unwrap_or("<invalid>");
        format!("{}:{}", file, loc.line)
    }
}
