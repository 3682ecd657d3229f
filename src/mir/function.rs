use crate::mir::{PuIdx, StmtNode, StringTable, SymbolTable};

/// A function of the input program: its symbol table and flat statement body.
///
/// The body is a flat statement sequence; control flow is expressed through `label`, `goto`,
/// conditional branches, `switch` and `return`, as produced by the front end.
#[derive(Debug, Clone)]
pub struct MirFunction {
    /// Function name
    pub name: String,
    /// Index of this function
    pub pu: PuIdx,
    /// Declared variables and pseudo registers
    pub symbols: SymbolTable,
    /// Statement sequence
    pub body: Vec<StmtNode>,
}

impl MirFunction {
    /// Creates a function with index `0`.
    #[must_use]
    pub fn new(name: &str, symbols: SymbolTable, body: Vec<StmtNode>) -> Self {
        MirFunction {
            name: name.to_string(),
            pu: PuIdx::new(0),
            symbols,
            body,
        }
    }
}

/// A compilation unit: the functions plus the literals they share.
#[derive(Debug, Clone, Default)]
pub struct MirModule {
    /// Functions in declaration order
    pub functions: Vec<MirFunction>,
    /// Interned string literals
    pub strings: StringTable,
}

impl MirModule {
    /// Creates an empty module.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a function, assigning it the next function index.
    pub fn add_function(&mut self, mut func: MirFunction) -> PuIdx {
        let pu = PuIdx::new(self.functions.len() as u32);
        func.pu = pu;
        self.functions.push(func);
        pu
    }
}
