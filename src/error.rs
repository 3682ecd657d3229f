use thiserror::Error;

use crate::mir::{Opcode, PregIdx, StIdx};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which covers every recoverable failure this library can return.
///
/// Only malformed input produces an [`Error`]. Violations of the IR's own invariants (asymmetric
/// edges, a definition tag that does not point back, an out-of-range operand index) are
/// compiler-internal bugs and abort through the fatal check macros instead.
///
/// # Error Categories
///
/// ## Malformed Input
/// - [`Error::Malformed`] - The statement tree is structurally invalid
/// - [`Error::UnknownSymbol`] - A statement references a symbol missing from the symbol table
/// - [`Error::UnknownPreg`] - A statement references an undeclared pseudo register
/// - [`Error::InvalidOpcode`] - An opcode that is not valid at this representation level
/// - [`Error::Empty`] - A function without a body
///
/// ## Construction and Checking
/// - [`Error::SsaError`] - SSA construction could not complete
/// - [`Error::Verification`] - A consistency check over a built function failed
///
/// # Examples
///
/// ```rust
/// use meir::{Error, mir::{MirFunction, SymbolTable}, me::MeFunction, MeConfig};
///
/// let func = MirFunction::new("empty", SymbolTable::new(), Vec::new());
/// match MeFunction::build(&func, &MeConfig::default()) {
///     Err(Error::Empty) => {}
///     other => panic!("unexpected: {:?}", other.map(|_| ())),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input statement tree is damaged and could not be lowered.
    ///
    /// Carries the source location in this crate where the malformation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A statement references a symbol that is absent from the function's symbol table.
    #[error("Symbol {0} is not declared in the symbol table")]
    UnknownSymbol(StIdx),

    /// A statement references a pseudo register that was never declared.
    #[error("Pseudo register {0} is not declared")]
    UnknownPreg(PregIdx),

    /// The opcode is not valid for the current representation level.
    ///
    /// For example an expression opcode in statement position, or an already lowered
    /// pseudo instruction in the pre-SSA tree.
    #[error("Opcode '{opcode}' is not valid as {context}")]
    InvalidOpcode {
        /// The offending opcode
        opcode: Opcode,
        /// Where it was found
        context: &'static str,
    },

    /// Provided function body was empty.
    #[error("Provided function body was empty")]
    Empty,

    /// SSA construction failed.
    #[error("SSA construction failed - {0}")]
    SsaError(String),

    /// A consistency check over a built function failed.
    ///
    /// Produced by [`crate::me::verify`]; each entry of the list is one violated property.
    #[error("Verification failed: {}", .0.join("; "))]
    Verification(Vec<String>),
}
