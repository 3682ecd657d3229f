//! Configuration of SSA construction and of the debugging dumps.
//!
//! The dump filter mirrors the usual middle-end options: a set of phase names to dump after, and a
//! function-name filter where `*` selects every function and any other value selects functions
//! whose name contains it.

use std::collections::HashSet;

/// Name of the phase that builds the SSA form.
pub const PHASE_SSA: &str = "ssa";

/// Name of the phase that re-materializes the statement tree.
pub const PHASE_EMIT: &str = "emit";

/// Options controlling SSA construction and debug output.
#[derive(Debug, Clone)]
pub struct MeConfig {
    /// Optimization level (default: 2).
    pub opt_level: u8,
    /// Alias analysis level; `0` builds no chi/mu lists at all (default: 1).
    pub alias_analysis_level: u8,
    /// Phases after which the function is dumped.
    pub dump_phases: HashSet<String>,
    /// Dump before the phase instead of after it.
    pub dump_before: bool,
    /// Function filter for dumps: `*` for all, otherwise a name substring (default: `*`).
    pub dump_func: String,
    /// Only functions with an index in this inclusive range are processed by
    /// [`crate::me::build_module`].
    pub range: Option<(usize, usize)>,
    /// Suppress dumps and informational logging.
    pub quiet: bool,
    /// Print version symbols by index instead of `name_version`.
    pub dump_vsym_num: bool,
    /// Omit chi/mu lists and block attributes from dumps.
    pub simple_dump: bool,
    /// Run the consistency checks of [`crate::me::verify`] after construction.
    pub verify_after_build: bool,
}

impl Default for MeConfig {
    fn default() -> Self {
        MeConfig {
            opt_level: 2,
            alias_analysis_level: 1,
            dump_phases: HashSet::new(),
            dump_before: false,
            dump_func: "*".to_string(),
            range: None,
            quiet: false,
            dump_vsym_num: false,
            simple_dump: false,
            verify_after_build: cfg!(debug_assertions),
        }
    }
}

impl MeConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that never dumps and skips alias modeling.
    #[must_use]
    pub fn minimal() -> Self {
        MeConfig {
            opt_level: 0,
            alias_analysis_level: 0,
            quiet: true,
            verify_after_build: false,
            ..Self::default()
        }
    }

    /// Adds a phase to dump.
    #[must_use]
    pub fn with_dump_phase(mut self, phase: &str) -> Self {
        self.dump_phases.insert(phase.to_string());
        self
    }

    /// Restricts dumps to functions matching `filter`.
    #[must_use]
    pub fn with_dump_func(mut self, filter: &str) -> Self {
        self.dump_func = filter.to_string();
        self
    }

    /// Returns `true` if `func` passes the function-name filter.
    #[must_use]
    pub fn matches_func(&self, func: &str) -> bool {
        self.dump_func == "*" || func.contains(self.dump_func.as_str())
    }

    /// Returns `true` if `phase` should be dumped for `func`.
    #[must_use]
    pub fn should_dump(&self, phase: &str, func: &str) -> bool {
        !self.quiet && self.dump_phases.contains(phase) && self.matches_func(func)
    }

    /// Returns `true` if the function at `index` is inside the configured range.
    #[must_use]
    pub fn in_range(&self, index: usize) -> bool {
        match self.range {
            Some((lo, hi)) => lo <= index && index <= hi,
            None => true,
        }
    }

    /// Returns `true` if chi and mu lists are built.
    #[must_use]
    pub fn models_aliasing(&self) -> bool {
        self.alias_analysis_level > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_filter() {
        let config = MeConfig::new()
            .with_dump_phase(PHASE_SSA)
            .with_dump_func("foo");

        assert!(config.should_dump(PHASE_SSA, "foo"));
        assert!(config.should_dump(PHASE_SSA, "Lfoo_bar"));
        assert!(!config.should_dump(PHASE_SSA, "bar"));
        assert!(!config.should_dump(PHASE_EMIT, "foo"));
    }

    #[test]
    fn test_wildcard_and_quiet() {
        let mut config = MeConfig::new().with_dump_phase(PHASE_EMIT);
        assert!(config.should_dump(PHASE_EMIT, "anything"));
        config.quiet = true;
        assert!(!config.should_dump(PHASE_EMIT, "anything"));
    }

    #[test]
    fn test_range() {
        let config = MeConfig {
            range: Some((2, 4)),
            ..MeConfig::default()
        };
        assert!(!config.in_range(1));
        assert!(config.in_range(2));
        assert!(config.in_range(4));
        assert!(!config.in_range(5));
        assert!(!MeConfig::minimal().models_aliasing());
    }
}
