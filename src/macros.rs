#![allow(unused_macros)]

/// Aborts with a diagnostic naming the failed check and its location.
///
/// Used for violations of the IR's own invariants. These are compiler bugs, not input errors,
/// and there is no recovery path for them.
///
/// ```rust, ignore
///  fatal!("bb {} is not a predecessor of bb {}", pred, bb);
/// ```
macro_rules! fatal {
    ($($arg:tt)+) => {{
        let message = format!($($arg)+);
        log::error!("fatal: {}:{}: {}", file!(), line!(), message);
        panic!("fatal: {}:{}: {}", file!(), line!(), message)
    }};
}

/// Checks an invariant and aborts through [`fatal!`] when it does not hold.
///
/// ```rust, ignore
///  check_fatal!(idx < self.opnds.len(), "operand index {} out of range", idx);
/// ```
macro_rules! check_fatal {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            fatal!("check '{}' failed: {}", stringify!($cond), format!($($arg)+));
        }
    };
}

/// Defines a dense, strongly-typed index handle.
///
/// The generated type wraps a `u32`, implements [`crate::utils::ArenaIndex`] so it can key an
/// [`crate::utils::Arena`], and prints with the given prefix.
///
/// ```rust, ignore
///  index_type!(
///      /// Handle of a basic block
///      BbId, "bb"
///  );
/// ```
macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Creates a handle from a raw index.
            #[must_use]
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            /// Returns the raw index of this handle.
            #[must_use]
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Returns the raw index as `u32`.
            #[must_use]
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl crate::utils::ArenaIndex for $name {
            #[inline]
            fn from_index(index: usize) -> Self {
                check_fatal!(
                    index <= u32::MAX as usize,
                    "{} arena exhausted",
                    stringify!($name)
                );
                $name(index as u32)
            }

            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl From<u32> for $name {
            fn from(index: u32) -> Self {
                $name(index)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}
