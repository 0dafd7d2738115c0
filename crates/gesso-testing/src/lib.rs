//! Testing utilities and virtual-time harness for Gesso-RS

pub mod testing;

// Re-export testing utilities
pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
}
