//! Convenient re-exports for tests.
//!
//! ```rust,ignore
//! use arbor_test::prelude::*;
//! ```

pub use crate::fixtures::{p, sample_namespace};
pub use crate::harness::{TestContext, setup_test_logging, setup_test_logging_default};
pub use crate::mocks::{Gate, MockCall, MockNamespace, MockNode};
