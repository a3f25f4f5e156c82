// tests/common/mod.rs

#![allow(dead_code, unused_imports)]

pub use dagwalk_test_utils::builders;
pub use dagwalk_test_utils::fake_work::{FakeWork, Script};
pub use dagwalk_test_utils::{connect, init_tracing, vertex_context, with_timeout};

