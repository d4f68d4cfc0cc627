//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use std::time::Duration;

/// Upper bound for blocking queue operations in tests
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Short timeout for operations expected to fail
pub fn short_timeout() -> Duration {
    Duration::from_millis(20)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
