//! Test to verify test infrastructure works correctly

mod common;

use common::builders::FlakySourceBuilder;
use common::mock_helpers::{create_test_queue, MockIntSink};
use modupipe::pipeline::prelude::*;
use modupipe::pipeline::source::Items;

#[test]
fn test_infrastructure_setup() {
    let (mut source, fetches) = FlakySourceBuilder::new([7, 8]).build();
    let items: Vec<i32> = source.fetch().map(|x| x.unwrap()).collect();

    assert_eq!(items, vec![7, 8]);
    assert_eq!(fetches.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn test_mock_sink() {
    let mut sink = MockIntSink::new();
    sink.expect_receive().times(2).returning(|_| Ok(()));
    Pipeline::new(Items::new([1, 2]), sink).run().unwrap();
}

#[test]
fn test_test_queue() {
    let queue = create_test_queue::<u8>("fixture", 3);
    assert_eq!(queue.name(), "fixture");
    assert_eq!(queue.capacity(), Some(3));
}

#[test]
fn test_float_comparison() {
    common::assert_float_eq(1.0, 1.0000001, 0.001);
}

#[test]
#[should_panic]
fn test_float_comparison_fails() {
    common::assert_float_eq(1.0, 2.0, 0.001);
}
