//! Mock construction helpers

use mockall::mock;
use modupipe::pipeline::queue::Queue;
use modupipe::{Result, Sink};

mock! {
    pub IntSink {}
    impl Sink<i32> for IntSink {
        fn receive(&mut self, item: i32) -> Result<()>;
    }
}

/// Create a named bounded test queue
pub fn create_test_queue<T>(name: &str, capacity: usize) -> Queue<T> {
    Queue::bounded(capacity).with_name(name)
}
