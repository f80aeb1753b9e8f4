//! Pull-based bounded sequence of fetched records.
//!
//! A producer buffers the records of a fetched page and hands them out one
//! at a time; the resource set drains it into its cache in chunks. The
//! protocol returns the whole requested window in a single page (bounds are
//! server-side via `limit_start`/`limit_stop`), so a producer is exhausted
//! once its buffer runs dry.

use std::collections::VecDeque;

#[derive(Debug)]
pub(crate) struct RecordProducer<M> {
    pending: VecDeque<M>,
}

impl<M> RecordProducer<M> {
    pub fn new(records: Vec<M>) -> Self {
        Self {
            pending: records.into(),
        }
    }

    pub fn next_record(&mut self) -> Option<M> {
        self.pending.pop_front()
    }

    pub fn has_more(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_order_and_exhausts() {
        let mut producer = RecordProducer::new(vec![1, 2, 3]);
        assert!(producer.has_more());
        assert_eq!(producer.next_record(), Some(1));
        assert_eq!(producer.next_record(), Some(2));
        assert_eq!(producer.next_record(), Some(3));
        assert!(!producer.has_more());
        assert_eq!(producer.next_record(), None);
    }
}
