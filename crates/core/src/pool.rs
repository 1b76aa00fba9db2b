use std::collections::VecDeque;

/// Free list of retired values awaiting reuse.
///
/// `acquire` hands out the oldest retired value, or a fresh `T::default()`
/// when none is waiting, so it never fails. `release` takes the value by
/// move: a value still referenced elsewhere cannot be released.
///
/// The pool is unbounded; it only ever holds what has been released and
/// not yet re-acquired.
#[derive(Debug, Clone)]
pub struct ObjectPool<T> {
    free: VecDeque<T>,
    allocated: usize,
}

impl<T: Default> ObjectPool<T> {
    pub fn new() -> Self {
        Self {
            free: VecDeque::new(),
            allocated: 0,
        }
    }

    pub fn acquire(&mut self) -> T {
        match self.free.pop_front() {
            Some(item) => item,
            None => {
                self.allocated += 1;
                T::default()
            }
        }
    }

    pub fn release(&mut self, item: T) {
        self.free.push_back(item);
    }

    pub fn release_all(&mut self, items: impl IntoIterator<Item = T>) {
        self.free.extend(items);
    }

    /// Number of values waiting for reuse.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Number of fresh values constructed since creation or the last `clear`.
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Drop every retired value and reset the allocation counter.
    pub fn clear(&mut self) {
        self.free.clear();
        self.allocated = 0;
    }
}

impl<T: Default> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_allocates() {
        let mut pool: ObjectPool<Vec<u8>> = ObjectPool::new();
        let a = pool.acquire();
        let b = pool.acquire();
        assert!(a.is_empty() && b.is_empty());
        assert_eq!(pool.allocated(), 2);
        assert!(pool.is_empty());
    }

    #[test]
    fn released_values_are_reused_oldest_first() {
        let mut pool: ObjectPool<Vec<u8>> = ObjectPool::new();
        pool.release(vec![1]);
        pool.release(vec![2]);
        assert_eq!(pool.acquire(), vec![1]);
        assert_eq!(pool.acquire(), vec![2]);
        assert_eq!(pool.allocated(), 0);
    }

    #[test]
    fn churn_returns_every_value() {
        let mut pool: ObjectPool<u32> = ObjectPool::new();
        let taken: Vec<u32> = (0..8).map(|_| pool.acquire()).collect();
        pool.release_all(taken);
        assert_eq!(pool.len(), 8);
        assert_eq!(pool.allocated(), 8);
        let _ = pool.acquire();
        assert_eq!(pool.allocated(), 8);
        pool.clear();
        assert_eq!((pool.len(), pool.allocated()), (0, 0));
    }
}
