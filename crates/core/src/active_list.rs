//! Doubly linked sequence stored in an arena, with sentinel head/tail slots
//! and a cursor that can remove while traversing.
//!
//! ```text
//!   slot:   0 (HEAD)     4           2           1 (TAIL)
//!          ┌──────┐   ┌──────┐   ┌──────┐   ┌──────┐
//!          │ ---- │──▶│  a   │──▶│  b   │──▶│ ---- │
//!          │      │◀──│      │◀──│      │◀──│      │
//!          └──────┘   └──────┘   └──────┘   └──────┘
//! ```
//!
//! Links are slot indices, so removal is O(1) and freed slots are recycled
//! through a free list without touching the allocator.
//!
//! # Cursor removal contract
//!
//! A [`Cursor`] sits *one ahead* of what it last returned: after `next()`
//! yields `b`, the cursor already points past `b`. [`Cursor::remove`]
//! deletes the element returned by the most recent `next()`/`previous()`
//! call, never the element the cursor points at. To delete "the current
//! element", call `next()` first and then `remove()`:
//!
//! ```
//! use danmaku_core::active_list::ActiveList;
//!
//! let mut list: ActiveList<u32> = [1, 2, 3].into_iter().collect();
//! let mut cursor = list.cursor_front();
//! while let Some(v) = cursor.next() {
//!     if *v == 2 {
//!         assert_eq!(cursor.remove(), Some(2));
//!     }
//! }
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
//! ```

const HEAD: usize = 0;
const TAIL: usize = 1;

#[derive(Debug, Clone)]
struct Node<T> {
    value: Option<T>,
    prev: usize,
    next: usize,
}

#[derive(Debug, Clone)]
pub struct ActiveList<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> ActiveList<T> {
    pub fn new() -> Self {
        Self {
            nodes: vec![
                Node {
                    value: None,
                    prev: HEAD,
                    next: TAIL,
                },
                Node {
                    value: None,
                    prev: HEAD,
                    next: TAIL,
                },
            ],
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append after the last element.
    pub fn push_back(&mut self, value: T) {
        let prev = self.nodes[TAIL].prev;
        let node = Node {
            value: Some(value),
            prev,
            next: TAIL,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.nodes[prev].next = idx;
        self.nodes[TAIL].prev = idx;
        self.len += 1;
    }

    pub fn front(&self) -> Option<&T> {
        self.nodes[self.nodes[HEAD].next].value.as_ref()
    }

    pub fn back(&self) -> Option<&T> {
        self.nodes[self.nodes[TAIL].prev].value.as_ref()
    }

    /// Cursor positioned at the first element, for forward traversal.
    pub fn cursor_front(&mut self) -> Cursor<'_, T> {
        let current = self.nodes[HEAD].next;
        Cursor {
            list: self,
            current,
            last: None,
        }
    }

    /// Cursor positioned at the last element, for backward traversal.
    pub fn cursor_back(&mut self) -> Cursor<'_, T> {
        let current = self.nodes[TAIL].prev;
        Cursor {
            list: self,
            current,
            last: None,
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            front: self.nodes[HEAD].next,
            back: self.nodes[TAIL].prev,
            remaining: self.len,
        }
    }

    /// Remove every element, yielding them in list order. Slots are kept
    /// for reuse.
    pub fn take_all(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        let mut idx = self.nodes[HEAD].next;
        while idx != TAIL {
            let next = self.nodes[idx].next;
            if let Some(value) = self.nodes[idx].value.take() {
                out.push(value);
            }
            self.free.push(idx);
            idx = next;
        }
        self.nodes[HEAD].next = TAIL;
        self.nodes[TAIL].prev = HEAD;
        self.len = 0;
        out
    }

    fn unlink(&mut self, idx: usize) -> Option<T> {
        if idx == HEAD || idx == TAIL {
            return None;
        }
        let value = self.nodes[idx].value.take()?;
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.free.push(idx);
        self.len -= 1;
        Some(value)
    }
}

impl<T> Default for ActiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for ActiveList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        for value in iter {
            list.push_back(value);
        }
        list
    }
}

/// Bidirectional cursor over an [`ActiveList`] with one-ahead positioning.
///
/// See the [module docs](self) for the removal contract.
#[derive(Debug)]
pub struct Cursor<'a, T> {
    list: &'a mut ActiveList<T>,
    current: usize,
    /// Slot returned by the last `next()`/`previous()`, cleared by `remove()`.
    last: Option<usize>,
}

impl<T> Cursor<'_, T> {
    pub fn has_next(&self) -> bool {
        self.current != TAIL && self.current != HEAD
    }

    pub fn has_previous(&self) -> bool {
        self.has_next()
    }

    /// Return the element under the cursor and step towards the tail.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&mut T> {
        if !self.has_next() {
            return None;
        }
        let idx = self.current;
        self.current = self.list.nodes[idx].next;
        self.last = Some(idx);
        self.list.nodes[idx].value.as_mut()
    }

    /// Return the element under the cursor and step towards the head.
    pub fn previous(&mut self) -> Option<&mut T> {
        if !self.has_previous() {
            return None;
        }
        let idx = self.current;
        self.current = self.list.nodes[idx].prev;
        self.last = Some(idx);
        self.list.nodes[idx].value.as_mut()
    }

    /// Delete the element most recently returned by `next()`/`previous()`
    /// and hand it back.
    ///
    /// Returns `None` without touching the list when nothing has been
    /// returned since the cursor was created or since the last `remove()`.
    /// Callers treat that as a contract violation on their side.
    pub fn remove(&mut self) -> Option<T> {
        let idx = self.last.take()?;
        self.list.unlink(idx)
    }
}

pub struct Iter<'a, T> {
    list: &'a ActiveList<T>,
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.list.nodes[self.front];
        self.front = node.next;
        self.remaining -= 1;
        node.value.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.list.nodes[self.back];
        self.back = node.prev;
        self.remaining -= 1;
        node.value.as_ref()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
