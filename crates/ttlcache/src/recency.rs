//! Recency list: arena-backed doubly-linked list ordered from head
//! (most protected) to tail (next to evict).
//!
//! Nodes live in a slot vector and are addressed by [`Handle`]s carrying a
//! generation, so a handle to a freed slot never resolves to whatever
//! reuses that slot later.

/// Stable reference to a node in a [`RecencyList`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    index: usize,
    generation: u64,
}

/// Node in the doubly-linked list
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Slot<T> {
    generation: u64,
    node: Option<Node<T>>,
}

/// Doubly-linked list over an arena of generational slots
pub struct RecencyList<T> {
    slots: Vec<Slot<T>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> RecencyList<T> {
    /// Create an empty list with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Number of linked nodes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Insert a value at the head
    pub fn push_front(&mut self, value: T) -> Handle {
        let index = self.alloc_slot();
        let slot = &mut self.slots[index];
        slot.node = Some(Node {
            value,
            prev: None,
            next: self.head,
        });
        let handle = Handle {
            index,
            generation: slot.generation,
        };

        if let Some(head_idx) = self.head {
            if let Some(head) = self.node_mut(head_idx) {
                head.prev = Some(index);
            }
        }

        self.head = Some(index);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
        self.len += 1;
        handle
    }

    /// Resolve a handle to its value
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.resolve(handle)
            .and_then(|idx| self.slots[idx].node.as_ref())
            .map(|node| &node.value)
    }

    /// Handle and value of the tail node
    pub fn back(&self) -> Option<(Handle, &T)> {
        let idx = self.tail?;
        let slot = &self.slots[idx];
        slot.node.as_ref().map(|node| {
            (
                Handle {
                    index: idx,
                    generation: slot.generation,
                },
                &node.value,
            )
        })
    }

    /// Unlink and return the tail value
    pub fn pop_back(&mut self) -> Option<T> {
        let (handle, _) = self.back()?;
        self.remove(handle)
    }

    /// Unlink the node behind `handle`; stale handles return `None`
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let idx = self.resolve(handle)?;
        self.unlink(idx);
        let slot = &mut self.slots[idx];
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(idx);
        self.len -= 1;
        Some(node.value)
    }

    /// Move a node to the head. Returns `false` for stale handles.
    ///
    /// A node already at the head is left where it is.
    pub fn move_to_front(&mut self, handle: Handle) -> bool {
        let Some(idx) = self.resolve(handle) else {
            return false;
        };
        if self.head == Some(idx) {
            return true;
        }

        self.unlink(idx);

        let old_head = self.head;
        if let Some(node) = self.node_mut(idx) {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(head_idx) = old_head {
            if let Some(head) = self.node_mut(head_idx) {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
        true
    }

    /// Drop every node and invalidate all outstanding handles
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_list.push(idx);
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterate values from head to tail
    #[cfg(test)]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    fn resolve(&self, handle: Handle) -> Option<usize> {
        let slot = self.slots.get(handle.index)?;
        (slot.generation == handle.generation && slot.node.is_some()).then_some(handle.index)
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<T>> {
        self.slots[idx].node.as_mut()
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &self.slots[idx].node {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = self.node_mut(prev_idx) {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = self.node_mut(next_idx) {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn alloc_slot(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: None,
            });
            self.slots.len() - 1
        }
    }

    /// Walk the links in both directions and panic on any inconsistency
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        let forward: Vec<usize> = {
            let mut out = Vec::new();
            let mut cursor = self.head;
            while let Some(idx) = cursor {
                assert!(out.len() < self.len, "cycle detected walking forward");
                out.push(idx);
                cursor = self.slots[idx].node.as_ref().and_then(|n| n.next);
            }
            out
        };
        let mut backward: Vec<usize> = {
            let mut out = Vec::new();
            let mut cursor = self.tail;
            while let Some(idx) = cursor {
                assert!(out.len() < self.len, "cycle detected walking backward");
                out.push(idx);
                cursor = self.slots[idx].node.as_ref().and_then(|n| n.prev);
            }
            out
        };
        backward.reverse();

        assert_eq!(forward.len(), self.len);
        assert_eq!(forward, backward);
        if self.len > 1 {
            assert_ne!(self.head, self.tail);
        }
        let occupied = self.slots.iter().filter(|s| s.node.is_some()).count();
        assert_eq!(occupied, self.len);
    }
}

/// Head-to-tail iterator over a [`RecencyList`]
#[cfg(test)]
pub struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    cursor: Option<usize>,
    remaining: usize,
}

#[cfg(test)]
impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.slots[self.cursor?].node.as_ref()?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &RecencyList<&'static str>) -> Vec<&'static str> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_push_front_order() {
        let mut list = RecencyList::with_capacity(4);

        list.push_front("a");
        list.push_front("b");
        list.push_front("c");

        assert_eq!(collect(&list), vec!["c", "b", "a"]);
        assert_eq!(list.back().map(|(_, v)| *v), Some("a"));
        list.assert_consistent();
    }

    #[test]
    fn test_pop_back() {
        let mut list = RecencyList::with_capacity(2);

        list.push_front(1);
        list.push_front(2);

        assert_eq!(list.pop_back(), Some(1));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), None);
        assert_eq!(list.len(), 0);
        list.assert_consistent();
    }

    #[test]
    fn test_move_to_front() {
        let mut list = RecencyList::with_capacity(3);

        let a = list.push_front("a");
        list.push_front("b");
        list.push_front("c");

        assert!(list.move_to_front(a));
        assert_eq!(collect(&list), vec!["a", "c", "b"]);
        list.assert_consistent();
    }

    #[test]
    fn test_move_to_front_idempotent() {
        let mut list = RecencyList::with_capacity(3);

        let a = list.push_front("a");
        list.push_front("b");

        assert!(list.move_to_front(a));
        let once = collect(&list);
        assert!(list.move_to_front(a));

        assert_eq!(collect(&list), once);
        assert_eq!(list.len(), 2);
        list.assert_consistent();
    }

    #[test]
    fn test_remove_middle() {
        let mut list = RecencyList::with_capacity(3);

        list.push_front("a");
        let b = list.push_front("b");
        list.push_front("c");

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(collect(&list), vec!["c", "a"]);
        list.assert_consistent();
    }

    #[test]
    fn test_stale_handle_rejected() {
        let mut list = RecencyList::with_capacity(2);

        let a = list.push_front("a");
        assert_eq!(list.remove(a), Some("a"));

        // Slot is reused with a new generation
        let b = list.push_front("b");
        assert_eq!(a.index, b.index);
        assert_ne!(a, b);

        assert_eq!(list.get(a), None);
        assert_eq!(list.remove(a), None);
        assert!(!list.move_to_front(a));
        assert_eq!(list.get(b), Some(&"b"));
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut list = RecencyList::with_capacity(2);

        let a = list.push_front("a");
        list.push_front("b");
        list.clear();

        assert_eq!(list.len(), 0);
        assert_eq!(list.get(a), None);
        assert_eq!(list.iter().count(), 0);

        list.push_front("c");
        assert_eq!(collect(&list), vec!["c"]);
        list.assert_consistent();
    }
}
