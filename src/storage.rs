//! Small-buffer-optimized storage for a type-erased adapter.
//!
//! Every container owns one [`AdapterSlot`]: a fixed-size inline buffer, an
//! explicit placement tag and a fat pointer to the active adapter. Adapters
//! that fit the buffer's size and alignment are constructed in place and cost
//! no allocation; everything else is boxed. The tag is the sole discriminant
//! for which storage is active. It is set on every transition and never
//! inferred from pointer comparisons.
//!
//! This module contains all of the crate's unsafe code.

use core::mem::{self, MaybeUninit};
use core::ptr::{self, NonNull};

/// Bytes of inline adapter storage carried by every container.
///
/// Three pointer-words: enough for the common adapters (a slice cursor, a
/// borrowed collection reference, a fused slice iterator) without making the
/// containers bulky to move around.
pub(crate) const INLINE_SIZE: usize = 3 * mem::size_of::<usize>();

/// The inline buffer. Alignment is fixed at 16 so that adapters containing
/// `u128` or pointer-heavy iterators qualify for inline placement; anything
/// with a larger alignment requirement is routed to the heap.
#[repr(C, align(16))]
struct InlineBuffer {
    bytes: [MaybeUninit<u8>; INLINE_SIZE],
}

impl InlineBuffer {
    const fn new() -> Self {
        Self {
            bytes: [MaybeUninit::uninit(); INLINE_SIZE],
        }
    }
}

/// Where the adapter currently lives.
///
/// For `Inline`, the fat pointer was created against the buffer's address at
/// bind time. Moving the slot moves the buffer, so only the metadata half of
/// the pointer stays trustworthy; the address half is re-derived from the
/// buffer's current location on every access. This is the same fixup that
/// small-box style crates perform on stable Rust, where fat-pointer metadata
/// cannot be detached and reattached directly.
enum Placement<Dyn: ?Sized> {
    Empty,
    Inline(NonNull<Dyn>),
    Heap(NonNull<Dyn>),
}

impl<Dyn: ?Sized> Clone for Placement<Dyn> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Dyn: ?Sized> Copy for Placement<Dyn> {}

/// Owner of one type-erased adapter, stored inline when it fits.
///
/// Invariant: exactly one of {empty, inline-active, heap-active} holds at any
/// time. An inline-active slot's buffer holds a fully constructed adapter
/// whose destructor has not yet run; a heap-active slot's pointer came from
/// `Box::into_raw` and is freed exactly once, in [`clear`](Self::clear).
pub(crate) struct AdapterSlot<Dyn: ?Sized> {
    placement: Placement<Dyn>,
    buffer: InlineBuffer,
}

impl<Dyn: ?Sized> AdapterSlot<Dyn> {
    /// An unbound slot. Operations on it observe `None`.
    pub(crate) const fn empty() -> Self {
        Self {
            placement: Placement::Empty,
            buffer: InlineBuffer::new(),
        }
    }

    /// Whether a concrete adapter type qualifies for inline placement.
    fn fits_inline<A>() -> bool {
        mem::size_of::<A>() <= INLINE_SIZE && mem::align_of::<A>() <= mem::align_of::<InlineBuffer>()
    }

    /// Places `adapter` in the slot, tearing down any previous binding first.
    ///
    /// `unsize` must be the identity unsizing cast `|p| p as *mut Dyn`; it is
    /// passed as a function pointer because the coercion from the concrete
    /// adapter type to the trait object can only be written where `A` is
    /// known.
    pub(crate) fn bind<A>(&mut self, adapter: A, unsize: fn(*mut A) -> *mut Dyn) {
        self.clear();

        if Self::fits_inline::<A>() {
            let dst = self.buffer.bytes.as_mut_ptr() as *mut A;
            // Safety: `fits_inline` checked size and alignment against the
            // buffer, the buffer is uniquely borrowed, and `clear` left it
            // logically uninitialized.
            unsafe { ptr::write(dst, adapter) };
            // Safety: `dst` points into a field of `self`, so it is non-null.
            self.placement = Placement::Inline(unsafe { NonNull::new_unchecked(unsize(dst)) });
        } else {
            let raw = Box::into_raw(Box::new(adapter));
            // Safety: `Box::into_raw` never returns null.
            self.placement = Placement::Heap(unsafe { NonNull::new_unchecked(unsize(raw)) });
        }
    }

    /// Rebuilds an inline fat pointer against the buffer's current address.
    ///
    /// Only the metadata half (the vtable) of the stored pointer is kept; the
    /// address half is overwritten with a pointer freshly derived from the
    /// buffer this slot owns *now*, which may differ from the one it owned at
    /// bind time if the slot has been moved. Deriving the address from the
    /// buffer, rather than adjusting the stale pointer, gives the result the
    /// current allocation's provenance.
    fn refreshed(&mut self, stale: NonNull<Dyn>) -> NonNull<Dyn> {
        let mut fixed = stale.as_ptr();
        // Safety: a fat raw pointer stores its address in the leading
        // pointer-sized word; writing that word retargets the address and
        // leaves the metadata untouched.
        unsafe {
            ptr::write(
                &mut fixed as *mut *mut Dyn as *mut *mut u8,
                self.buffer.bytes.as_mut_ptr() as *mut u8,
            );
        }
        // Safety: the address half now points at a field of `self` and is
        // therefore non-null.
        unsafe { NonNull::new_unchecked(fixed) }
    }

    /// Returns the active adapter, or `None` for an empty slot.
    pub(crate) fn get_mut(&mut self) -> Option<&mut Dyn> {
        match self.placement {
            Placement::Empty => None,
            Placement::Inline(stale) => {
                let fresh = self.refreshed(stale);
                // Safety: the inline invariant guarantees a live adapter in
                // the buffer, and `&mut self` makes this access unique.
                Some(unsafe { &mut *fresh.as_ptr() })
            }
            // Safety: heap placements point at a live boxed adapter owned
            // exclusively by this slot.
            Placement::Heap(adapter) => Some(unsafe { &mut *adapter.as_ptr() }),
        }
    }

    /// Destroys the active adapter, if any, and leaves the slot empty.
    pub(crate) fn clear(&mut self) {
        match mem::replace(&mut self.placement, Placement::Empty) {
            Placement::Empty => {}
            Placement::Inline(stale) => {
                let fresh = self.refreshed(stale);
                // Safety: the adapter was constructed in the buffer by `bind`
                // and has not been destroyed; the tag is already `Empty`, so
                // no second drop can happen.
                unsafe { ptr::drop_in_place(fresh.as_ptr()) };
            }
            Placement::Heap(adapter) => {
                // Safety: the pointer came from `Box::into_raw` in `bind` and
                // is released exactly here.
                drop(unsafe { Box::from_raw(adapter.as_ptr()) });
            }
        }
    }

    pub(crate) fn is_bound(&self) -> bool {
        !matches!(self.placement, Placement::Empty)
    }

    pub(crate) fn is_inline(&self) -> bool {
        matches!(self.placement, Placement::Inline(_))
    }
}

impl<Dyn: ?Sized> Drop for AdapterSlot<Dyn> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    trait Op {
        fn poke(&mut self) -> u32;
    }

    struct Small {
        hits: u32,
        drops: Rc<Cell<u32>>,
    }

    impl Op for Small {
        fn poke(&mut self) -> u32 {
            self.hits += 1;
            self.hits
        }
    }

    impl Drop for Small {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    struct Large {
        _pad: [u64; 8],
        hits: u32,
        drops: Rc<Cell<u32>>,
    }

    impl Op for Large {
        fn poke(&mut self) -> u32 {
            self.hits += 1;
            self.hits
        }
    }

    impl Drop for Large {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn small_slot(drops: &Rc<Cell<u32>>) -> AdapterSlot<dyn Op> {
        let mut slot = AdapterSlot::empty();
        slot.bind(
            Small {
                hits: 0,
                drops: Rc::clone(drops),
            },
            |p| p as *mut dyn Op,
        );
        slot
    }

    #[test]
    fn test_empty_slot_yields_nothing() {
        let mut slot: AdapterSlot<dyn Op> = AdapterSlot::empty();
        assert!(!slot.is_bound());
        assert!(!slot.is_inline());
        assert!(slot.get_mut().is_none());
    }

    #[test]
    fn test_small_adapter_is_placed_inline() {
        let drops = Rc::new(Cell::new(0));
        let mut slot = small_slot(&drops);

        assert!(slot.is_bound());
        assert!(slot.is_inline());
        assert_eq!(slot.get_mut().unwrap().poke(), 1);
        assert_eq!(slot.get_mut().unwrap().poke(), 2);
    }

    #[test]
    fn test_large_adapter_spills_to_heap() {
        let drops = Rc::new(Cell::new(0));
        let mut slot: AdapterSlot<dyn Op> = AdapterSlot::empty();
        slot.bind(
            Large {
                _pad: [0; 8],
                hits: 0,
                drops: Rc::clone(&drops),
            },
            |p| p as *mut dyn Op,
        );

        assert!(slot.is_bound());
        assert!(!slot.is_inline());
        assert_eq!(slot.get_mut().unwrap().poke(), 1);

        drop(slot);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_overaligned_adapter_spills_to_heap() {
        #[repr(align(64))]
        struct OverAligned(u8);

        impl Op for OverAligned {
            fn poke(&mut self) -> u32 {
                self.0 as u32
            }
        }

        let mut slot: AdapterSlot<dyn Op> = AdapterSlot::empty();
        slot.bind(OverAligned(9), |p| p as *mut dyn Op);

        assert!(!slot.is_inline());
        assert_eq!(slot.get_mut().unwrap().poke(), 9);
    }

    #[test]
    fn test_inline_adapter_survives_a_move() {
        let drops = Rc::new(Cell::new(0));
        let mut slot = small_slot(&drops);
        assert_eq!(slot.get_mut().unwrap().poke(), 1);

        // Moving the slot moves the buffer; the fat pointer must be
        // retargeted at the new location on the next access.
        let mut moved = slot;
        assert!(moved.is_inline());
        assert_eq!(moved.get_mut().unwrap().poke(), 2);

        drop(moved);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_inline_adapter_survives_moving_into_a_box() {
        // The slot is bound in this frame, then moved into a heap
        // allocation; every later access must go through a pointer derived
        // from the buffer's new home, not the dead stack slot.
        let drops = Rc::new(Cell::new(0));
        let mut boxed = Box::new(small_slot(&drops));
        assert!(boxed.is_inline());
        assert_eq!(boxed.get_mut().unwrap().poke(), 1);

        let mut back_out = *boxed;
        assert_eq!(back_out.get_mut().unwrap().poke(), 2);

        drop(back_out);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_inline_adapter_returned_from_a_function_still_works() {
        let drops = Rc::new(Cell::new(0));
        let mut slot = small_slot(&drops);
        assert_eq!(slot.get_mut().unwrap().poke(), 1);
    }

    #[test]
    fn test_drop_runs_the_inline_destructor_once() {
        let drops = Rc::new(Cell::new(0));
        let slot = small_slot(&drops);
        assert_eq!(drops.get(), 0);
        drop(slot);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_rebind_destroys_the_previous_adapter() {
        let first_drops = Rc::new(Cell::new(0));
        let second_drops = Rc::new(Cell::new(0));

        let mut slot = small_slot(&first_drops);
        slot.bind(
            Small {
                hits: 10,
                drops: Rc::clone(&second_drops),
            },
            |p| p as *mut dyn Op,
        );

        assert_eq!(first_drops.get(), 1);
        assert_eq!(second_drops.get(), 0);
        assert_eq!(slot.get_mut().unwrap().poke(), 11);

        drop(slot);
        assert_eq!(second_drops.get(), 1);
    }

    #[test]
    fn test_clear_leaves_the_slot_empty() {
        let drops = Rc::new(Cell::new(0));
        let mut slot = small_slot(&drops);

        slot.clear();
        assert_eq!(drops.get(), 1);
        assert!(!slot.is_bound());
        assert!(slot.get_mut().is_none());

        // Clearing an empty slot is a no-op.
        slot.clear();
        assert_eq!(drops.get(), 1);
    }
}
