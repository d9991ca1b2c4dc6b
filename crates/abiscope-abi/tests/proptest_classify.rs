//! Property-based tests for the classifier algebra and the allocator.

use proptest::prelude::*;

use abiscope_abi::{merge, post_merge, RegisterAllocator, RegisterClass};

const CLASSES: [RegisterClass; 8] = [
    RegisterClass::Integer,
    RegisterClass::Sse,
    RegisterClass::SseUp,
    RegisterClass::X87,
    RegisterClass::X87Up,
    RegisterClass::ComplexX87,
    RegisterClass::NoClass,
    RegisterClass::Memory,
];

fn any_class() -> impl Strategy<Value = RegisterClass> {
    (0..CLASSES.len()).prop_map(|i| CLASSES[i])
}

proptest! {
    /// merge(a, b) == merge(b, a) for all pairs.
    #[test]
    fn merge_is_commutative(a in any_class(), b in any_class()) {
        prop_assert_eq!(merge(a, b), merge(b, a));
    }

    /// merge(a, a) == a.
    #[test]
    fn merge_is_idempotent(a in any_class()) {
        prop_assert_eq!(merge(a, a), a);
    }

    /// MEMORY absorbs everything; NO_CLASS is the identity.
    #[test]
    fn merge_units(a in any_class()) {
        prop_assert_eq!(merge(RegisterClass::Memory, a), RegisterClass::Memory);
        prop_assert_eq!(merge(RegisterClass::NoClass, a), a);
    }

    /// post_merge(MEMORY, x, s) forces both sides to MEMORY.
    #[test]
    fn post_merge_memory_wins(x in any_class(), size in 0i64..256) {
        let mut lo = RegisterClass::Memory;
        let mut hi = x;
        post_merge(&mut lo, &mut hi, size);
        prop_assert_eq!(lo, RegisterClass::Memory);
        prop_assert_eq!(hi, RegisterClass::Memory);
    }

    /// After cleanup, an SSEUP hi is always preceded by SSE or SSEUP.
    #[test]
    fn post_merge_leaves_no_orphan_sseup(a in any_class(), b in any_class(), size in 0i64..256) {
        let mut lo = a;
        let mut hi = b;
        post_merge(&mut lo, &mut hi, size);
        if hi == RegisterClass::SseUp {
            prop_assert!(matches!(lo, RegisterClass::Sse | RegisterClass::SseUp));
        }
    }

    /// The framebase cursor never moves backwards, every spilled slot is
    /// 8-aligned, and every location is a register or a framebase slot.
    #[test]
    fn allocator_cursor_is_monotonic(sizes in prop::collection::vec(1i64..64, 1..24)) {
        let mut allocator = RegisterAllocator::new();
        let mut last = allocator.framebase_cursor();
        for size in sizes {
            let location = allocator
                .register_for(RegisterClass::Integer, RegisterClass::NoClass, size, "Integer")
                .unwrap();
            if let Some(offset) = location.strip_prefix("framebase+") {
                let offset: i64 = offset.parse().unwrap();
                prop_assert_eq!(offset % 8, 0);
                prop_assert!(offset >= 8);
            } else {
                prop_assert!(location.starts_with('%'));
            }
            let cursor = allocator.framebase_cursor();
            prop_assert!(cursor >= last);
            last = cursor;
        }
    }
}
