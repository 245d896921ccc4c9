//! Typed allocation through PoolBox.

use std::sync::atomic::{AtomicUsize, Ordering};

use slotpool::{AllocError, PoolBox, SizeClassRegistry};

#[test]
fn construct_read_modify() {
    let registry = SizeClassRegistry::new();
    let mut boxed = PoolBox::new_in(String::from("hello"), &registry).unwrap();
    assert_eq!(&*boxed, "hello");
    boxed.push_str(", world");
    assert_eq!(&*boxed, "hello, world");
}

#[test]
fn destructor_runs_on_drop() {
    static DROPS: AtomicUsize = AtomicUsize::new(0);

    struct Tracked(#[allow(dead_code)] u64);
    impl Drop for Tracked {
        fn drop(&mut self) {
            DROPS.fetch_add(1, Ordering::SeqCst);
        }
    }

    let registry = SizeClassRegistry::new();
    {
        let _a = PoolBox::new_in(Tracked(1), &registry).unwrap();
        let _b = PoolBox::new_in(Tracked(2), &registry).unwrap();
        assert_eq!(DROPS.load(Ordering::SeqCst), 0);
    }
    assert_eq!(DROPS.load(Ordering::SeqCst), 2);
}

#[test]
fn slot_is_recycled_for_the_next_value() {
    let registry = SizeClassRegistry::new();

    let first = PoolBox::new_in(0xAAAA_AAAAu64, &registry).unwrap();
    let first_addr = &raw const *first as usize;
    drop(first);

    let second = PoolBox::new_in(0x5555_5555u64, &registry).unwrap();
    let second_addr = &raw const *second as usize;
    assert_eq!(first_addr, second_addr);
    assert_eq!(*second, 0x5555_5555);
}

#[test]
fn into_inner_transfers_ownership() {
    let registry = SizeClassRegistry::new();
    let boxed = PoolBox::new_in(vec![1, 2, 3], &registry).unwrap();
    let vec = boxed.into_inner();
    assert_eq!(vec, [1, 2, 3]);
}

#[test]
fn values_larger_than_any_class_still_work() {
    let registry = SizeClassRegistry::new();
    let boxed = PoolBox::new_in([0xABu8; 1024], &registry).unwrap();
    assert_eq!(boxed[1023], 0xAB);
}

#[test]
fn oversize_overalignment_is_an_error() {
    #[derive(Debug)]
    #[repr(align(128))]
    struct Wide([u8; 1024]);

    let registry = SizeClassRegistry::new();
    let err = PoolBox::new_in(Wide([0; 1024]), &registry).unwrap_err();
    assert!(matches!(err, AllocError::InvalidAlignment { required: 128, .. }));
}

#[test]
fn global_registry_boxes_have_static_lifetime() {
    fn make() -> PoolBox<'static, u32> {
        PoolBox::new(7).unwrap()
    }
    let boxed = make();
    assert_eq!(*boxed, 7);
}

#[test]
fn display_and_debug_pass_through() {
    let registry = SizeClassRegistry::new();
    let boxed = PoolBox::new_in(42u32, &registry).unwrap();
    assert_eq!(format!("{boxed}"), "42");
    assert_eq!(format!("{boxed:?}"), "42");
}
