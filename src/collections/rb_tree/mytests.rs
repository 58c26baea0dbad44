use crate::collections::rb_tree::*;
use crate::collections::TryReserveErrorKind;
use crate::testing::alloc_test::{init_logging, CountingAlloc, FailingAlloc, Tally};

use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::panic::{catch_unwind, AssertUnwindSafe};

const REP: usize = if cfg!(miri) { 1 } else { 10 };
const N: usize = if cfg!(miri) { 100 } else { 100000 };

fn height_bound(len: usize) -> f64 {
    2.0 * ((len + 1) as f64).log2()
}

fn collect<KO, C>(tree: &RbTree<u32, KO, C>) -> Vec<u32> {
    tree.iter().copied().collect()
}

#[test]
fn insert_unique_iterates_sorted() {
    let mut tree = RbTree::new();
    for x in [5, 2, 8, 1, 9, 3] {
        assert!(tree.insert_unique(x).1);
        tree.check();
    }
    assert_eq!(collect(&tree), [1, 2, 3, 5, 8, 9]);
    assert_eq!(tree.len(), 6);
    assert_eq!(tree.first(), Some(&1));
    assert_eq!(tree.last(), Some(&9));
}

#[test]
fn insert_unique_rejects_duplicate() {
    let mut tree = RbTree::new();
    let (pos, inserted) = tree.insert_unique(5);
    assert!(inserted);
    let (again, inserted) = tree.insert_unique(5);
    assert!(!inserted);
    assert_eq!(again, pos);
    assert_eq!(tree.len(), 1);
    tree.check();
}

#[test]
fn erase_key_removes_middle() {
    let mut tree = RbTree::new();
    for x in [10, 20, 30] {
        tree.insert_unique(x);
    }
    assert_eq!(tree.erase_key(&20), 1);
    tree.check();
    assert_eq!(collect(&tree), [10, 30]);
    assert_eq!(tree.find(&20), tree.end());
    assert_eq!(tree.erase_key(&20), 0);
}

#[test]
fn multi_count_and_equal_range() {
    let mut tree = RbTree::new();
    for x in [1, 1, 1] {
        tree.insert_equal(x);
    }
    tree.check();
    assert_eq!(tree.count(&1), 3);
    let (first, last) = tree.equal_range(&1);
    assert_eq!(first, tree.begin());
    assert_eq!(last, tree.end());
    assert_eq!(tree.range(first, last).count(), 3);
    tree.erase(first);
    tree.check();
    assert_eq!(tree.count(&1), 2);
    assert_eq!(tree.count(&0), 0);
}

#[test]
fn insert_equal_appends_after_equivalent() {
    let mut tree: RbTree<(u32, char), First> = RbTree::default();
    for (i, c) in "abcdef".chars().enumerate() {
        tree.insert_equal((i as u32 % 2, c));
        tree.check();
    }
    let order: String = tree.iter().map(|&(_, c)| c).collect();
    assert_eq!(order, "acebdf");
}

#[test]
fn ascending_erase_keeps_height_bound() {
    let mut tree = RbTree::new();
    for i in 1..=1000u32 {
        tree.insert_unique(i);
    }
    tree.check();
    for i in 1..=1000u32 {
        let pos = tree.find(&i);
        assert_eq!(tree.erase(pos), i);
        tree.check();
        assert!(tree.height() as f64 <= height_bound(tree.len()));
    }
    assert!(tree.is_empty());
    assert_eq!(tree.begin(), tree.end());
}

#[test]
fn bounds() {
    let mut tree = RbTree::new();
    for x in [1, 3, 5, 7] {
        tree.insert_unique(x);
    }
    assert_eq!(tree.get(tree.lower_bound(&4)), Some(&5));
    assert_eq!(tree.get(tree.upper_bound(&5)), Some(&7));
    assert_eq!(tree.get(tree.lower_bound(&5)), Some(&5));
    assert_eq!(tree.lower_bound(&8), tree.end());
    assert_eq!(tree.upper_bound(&7), tree.end());
    assert_eq!(tree.lower_bound(&0), tree.begin());
    assert!(tree.contains(&3));
    assert!(!tree.contains(&4));
}

#[test]
fn positions_wrap_through_end() {
    let mut tree = RbTree::new();
    assert_eq!(tree.begin(), tree.end());
    assert_eq!(tree.next(tree.end()), tree.end());
    assert_eq!(tree.prev(tree.end()), tree.end());
    for x in [2, 1, 3] {
        tree.insert_unique(x);
    }
    let last = tree.prev(tree.end());
    assert_eq!(tree.get(last), Some(&3));
    assert_eq!(tree.next(last), tree.end());
    assert_eq!(tree.prev(tree.begin()), tree.end());
    assert_eq!(tree.next(tree.end()), tree.begin());
    assert_eq!(tree.get(tree.end()), None);
}

#[test]
fn positions_survive_other_erasures() {
    let mut tree = RbTree::new();
    let positions: Vec<Position> = (0..64u32).map(|i| tree.insert_unique(i).0).collect();
    for (i, &p) in positions.iter().enumerate() {
        if i % 2 == 0 {
            tree.erase(p);
        }
    }
    tree.check();
    for (i, &p) in positions.iter().enumerate() {
        if i % 2 == 1 {
            assert_eq!(tree.get(p), Some(&(i as u32)));
        } else {
            assert_eq!(tree.get(p), None);
        }
    }
}

#[test]
#[should_panic(expected = "erase requires")]
fn erase_end_panics() {
    let mut tree = RbTree::new();
    tree.insert_unique(1);
    let end = tree.end();
    tree.erase(end);
}

#[test]
#[should_panic(expected = "erase requires")]
fn erase_twice_panics() {
    let mut tree = RbTree::new();
    let (p, _) = tree.insert_unique(1);
    tree.insert_unique(2);
    tree.erase(p);
    tree.erase(p);
}

#[test]
#[should_panic(expected = "erase requires")]
fn erase_foreign_position_panics() {
    let mut a = RbTree::new();
    for i in 0..3u32 {
        a.insert_unique(i);
    }
    let mut b = RbTree::new();
    let (pb, _) = b.insert_unique(100);
    assert_eq!(a.get(pb), None);
    a.erase(pb);
}

#[test]
#[should_panic(expected = "erase requires")]
fn erase_reused_slot_position_panics() {
    let mut tree = RbTree::new();
    let (p, _) = tree.insert_unique(1);
    tree.insert_unique(2);
    tree.erase(p);
    let (q, _) = tree.insert_unique(8);
    assert_ne!(p, q);
    assert_eq!(tree.get(p), None);
    assert_eq!(tree.get(q), Some(&8));
    tree.erase(p);
}

#[test]
#[should_panic(expected = "does not refer to an element of this tree")]
fn step_from_foreign_end_panics() {
    let mut a = RbTree::new();
    a.insert_unique(1);
    let b: RbTree<u32> = RbTree::new();
    let _ = a.next(b.end());
}

#[test]
fn positions_after_clear_and_clone_are_invalid() {
    let mut tree = RbTree::new();
    let (p, _) = tree.insert_unique(5);
    let copy = tree.clone();
    assert_eq!(copy.get(p), None);
    assert_eq!(copy.get(copy.find(&5)), Some(&5));
    tree.clear();
    let (q, _) = tree.insert_unique(5);
    assert_eq!(tree.get(p), None);
    assert_eq!(tree.get(q), Some(&5));
    assert_eq!(tree.end(), tree.end());
}

#[test]
fn erase_range_and_pop() {
    let mut tree = RbTree::new();
    for i in 0..100u32 {
        tree.insert_unique(i);
    }
    tree.erase_range(tree.lower_bound(&10), tree.lower_bound(&90));
    tree.check();
    assert_eq!(tree.len(), 20);
    assert_eq!(tree.pop_first(), Some(0));
    assert_eq!(tree.pop_last(), Some(99));
    tree.check();
    tree.erase_range(tree.begin(), tree.end());
    tree.check();
    assert!(tree.is_empty());
    assert_eq!(tree.pop_first(), None);
    assert_eq!(tree.pop_last(), None);
}

#[test]
fn reverse_iteration_mirrors_forward() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut tree = RbTree::new();
    for _ in 0..500 {
        tree.insert_equal(rng.gen_range(0..100u32));
    }
    let fwd: Vec<u32> = tree.iter().copied().collect();
    let mut back: Vec<u32> = tree.iter().rev().copied().collect();
    back.reverse();
    assert_eq!(fwd, back);

    let mut by_position = Vec::new();
    let mut p = tree.end();
    while p != tree.begin() {
        p = tree.prev(p);
        by_position.push(*tree.get(p).unwrap());
    }
    by_position.reverse();
    assert_eq!(fwd, by_position);

    let mut it = tree.iter();
    assert_eq!(it.len(), 500);
    it.next();
    it.next_back();
    assert_eq!(it.len(), 498);
    assert_eq!(it.count(), 498);
}

#[test]
fn map_like_tree() {
    let mut map: RbTree<(String, u32), First> = RbTree::default();
    map.insert_unique(("France".to_string(), 1));
    map.insert_unique(("England".to_string(), 2));
    let (pos, inserted) = map.insert_unique(("France".to_string(), 3));
    assert!(!inserted);
    assert_eq!(map.get(pos), Some(&("France".to_string(), 1)));
    if let Some(v) = map.get_mut(pos) {
        v.1 = 4;
    }
    let found = map.find(&"France".to_string());
    assert_eq!(map.get(found).map(|v| v.1), Some(4));
    assert_eq!(map.first().map(|v| v.0.as_str()), Some("England"));
    map.check();
}

#[test]
fn custom_orderings() {
    let mut desc: RbTree<u32, Identity, Greater> = RbTree::default();
    let mut by_closure: RbTree<u32, Identity, _> =
        RbTree::with_compare(|a: &u32, b: &u32| a % 10 < b % 10);
    for x in [15, 3, 27, 41, 8] {
        desc.insert_unique(x);
        by_closure.insert_equal(x);
    }
    desc.check();
    by_closure.check();
    assert_eq!(collect(&desc), [41, 27, 15, 8, 3]);
    assert_eq!(collect(&by_closure), [41, 3, 15, 27, 8]);
    assert_eq!(by_closure.count(&5), 1);
    assert_eq!(by_closure.get(by_closure.find(&7)), Some(&27));
}

#[test]
fn clone_is_deep_and_independent() {
    let mut tree = RbTree::new();
    for i in (0..200u32).rev() {
        tree.insert_equal(i % 50);
    }
    let mut copy = tree.clone();
    copy.check();
    assert_eq!(copy, tree);
    assert_eq!(copy.height(), tree.height());
    copy.erase_key(&10);
    copy.insert_unique(1000);
    assert_eq!(tree.count(&10), 4);
    assert!(!tree.contains(&1000));
    tree.check();
    copy.check();
}

#[test]
fn clone_panic_releases_copies() {
    let tally = Tally::new();
    let mut tree = RbTree::new();
    for i in 0..100 {
        tree.insert_unique(tally.make(i));
    }
    tally.panic_on_clone(50);
    let result = catch_unwind(AssertUnwindSafe(|| tree.clone()));
    assert!(result.is_err());
    assert_eq!(tally.alive(), 100);
    tree.check();
    drop(tree);
    assert_eq!(tally.alive(), 0);
}

#[test]
fn clone_allocation_failure_releases_everything() {
    init_logging();
    let alloc = FailingAlloc::new(usize::MAX);
    let mut tree = RbTree::new_in(&alloc);
    for i in 0..100u32 {
        tree.insert_unique(i);
    }
    let live = alloc.live_bytes();
    alloc.set_budget(0);
    let err = tree.try_clone().unwrap_err();
    assert!(matches!(err.kind(), TryReserveErrorKind::AllocError { .. }));
    assert_eq!(alloc.live_bytes(), live);
    alloc.set_budget(usize::MAX);
    let copy = tree.try_clone().unwrap();
    copy.check();
    assert_eq!(copy, tree);
}

#[test]
fn insert_allocation_failure_leaves_tree_unchanged() {
    init_logging();
    let alloc = FailingAlloc::new(usize::MAX);
    let mut tree = RbTree::new_in(&alloc);
    for i in 0..4u32 {
        tree.insert_unique(i * 10);
    }
    assert_eq!(tree.capacity(), 4);
    alloc.set_budget(0);
    let before: Vec<u32> = tree.iter().copied().collect();
    assert!(tree.try_insert_unique(15).is_err());
    assert!(tree.try_insert_equal(15).is_err());
    assert_eq!(tree.len(), 4);
    tree.check();
    assert!(tree.iter().copied().eq(before));

    // Neither a rejected duplicate nor reuse of a released node needs storage.
    assert_eq!(tree.try_insert_unique(10).map(|(_, ins)| ins), Ok(false));
    let p = tree.find(&20);
    tree.erase(p);
    assert_eq!(tree.try_insert_unique(25).map(|(_, ins)| ins), Ok(true));
    tree.check();
    assert!(tree.try_reserve(1).is_err());
}

#[test]
fn clear_keeps_storage_and_drops_values() {
    let tally = Tally::new();
    let counter = CountingAlloc::default();
    {
        let mut tree = RbTree::new_in(&counter);
        for i in 0..1000 {
            tree.insert_unique(tally.make(i));
        }
        let allocations = counter.allocations();
        let capacity = tree.capacity();
        tree.clear();
        tree.check();
        assert_eq!(tally.alive(), 0);
        assert_eq!(tree.capacity(), capacity);
        for i in 0..1000 {
            tree.insert_unique(tally.make(i));
        }
        tree.check();
        assert_eq!(counter.allocations(), allocations);
    }
    assert_eq!(tally.alive(), 0);
    assert_eq!(counter.live_bytes(), 0);
}

#[test]
fn swap_exchanges_contents() {
    let mut a = RbTree::new();
    let mut b = RbTree::new();
    let (pa, _) = a.insert_unique(1);
    b.insert_unique(2);
    b.insert_unique(3);
    a.swap(&mut b);
    assert_eq!(collect(&a), [2, 3]);
    assert_eq!(collect(&b), [1]);
    assert_eq!(b.get(pa), Some(&1));
    a.check();
    b.check();
}

#[test]
fn into_iter_consumes_in_order() {
    let tally = Tally::new();
    let mut tree = RbTree::new();
    for i in [4, 2, 6, 1, 3, 5, 7] {
        tree.insert_unique(tally.make(i));
    }
    let mut it = tree.into_iter();
    assert_eq!(it.len(), 7);
    assert_eq!(it.next().map(|c| c.key), Some(1));
    assert_eq!(it.next_back().map(|c| c.key), Some(7));
    let rest: Vec<u32> = it.by_ref().take(2).map(|c| c.key).collect();
    assert_eq!(rest, [2, 3]);
    drop(it);
    assert_eq!(tally.alive(), 0);
}

#[test]
fn random_ops_match_std() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut tree = RbTree::new();
    let mut model = std::collections::BTreeMap::<u32, usize>::new();
    for step in 0..20000 {
        let k = rng.gen_range(0..500u32);
        match rng.gen_range(0..4) {
            0 | 1 => {
                tree.insert_equal(k);
                *model.entry(k).or_insert(0) += 1;
            }
            2 => {
                let p = tree.find(&k);
                if p != tree.end() {
                    tree.erase(p);
                    let n = model.get_mut(&k).unwrap();
                    *n -= 1;
                    if *n == 0 {
                        model.remove(&k);
                    }
                } else {
                    assert!(!model.contains_key(&k));
                }
            }
            _ => {
                assert_eq!(tree.erase_key(&k), model.remove(&k).unwrap_or(0));
            }
        }
        if step % 1000 == 0 {
            tree.check();
        }
    }
    tree.check();
    assert_eq!(tree.len(), model.values().sum::<usize>());
    for (k, &n) in &model {
        assert_eq!(tree.count(k), n);
    }
}

#[quickcheck]
fn prop_multi_ops_keep_invariants(ops: Vec<(u8, u8)>) -> bool {
    let mut tree = RbTree::new();
    let mut model = std::collections::BTreeMap::<u8, usize>::new();
    for (op, k) in ops {
        match op % 3 {
            0 => {
                tree.insert_equal(k);
                *model.entry(k).or_insert(0) += 1;
            }
            1 => {
                let p = tree.find(&k);
                if p != tree.end() {
                    tree.erase(p);
                    *model.get_mut(&k).unwrap() -= 1;
                }
            }
            _ => {
                if tree.erase_key(&k) != model.remove(&k).unwrap_or(0) {
                    return false;
                }
            }
        }
        tree.check();
        if tree.height() as f64 > height_bound(tree.len()) {
            return false;
        }
    }
    tree.len() == model.values().sum::<usize>() && model.iter().all(|(k, &n)| tree.count(k) == n)
}

#[quickcheck]
fn prop_unique_has_no_equivalent_pair(vals: Vec<u16>) -> bool {
    let mut tree = RbTree::new();
    let mut model = std::collections::BTreeSet::new();
    for v in vals {
        let (p, inserted) = tree.insert_unique(v);
        if inserted != model.insert(v) || tree.get(p) != Some(&v) {
            return false;
        }
    }
    tree.check();
    tree.iter().zip(tree.iter().skip(1)).all(|(a, b)| a < b) && tree.iter().eq(model.iter())
}

#[quickcheck]
fn prop_insert_then_erase_all_empties(vals: Vec<u32>, seed: u64) -> TestResult {
    if vals.is_empty() {
        return TestResult::discard();
    }
    let mut tree = RbTree::new();
    for &v in &vals {
        tree.insert_equal(v);
    }
    let mut order = vals.clone();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    for v in order {
        let p = tree.find(&v);
        if p == tree.end() {
            return TestResult::failed();
        }
        tree.erase(p);
        tree.check();
    }
    TestResult::from_bool(tree.is_empty() && tree.begin() == tree.end())
}

#[quickcheck]
fn prop_find_is_idempotent(vals: Vec<u8>) -> bool {
    let mut tree = RbTree::new();
    for &v in &vals {
        tree.insert_equal(v);
    }
    vals.iter().all(|v| {
        let p = tree.find(v);
        p == tree.find(v) && tree.get(p) == Some(v) && p == tree.lower_bound(v)
    })
}

#[quickcheck]
fn prop_reverse_iteration(vals: Vec<i32>) -> bool {
    let mut tree = RbTree::new();
    for v in vals {
        tree.insert_equal(v);
    }
    let mut back: Vec<&i32> = tree.iter().rev().collect();
    back.reverse();
    tree.iter().eq(back)
}

#[test]
fn exp_insert_test() {
    for _rep in 0..REP {
        let mut t = RbTree::new();
        for i in 0..N {
            t.insert_unique(i);
        }
        assert!(t.len() == N);
        if _rep == 0 {
            print_memory();
        }
    }
}

#[test]
fn std_insert_test() {
    for _rep in 0..REP {
        let mut t = std::collections::BTreeSet::new();
        for i in 0..N {
            t.insert(i);
        }
        assert!(t.len() == N);
        if _rep == 0 {
            print_memory();
        }
    }
}

#[test]
fn exp_clone_test() {
    let mut t = RbTree::new();
    for i in 0..N {
        t.insert_unique(i);
    }
    for _rep in 0..REP {
        let ct = t.clone();
        assert!(ct.len() == N);
    }
}

#[test]
fn std_clone_test() {
    let mut t = std::collections::BTreeSet::new();
    for i in 0..N {
        t.insert(i);
    }
    for _rep in 0..REP {
        let ct = t.clone();
        assert!(ct.len() == N);
    }
}
