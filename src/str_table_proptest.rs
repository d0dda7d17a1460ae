#![cfg(test)]

// Property tests for StrTable kept inside the crate so the chain layout
// (via stats) can be checked alongside the public behavior.

use crate::{InsertError, StrTable, TableFlags};
use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Replace(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Clear,
    Iterate,
}

fn arb_flags() -> impl Strategy<Value = TableFlags> {
    (any::<bool>(), any::<bool>()).prop_map(|(rehash, dups)| {
        let mut f = TableFlags::NONE;
        if rehash {
            f |= TableFlags::AUTO_REHASH;
        }
        if dups {
            f |= TableFlags::NO_DUPLICATE_CHECK;
        }
        f
    })
}

fn arb_scenario() -> impl Strategy<Value = (usize, TableFlags, Vec<String>, Vec<OpI>)> {
    let pool = proptest::collection::vec("[a-z]{0,5}", 1..=8);
    (1usize..8, arb_flags(), pool).prop_flat_map(|(cap, flags, pool)| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Replace(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80)
            .prop_map(move |ops| (cap, flags, pool.clone(), ops))
    })
}

// Property: State-machine equivalence against a model that keeps, per key,
// a stack of values (newest last) so shadowed duplicates can be tracked.
// Invariants exercised across random operation sequences:
// - Duplicate inserts fail unless NO_DUPLICATE_CHECK; then the newest wins.
// - Replace frees exactly the superseded value; clear frees every value.
// - Remove returns the newest value and never frees it.
// - `len` equals the model's entry count and the visit count of `for_each`.
// - With AUTO_REHASH the load factor never stays above 0.8.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((cap, flags, pool, ops) in arb_scenario()) {
        let freed = Rc::new(RefCell::new(Vec::new()));
        let sink = freed.clone();
        let mut sut: StrTable<'_, i32> = StrTable::builder(cap)
            .flags(flags)
            .free_fn(move |v: i32| sink.borrow_mut().push(v))
            .build()
            .unwrap();
        let mut model: HashMap<String, Vec<i32>> = HashMap::new();
        let mut model_freed: Vec<i32> = Vec::new();
        let dups = flags.contains(TableFlags::NO_DUPLICATE_CHECK);

        for op in ops {
            match op {
                OpI::Insert(i, v) => {
                    let k = &pool[i];
                    let present = model.get(k).is_some_and(|s| !s.is_empty());
                    match sut.insert(k.clone(), v) {
                        Ok(()) => {
                            prop_assert!(dups || !present, "insert must fail on duplicate");
                            model.entry(k.clone()).or_default().push(v);
                        }
                        Err(InsertError::DuplicateKey) => {
                            prop_assert!(!dups && present, "duplicate error only when key exists");
                        }
                        Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                    }
                }
                OpI::Replace(i, v) => {
                    let k = &pool[i];
                    sut.replace(k.as_str(), v).unwrap();
                    let stack = model.entry(k.clone()).or_default();
                    match stack.last_mut() {
                        Some(top) => model_freed.push(std::mem::replace(top, v)),
                        None => stack.push(v),
                    }
                }
                OpI::Remove(i) => {
                    let k = &pool[i];
                    let expected = model.get_mut(k).and_then(|s| s.pop());
                    prop_assert_eq!(sut.remove(k), expected);
                }
                OpI::Get(i) => {
                    let k = &pool[i];
                    let expected = model.get(k).and_then(|s| s.last());
                    prop_assert_eq!(sut.get(k), expected);
                }
                OpI::Contains(s) => {
                    let has_model = model.get(&s).is_some_and(|st| !st.is_empty());
                    prop_assert_eq!(sut.contains_key(&s), has_model);
                }
                OpI::Clear => {
                    let size = sut.size();
                    sut.clear();
                    for (_, stack) in model.drain() {
                        model_freed.extend(stack);
                    }
                    prop_assert_eq!(sut.size(), size);
                }
                OpI::Iterate => {
                    let mut seen: BTreeMap<Vec<u8>, Vec<i32>> = BTreeMap::new();
                    let n = sut.for_each(|k, v| seen.entry(k.to_vec()).or_default().push(*v));
                    prop_assert_eq!(n, sut.len());
                    let mut expected: BTreeMap<Vec<u8>, Vec<i32>> = BTreeMap::new();
                    for (k, stack) in &model {
                        if !stack.is_empty() {
                            // Chains list equal keys newest first.
                            expected.insert(k.as_bytes().to_vec(), stack.iter().rev().copied().collect());
                        }
                    }
                    prop_assert_eq!(seen, expected);
                }
            }

            // Post-conditions after each op
            let items: usize = model.values().map(Vec::len).sum();
            prop_assert_eq!(sut.len(), items);
            prop_assert_eq!(sut.is_empty(), items == 0);
            let mut got_freed = freed.borrow().clone();
            let mut want_freed = model_freed.clone();
            got_freed.sort_unstable();
            want_freed.sort_unstable();
            prop_assert_eq!(got_freed, want_freed);
            if flags.contains(TableFlags::AUTO_REHASH) {
                prop_assert!(sut.load_factor() <= 0.8);
            } else {
                prop_assert_eq!(sut.size(), cap);
            }
            let stats = sut.stats();
            prop_assert_eq!(stats.items, items);
            prop_assert!(stats.longest_chain <= items);
        }

        drop(sut);
        let mut remaining: Vec<i32> = model.into_values().flatten().collect();
        let mut dropped: Vec<i32> = freed.borrow()[model_freed.len()..].to_vec();
        remaining.sort_unstable();
        dropped.sort_unstable();
        prop_assert_eq!(dropped, remaining, "drop frees every remaining value once");
    }
}

// Property: a duplicated table answers every lookup like the original and
// stays independent of it.
proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]
    #[test]
    fn prop_duplicate_matches_original(
        cap in 1usize..6,
        entries in proptest::collection::btree_map("[a-z]{0,4}", any::<i32>(), 0..24),
    ) {
        let mut t: StrTable<'_, i32> = StrTable::builder(cap)
            .flags(TableFlags::AUTO_REHASH)
            .build()
            .unwrap();
        for (k, v) in &entries {
            t.insert(k.as_str(), *v).unwrap();
        }
        let mut d = t.duplicate(|v| v.wrapping_neg()).unwrap();
        prop_assert_eq!(d.size(), t.size());
        prop_assert_eq!(d.len(), t.len());
        prop_assert_eq!(d.keys(), t.keys());
        for (k, v) in &entries {
            prop_assert_eq!(d.get(k), Some(&v.wrapping_neg()));
        }
        d.clear();
        prop_assert_eq!(t.len(), entries.len());
    }
}
