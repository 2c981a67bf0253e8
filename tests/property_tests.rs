use proptest::prelude::*;
use sqrtarray::ExtendibleArray;

#[derive(Clone, Debug)]
enum Op {
    Push(u32),
    Pop,
    Set(usize, u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<u32>().prop_map(Op::Push),
        2 => Just(Op::Pop),
        1 => (any::<usize>(), any::<u32>()).prop_map(|(i, v)| Op::Set(i, v)),
    ]
}

/// Check the space bound for an array holding `n` elements.
fn assert_space_bound<T>(sut: &ExtendibleArray<T>) -> Result<(), TestCaseError> {
    let n = sut.len();
    let shape = sut.shape();
    let b = shape.buffer_capacity();
    prop_assert!(sut.capacity() - n <= 2 * b);
    prop_assert!(b * b <= 8 * n + 16 * b);
    prop_assert!(shape.directory_capacity() <= b);
    Ok(())
}

proptest! {
    #[test]
    fn test_random_ops_match_vec(
        ops in prop::collection::vec(op_strategy(), 1..2000),
    ) {
        let mut sut: ExtendibleArray<u32> = ExtendibleArray::new();
        let mut model: Vec<u32> = Vec::new();

        for op in ops {
            match op {
                Op::Push(value) => {
                    sut.push(value);
                    model.push(value);
                }
                Op::Pop => {
                    prop_assert_eq!(sut.pop(), model.pop());
                }
                Op::Set(index, value) => {
                    if model.is_empty() {
                        prop_assert!(sut.set(index, value).is_err());
                    } else {
                        let index = index % model.len();
                        let old = sut.set(index, value);
                        prop_assert_eq!(old, Ok(model[index]));
                        model[index] = value;
                        prop_assert_eq!(sut.get(index), Some(&value));
                    }
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.check_invariants(), Ok(()));
            prop_assert_eq!(sut.get(model.len()), None);
            if let Some(last) = model.last() {
                prop_assert_eq!(sut.get(model.len() - 1), Some(last));
            }
            assert_space_bound(&sut)?;
        }

        for (idx, expected) in model.iter().enumerate() {
            prop_assert_eq!(&sut[idx], expected);
        }
    }

    #[test]
    fn test_lifo_order(count in 0..2000usize) {
        let mut sut: ExtendibleArray<usize> = ExtendibleArray::new();
        for value in 0..count {
            sut.push(value);
        }
        prop_assert_eq!(sut.len(), count);
        for value in (0..count).rev() {
            prop_assert_eq!(sut.get(sut.len() - 1), Some(&value));
            prop_assert_eq!(sut.pop(), Some(value));
            prop_assert_eq!(sut.check_invariants(), Ok(()));
        }
        prop_assert!(sut.is_empty());
        prop_assert_eq!(sut.pop(), None);
    }

    #[test]
    fn test_sawtooth_across_boundaries(
        peak in 1..3000usize,
        wobble in 1..64usize,
        rounds in 1..8usize,
    ) {
        // climb to a peak, then repeatedly drop and recover around it so that
        // the length crosses buffer and directory boundaries in both directions
        let mut sut: ExtendibleArray<usize> = ExtendibleArray::new();
        for value in 0..peak {
            sut.push(value);
        }
        for _ in 0..rounds {
            let low = peak.saturating_sub(wobble);
            while sut.len() > low {
                let expected = sut.len() - 1;
                prop_assert_eq!(sut.pop(), Some(expected));
                prop_assert_eq!(sut.check_invariants(), Ok(()));
            }
            for value in low..peak {
                sut.push(value);
                prop_assert_eq!(sut.check_invariants(), Ok(()));
            }
        }
        for idx in 0..peak {
            prop_assert_eq!(sut[idx], idx);
        }
    }

    #[test]
    fn test_clone_independence(
        values in prop::collection::vec(any::<u16>(), 0..500),
        pops in 0..100usize,
    ) {
        let mut source: ExtendibleArray<u16> = values.iter().copied().collect();
        for _ in 0..pops.min(values.len()) {
            source.pop();
        }
        let remaining = source.len();
        let mut copy = source.clone();
        prop_assert_eq!(copy.shape(), source.shape());
        prop_assert_eq!(copy.check_invariants(), Ok(()));

        copy.push(7);
        if remaining > 0 {
            copy.set(0, values[0].wrapping_add(1)).unwrap();
        }
        prop_assert_eq!(source.len(), remaining);
        for idx in 0..remaining {
            prop_assert_eq!(source[idx], values[idx]);
        }

        source.clear();
        prop_assert_eq!(copy.len(), remaining + 1);
        prop_assert_eq!(copy[remaining], 7);
    }
}

#[test]
fn test_boundary_multiples() {
    // stop at exact multiples of the buffer capacity and step across them
    let mut sut: ExtendibleArray<usize> = ExtendibleArray::new();
    for value in 0..2048 {
        sut.push(value);
        let cap = sut.shape().buffer_capacity();
        if sut.len() % cap == 0 {
            assert_eq!(sut.pop(), Some(value));
            assert_eq!(sut.check_invariants(), Ok(()));
            sut.push(value);
            assert_eq!(sut.check_invariants(), Ok(()));
        }
    }
    while !sut.is_empty() {
        let cap = sut.shape().buffer_capacity();
        if sut.len() % cap == 0 {
            let top = sut.len() - 1;
            assert_eq!(sut.pop(), Some(top));
            sut.push(top);
            assert_eq!(sut.check_invariants(), Ok(()));
        }
        sut.pop();
        assert_eq!(sut.check_invariants(), Ok(()));
    }
}

#[test]
fn test_push_pop_tail_workload() {
    // push one, read a few, then pop and restore a √limit sized tail
    let limit = 20_000usize;
    let little_max = (limit as f64).sqrt() as usize;
    let mut sut: ExtendibleArray<usize> = ExtendibleArray::new();
    let mut seed = 0x2545_f491_4f6c_dd1du64;
    for i in 0..limit {
        sut.push(i);
        assert_eq!(sut.len(), i + 1);
        for _ in 0..=((i as f64).sqrt() as usize).min(8) {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let k = (seed % sut.len() as u64) as usize;
            assert_eq!(sut[k], k);
        }
        let little = little_max.min(i);
        for _ in 0..=little {
            sut.pop();
        }
        for j in (i - little)..=i {
            sut.push(j);
        }
    }
    assert_eq!(sut.len(), limit);
}
