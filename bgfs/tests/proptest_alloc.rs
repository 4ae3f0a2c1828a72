// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use bgfs::ext::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Create(u8, usize),
    Delete(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0_u8..24, 0_usize..400).prop_map(|(n, len)| Op::Create(n, len)),
        1 => (0_u8..24).prop_map(Op::Delete),
    ]
}

fn run_ops<A: ExtentAllocator>(allocator: A, ops: Vec<Op>) -> Result<(), TestCaseError> {
    // 3 groups of 20 blocks x 16 bytes, 8 inodes each
    let meta = ExtMeta::new_custom(60 * 16 + 7, 16, 3, 8).unwrap();
    let mut buf = vec![0u8; meta.volume_size_bytes as usize];
    let mut io = MemBgIO::new(&mut buf);
    let mut table = ExtFileTable::format_with(&mut io, &meta, allocator, false).unwrap();
    let mut model: BTreeMap<String, Vec<u8>> = BTreeMap::new();

    for (step, op) in ops.into_iter().enumerate() {
        match op {
            Op::Create(n, len) => {
                let name = format!("file{n}");
                let content: Vec<u8> = (0..len).map(|i| (i + step) as u8).collect();
                match table.create(&name, &content) {
                    Ok(_) => {
                        prop_assert!(!model.contains_key(&name));
                        model.insert(name, content);
                    }
                    Err(FsTableError::AlreadyExists) => prop_assert!(model.contains_key(&name)),
                    Err(e) => prop_assert!(
                        e.is_exhausted(),
                        "unexpected error {}",
                        e
                    ),
                }
            }
            Op::Delete(n) => {
                let name = format!("file{n}");
                prop_assert_eq!(table.delete(&name), model.remove(&name).is_some());
            }
        }

        // Capacity conservation after every step
        let owned: u64 = table.files().map(|(_, i)| i.block_count()).sum();
        prop_assert_eq!(table.used_blocks(), owned);
        prop_assert_eq!(table.len(), model.len());
    }

    for (name, content) in &model {
        let stored = table.read(name).unwrap();
        prop_assert_eq!(stored.as_ref(), Some(content));
    }
    let rep = table.check().unwrap();
    prop_assert!(rep.ok(), "{}", rep);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn smart_fit_sequences_conserve_capacity(ops in proptest::collection::vec(op(), 1..120)) {
        run_ops(SmartFitAllocator, ops)?;
    }

    #[test]
    fn worst_fit_sequences_conserve_capacity(ops in proptest::collection::vec(op(), 1..120)) {
        run_ops(WorstFitAllocator, ops)?;
    }

    #[test]
    fn round_trip_any_content(content in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let meta = ExtMeta::new_custom(4096, 32, 2, 4).unwrap();
        let mut buf = vec![0xFFu8; 4096];
        let mut io = MemBgIO::new(&mut buf);
        let mut table = ExtFileTable::format(&mut io, &meta).unwrap();

        table.create("blob", &content).unwrap();
        prop_assert_eq!(table.read("blob").unwrap(), Some(content.clone()));
        let inode = table.stat("blob").unwrap();
        prop_assert_eq!(inode.block_count(), meta.blocks_for(content.len() as u64));
    }
}
