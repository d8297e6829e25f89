// SPDX-License-Identifier: MIT

mod common;

use common::*;
use vsfs::prelude::*;

#[test]
fn every_single_bit_flip_is_caught() {
    let mut fx = Fixture::new();
    assert!(fx.check().is_ok());

    for block in fx.meta.data_blocks() {
        let was_set = fx.bit(block);
        fx.toggle_bit(block);

        let expected = if was_set {
            FsckError::UnmarkedInUse { block }
        } else {
            FsckError::AllocatedButUnused { block }
        };
        assert_eq!(fx.check().unwrap_err(), expected, "block {block}");

        fx.toggle_bit(block);
    }
    assert!(fx.check().is_ok());
}

#[test]
fn metadata_bits_are_ignored() {
    let mut fx = Fixture::new();
    for block in 0..fx.meta.data_start {
        fx.toggle_bit(block);
    }
    assert!(fx.check().is_ok());
}

#[test]
fn repeated_runs_agree() {
    let mut clean = Fixture::new();
    let first = clean.check().map(|r| r.to_string());
    let second = clean.check().map(|r| r.to_string());
    assert!(first.is_ok());
    assert_eq!(first, second);

    let mut broken = Fixture::new();
    let spare = broken.meta.size - 2;
    broken.toggle_bit(spare);
    assert_eq!(broken.check().unwrap_err(), broken.check().unwrap_err());
}

#[test]
fn checker_never_writes() {
    for corrupt in [false, true] {
        let mut fx = Fixture::new();
        if corrupt {
            let small = fx.small;
            let mut inode = fx.inode(small);
            inode.set_addr(0, 0);
            fx.put_inode(small, &inode);
        }
        let before = fx.buf.clone();
        let meta = fx.meta;

        let mut mem = fx.io();
        let mut io = IOCounter::new(&mut mem);
        let res = VsfsChecker::new(&mut io, &meta).check_all();
        assert_eq!(res.is_err(), corrupt);

        let stats = io.snapshot();
        assert_eq!(stats.writes, 0);
        assert_eq!(stats.flushes, 0);
        assert!(stats.reads > 0);
        assert_eq!(stats.max_read, BSIZE as u64);
        drop(mem);
        assert!(fx.buf == before);
    }
}

#[test]
fn deep_tree_is_clean() {
    let meta = VsfsMeta::for_image(2048, 256).unwrap();
    let mut buf = vec![0u8; meta.size_bytes() as usize];
    {
        let mut io = MemBlockIO::new(&mut buf);
        VsfsFormatter::new(&mut io, &meta).format().unwrap();
        let mut inj = VsfsInjector::new(&mut io, &meta);

        let mut parent = ROOT_INO;
        for depth in 0..20 {
            let name = format!("d{depth}");
            parent = inj.mkdir(parent, name.as_bytes()).unwrap();
            for i in 0..5 {
                let file = format!("f{i}");
                let data = vec![depth as u8; i * 300];
                inj.create_file(parent, file.as_bytes(), &data).unwrap();
            }
        }
    }
    check_image(&mut buf).unwrap();
}
