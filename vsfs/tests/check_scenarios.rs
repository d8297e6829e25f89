// SPDX-License-Identifier: MIT

mod common;

use common::*;
use vsfs::prelude::*;

#[test]
fn reference_image_is_clean() {
    let (_, mut buf) = scenario_a();
    let rep = check_image(&mut buf).expect("reference image rejected");
    assert!(!rep.has_warnings());
}

#[test]
fn cleared_root_bit_is_unmarked_in_use() {
    let (meta, mut buf) = scenario_a();
    toggle_bit(&mut buf, &meta, 29);
    assert_eq!(
        check_image(&mut buf).unwrap_err(),
        FsckError::UnmarkedInUse { block: 29 }
    );
}

#[test]
fn address_one_past_the_end_is_bad() {
    let (meta, mut buf) = scenario_a();
    {
        let mut io = MemBlockIO::new(&mut buf);
        let mut file = DInode::new(InodeType::File, 1);
        file.set_addr(0, meta.size);
        io.write_struct(meta.inode_offset(2), &file).unwrap();
    }
    assert_eq!(
        check_image(&mut buf).unwrap_err(),
        FsckError::BadBlockAddress {
            inum: 2,
            block: 1024,
            indirect: false
        }
    );
}

#[test]
fn populated_image_is_clean() {
    let mut fx = Fixture::new();
    let meta = fx.meta;
    let mut io = fx.io();
    let mut checker = VsfsChecker::new(&mut io, &meta);
    let rep = checker.check_all().expect("populated image rejected");

    let stats = checker.stats();
    assert_eq!(stats.inodes_checked, 6);
    assert_eq!(stats.dirs_visited, 3);
    assert_eq!(stats.files_found, 2);
    assert_eq!(stats.devices_found, 1);
    // 3 dir blocks, 1 small, 16 big data blocks + its indirect block
    assert_eq!(stats.blocks_referenced, 3 + 1 + NDIRECT + 4 + 1);
    // a, b, console, alias in root; small in a; big in b
    assert_eq!(stats.entries_scanned, 6);

    let walk = rep.find("WALK").expect("walk summary");
    assert!(walk.msg.contains("6 inodes in use"), "{}", walk.msg);
}

#[test]
fn zero_nlink_counts_as_one() {
    let mut fx = Fixture::new();
    let mut dev = fx.inode(fx.dev);
    dev.set_nlink(0);
    fx.put_inode(fx.dev, &dev);
    fx.check().expect("nlink 0 with one name should pass");

    dev.set_nlink(-3);
    fx.put_inode(fx.dev, &dev);
    fx.check().expect("negative nlink with one name should pass");
}

#[test]
fn file_backed_image() {
    use std::io::Write;

    let mut fx = Fixture::new();
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&fx.buf).unwrap();

    let mut io = StdBlockIO::new(&mut file);
    let meta = VsfsMeta::from_io(&mut io).unwrap();
    assert_eq!(meta, fx.meta);
    VsfsChecker::new(&mut io, &meta).check_all().unwrap();

    // Same verdict as the in-memory copy
    assert!(fx.check().is_ok());
}
