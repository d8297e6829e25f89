// SPDX-License-Identifier: MIT
#![allow(dead_code)]

use vsfs::prelude::*;
use zerocopy::IntoBytes;

/// Formatted image with a small tree:
///
/// ```text
/// /            inode 1
/// /a/          dir
/// /a/small     5-byte file, also linked as /alias
/// /b/          dir
/// /b/big       file spilling into the indirect block
/// /console     device
/// ```
pub struct Fixture {
    pub meta: VsfsMeta,
    pub buf: Vec<u8>,
    pub dir_a: u32,
    pub dir_b: u32,
    pub small: u32,
    pub big: u32,
    pub dev: u32,
}

impl Fixture {
    pub fn new() -> Self {
        let meta = VsfsMeta::for_image(512, 64).expect("layout");
        let mut buf = vec![0u8; meta.size_bytes() as usize];

        let mut io = MemBlockIO::new(&mut buf);
        VsfsFormatter::new(&mut io, &meta).format().expect("format");
        let mut inj = VsfsInjector::new(&mut io, &meta);
        let dir_a = inj.mkdir(ROOT_INO, b"a").expect("mkdir a");
        let dir_b = inj.mkdir(ROOT_INO, b"b").expect("mkdir b");
        let small = inj.create_file(dir_a, b"small", b"hello").expect("small");
        let big_data: Vec<u8> = (0..(NDIRECT + 4) * BSIZE).map(|i| (i % 251) as u8).collect();
        let big = inj.create_file(dir_b, b"big", &big_data).expect("big");
        let dev = inj.mknod(ROOT_INO, b"console", 1, 1).expect("mknod");
        inj.link(ROOT_INO, b"alias", small).expect("link");

        Self {
            meta,
            buf,
            dir_a,
            dir_b,
            small,
            big,
            dev,
        }
    }

    pub fn io(&mut self) -> MemBlockIO<'_> {
        MemBlockIO::new(&mut self.buf)
    }

    pub fn check(&mut self) -> FsckResult<VerifyReport> {
        check_image(&mut self.buf)
    }

    pub fn inode(&mut self, inum: u32) -> DInode {
        let off = self.meta.inode_offset(inum);
        self.io().read_struct(off).expect("read inode")
    }

    pub fn put_inode(&mut self, inum: u32, inode: &DInode) {
        let off = self.meta.inode_offset(inum);
        self.io().write_struct(off, inode).expect("write inode");
    }

    /// Overwrites directory entry `slot` of `block`.
    pub fn put_dirent(&mut self, block: u32, slot: usize, inum: u16, name: &[u8]) {
        let off = block as u64 * BSIZE as u64 + (slot * DIRENT_SIZE) as u64;
        self.io()
            .write_at(off, Dirent::new(inum, name).as_bytes())
            .expect("write dirent");
    }

    pub fn toggle_bit(&mut self, block: u32) {
        toggle_bit(&mut self.buf, &self.meta, block);
    }

    pub fn bit(&self, block: u32) -> bool {
        let (bitmap_block, byte, mask) = self.meta.bitmap_location(block);
        self.buf[bitmap_block as usize * BSIZE + byte] & mask != 0
    }

    pub fn inject<T>(&mut self, f: impl FnOnce(&mut VsfsInjector<'_, MemBlockIO<'_>>) -> T) -> T {
        let meta = self.meta;
        let mut io = MemBlockIO::new(&mut self.buf);
        let mut inj = VsfsInjector::new(&mut io, &meta);
        f(&mut inj)
    }
}

pub fn toggle_bit(buf: &mut [u8], meta: &VsfsMeta, block: u32) {
    let (bitmap_block, byte, mask) = meta.bitmap_location(block);
    buf[bitmap_block as usize * BSIZE + byte] ^= mask;
}

/// Loads the layout from the superblock and runs every phase.
pub fn check_image(buf: &mut [u8]) -> FsckResult<VerifyReport> {
    let mut io = MemBlockIO::new(buf);
    let meta = VsfsMeta::from_io(&mut io)?;
    VsfsChecker::new(&mut io, &meta).check_all()
}

/// Hand-built reference image: superblock `{1024, 941, 200}`, root directory
/// holding only `.` and `..` in block 29, and a bitmap marking block 29 alone.
pub fn scenario_a() -> (VsfsMeta, Vec<u8>) {
    let meta = VsfsMeta::new(1024, 941, 200).expect("layout");
    assert_eq!(meta.data_start, 29);
    let mut buf = vec![0u8; meta.size_bytes() as usize];

    {
        let mut io = MemBlockIO::new(&mut buf);
        io.write_struct(BSIZE as u64, &VsfsSuperblock::new(1024, 941, 200))
            .expect("superblock");

        let mut root = DInode::new(InodeType::Dir, 1);
        root.set_size(2 * DIRENT_SIZE as u32);
        root.set_addr(0, 29);
        io.write_struct(meta.inode_offset(ROOT_INO), &root)
            .expect("root inode");

        let mut dir = [0u8; BSIZE];
        dir[..DIRENT_SIZE].copy_from_slice(Dirent::new(1, b".").as_bytes());
        dir[DIRENT_SIZE..2 * DIRENT_SIZE].copy_from_slice(Dirent::new(1, b"..").as_bytes());
        io.write_block(29, &dir).expect("root block");
    }
    toggle_bit(&mut buf, &meta, 29);
    (meta, buf)
}
