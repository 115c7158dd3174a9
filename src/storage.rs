use crate::pager::PAGE_SIZE;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

/// Byte-addressable page storage. The pager only ever calls these three
/// operations; swapping this out is how the engine is unit-tested without
/// touching the filesystem.
pub trait Storage {
    fn size(&mut self) -> u64;
    fn read(&mut self, page_num: usize, buf: &mut [u8]);
    fn write(&mut self, page_num: usize, buf: &[u8]);
}

pub struct FileStorage {
    file: File,
}

impl FileStorage {
    pub fn open(path: &std::path::Path) -> std::io::Result<FileStorage> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(FileStorage { file })
    }
}

impl Storage for FileStorage {
    fn size(&mut self) -> u64 {
        self.file
            .seek(SeekFrom::End(0))
            .expect("failed to seek db file")
    }

    fn read(&mut self, page_num: usize, buf: &mut [u8]) {
        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))
            .expect("failed to seek db file");
        self.file.read_exact(buf).expect("failed to read db file");
    }

    fn write(&mut self, page_num: usize, buf: &[u8]) {
        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))
            .expect("failed to seek db file");
        self.file.write_all(buf).expect("failed to write db file");
        self.file.flush().expect("failed to flush db file");
    }
}

/// In-memory backend used by unit tests, keyed by an externally-owned map
/// so a test can reopen "the same file" across two `InMemoryStorage`
/// instances to exercise round-trip-through-close behavior.
#[cfg(test)]
pub struct InMemoryStorage<'a> {
    pages: &'a mut std::collections::HashMap<usize, [u8; PAGE_SIZE]>,
}

#[cfg(test)]
impl<'a> InMemoryStorage<'a> {
    pub fn new(pages: &'a mut std::collections::HashMap<usize, [u8; PAGE_SIZE]>) -> Self {
        InMemoryStorage { pages }
    }
}

#[cfg(test)]
impl<'a> Storage for InMemoryStorage<'a> {
    fn size(&mut self) -> u64 {
        let max_page = self.pages.keys().max().copied();
        match max_page {
            Some(p) => (p + 1) as u64 * PAGE_SIZE as u64,
            None => 0,
        }
    }

    fn read(&mut self, page_num: usize, buf: &mut [u8]) {
        if let Some(page) = self.pages.get(&page_num) {
            buf.copy_from_slice(page.as_slice());
        }
    }

    fn write(&mut self, page_num: usize, buf: &[u8]) {
        let page = self.pages.entry(page_num).or_insert([0u8; PAGE_SIZE]);
        page.copy_from_slice(buf);
    }
}
