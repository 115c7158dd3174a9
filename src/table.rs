//! The engine's public façade: opens a database file, hands out cursors,
//! and translates cursor positions into the underlying B+tree operations.

use crate::btree::{self, ROOT_PAGE_NUM};
use crate::node;
use crate::pager::{OpenError, Pager};
use crate::row::Row;
use crate::storage::Storage;

pub struct Table<T: Storage> {
    pager: Pager<T>,
}

/// A position in the table's key order. `end_of_table` is true one past the
/// last row; every other cursor refers to a live cell.
pub struct Cursor {
    page_num: u32,
    cell_num: u32,
    end_of_table: bool,
}

impl Cursor {
    pub fn is_end(&self) -> bool {
        self.end_of_table
    }
}

#[derive(Debug)]
pub enum InsertError {
    DuplicateKey,
}

impl std::fmt::Display for InsertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsertError::DuplicateKey => write!(f, "Error: Duplicate key."),
        }
    }
}

impl std::error::Error for InsertError {}

impl<T: Storage> Table<T> {
    pub fn open(storage: T) -> Result<Table<T>, OpenError> {
        let mut pager = Pager::open(storage)?;
        if pager.num_pages() == 0 {
            let root = pager.get_page(ROOT_PAGE_NUM);
            node::leaf::initialize(root);
            node::common::set_root(root, true);
        }
        Ok(Table { pager })
    }

    pub fn close(self) {
        self.pager.close();
    }

    /// Positions a cursor at `key`, or at the slot it would occupy.
    pub fn find(&mut self, key: u32) -> Cursor {
        let pos = btree::table_find(&mut self.pager, ROOT_PAGE_NUM, key);
        Cursor {
            page_num: pos.page_num,
            cell_num: pos.cell_num,
            end_of_table: false,
        }
    }

    /// A cursor at the first row in key order.
    pub fn start(&mut self) -> Cursor {
        let pos = btree::table_start(&mut self.pager, ROOT_PAGE_NUM);
        let num_cells = node::leaf::num_cells(self.pager.get_page(pos.page_num));
        Cursor {
            page_num: pos.page_num,
            cell_num: pos.cell_num,
            end_of_table: num_cells == 0,
        }
    }

    pub fn advance(&mut self, cursor: &mut Cursor) {
        let (page_num, cell_num, end_of_table) =
            btree::cursor_advance(&mut self.pager, cursor.page_num, cursor.cell_num);
        cursor.page_num = page_num;
        cursor.cell_num = cell_num;
        cursor.end_of_table = end_of_table;
    }

    pub fn cursor_value(&mut self, cursor: &Cursor) -> Row {
        btree::cursor_value(&mut self.pager, cursor.page_num, cursor.cell_num)
    }

    /// Inserts `row`, rejecting an already-present id. The duplicate-key
    /// check lives here rather than in the bare engine primitives, which
    /// would otherwise happily overwrite a cell at the found position.
    pub fn insert(&mut self, row: &Row) -> Result<(), InsertError> {
        let cursor = self.find(row.id);
        if cursor.cell_num
            < node::leaf::num_cells(self.pager.get_page(cursor.page_num))
        {
            let existing_key = node::leaf::key(self.pager.get_page(cursor.page_num), cursor.cell_num);
            if existing_key == row.id {
                return Err(InsertError::DuplicateKey);
            }
        }
        btree::leaf_node_insert(&mut self.pager, cursor.page_num, cursor.cell_num, row.id, row);
        Ok(())
    }

    /// Looks up the row with the given id, if present.
    pub fn find_row(&mut self, id: u32) -> Option<Row> {
        let cursor = self.find(id);
        let found = cursor.cell_num
            < node::leaf::num_cells(self.pager.get_page(cursor.page_num))
            && node::leaf::key(self.pager.get_page(cursor.page_num), cursor.cell_num) == id;
        if found {
            Some(self.cursor_value(&cursor))
        } else {
            None
        }
    }

    /// Deletes the row with the given id, if present. Returns whether a row
    /// was actually removed.
    pub fn delete(&mut self, id: u32) -> bool {
        let cursor = self.find(id);
        let found = cursor.cell_num
            < node::leaf::num_cells(self.pager.get_page(cursor.page_num))
            && node::leaf::key(self.pager.get_page(cursor.page_num), cursor.cell_num) == id;
        if found {
            btree::leaf_node_delete(&mut self.pager, cursor.page_num, cursor.cell_num);
        }
        found
    }

    pub fn pager(&mut self) -> &mut Pager<T> {
        &mut self.pager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use std::collections::HashMap;

    fn row(id: u32) -> Row {
        Row::new(id, "user", "user@example.com").unwrap()
    }

    fn scan(table: &mut Table<InMemoryStorage<'static>>) -> Vec<u32> {
        let mut cursor = table.start();
        let mut ids = Vec::new();
        while !cursor.is_end() {
            ids.push(table.cursor_value(&cursor).id);
            table.advance(&mut cursor);
        }
        ids
    }

    fn open_table() -> Table<InMemoryStorage<'static>> {
        let backing: &'static mut HashMap<usize, [u8; crate::pager::PAGE_SIZE]> =
            Box::leak(Box::new(HashMap::new()));
        Table::open(InMemoryStorage::new(backing)).unwrap()
    }

    #[test]
    fn insert_then_scan_is_key_ordered() {
        let mut table = open_table();
        for id in [3, 1, 2] {
            table.insert(&row(id)).unwrap();
        }
        assert_eq!(scan(&mut table), vec![1, 2, 3]);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut table = open_table();
        table.insert(&row(1)).unwrap();
        assert!(matches!(table.insert(&row(1)), Err(InsertError::DuplicateKey)));
    }

    #[test]
    fn delete_removes_exactly_one_row() {
        let mut table = open_table();
        for id in 1..=5 {
            table.insert(&row(id)).unwrap();
        }
        assert!(table.delete(3));
        assert!(!table.delete(3));
        assert_eq!(scan(&mut table), vec![1, 2, 4, 5]);
    }

    #[test]
    fn reopening_preserves_rows() {
        let backing: &'static mut HashMap<usize, [u8; crate::pager::PAGE_SIZE]> =
            Box::leak(Box::new(HashMap::new()));
        {
            let mut table = Table::open(InMemoryStorage::new(backing)).unwrap();
            for id in 1..=5 {
                table.insert(&row(id)).unwrap();
            }
            table.close();
        }
        let mut table = Table::open(InMemoryStorage::new(backing)).unwrap();
        assert_eq!(scan(&mut table), vec![1, 2, 3, 4, 5]);
    }
}
