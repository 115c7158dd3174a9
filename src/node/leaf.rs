//! Pure accessors over a leaf page's body: `num_cells`, `next_leaf`, and the
//! `(key, row)` cells themselves. No I/O, no pager access — see `btree.rs`
//! for the algorithms that walk these.

use crate::node::common;
use crate::pager::{Page, PAGE_SIZE};
use crate::row::{Row, ROW_SIZE};

const NUM_CELLS_OFFSET: usize = common::HEADER_SIZE;
const NEXT_LEAF_OFFSET: usize = NUM_CELLS_OFFSET + 4;
pub const HEADER_SIZE: usize = common::HEADER_SIZE + 4 + 4;

const KEY_SIZE: usize = 4;
pub const CELL_SIZE: usize = KEY_SIZE + ROW_SIZE;
pub const SPACE_FOR_CELLS: usize = PAGE_SIZE - HEADER_SIZE;
pub const MAX_CELLS: u32 = (SPACE_FOR_CELLS / CELL_SIZE) as u32;

pub const RIGHT_SPLIT_COUNT: u32 = (MAX_CELLS + 1) / 2;
pub const LEFT_SPLIT_COUNT: u32 = (MAX_CELLS + 1) - RIGHT_SPLIT_COUNT;
pub const MIN_CELLS: u32 = RIGHT_SPLIT_COUNT;

pub fn initialize(page: &mut Page) {
    common::set_node_type(page, common::NodeType::Leaf);
    common::set_root(page, false);
    set_num_cells(page, 0);
    set_next_leaf(page, 0);
}

pub fn num_cells(page: &Page) -> u32 {
    common::read_u32(page, NUM_CELLS_OFFSET)
}

pub fn set_num_cells(page: &mut Page, value: u32) {
    common::write_u32(page, NUM_CELLS_OFFSET, value)
}

pub fn next_leaf(page: &Page) -> u32 {
    common::read_u32(page, NEXT_LEAF_OFFSET)
}

pub fn set_next_leaf(page: &mut Page, value: u32) {
    common::write_u32(page, NEXT_LEAF_OFFSET, value)
}

fn cell_offset(cell_num: u32) -> usize {
    HEADER_SIZE + cell_num as usize * CELL_SIZE
}

pub fn key(page: &Page, cell_num: u32) -> u32 {
    common::read_u32(page, cell_offset(cell_num))
}

pub fn set_key(page: &mut Page, cell_num: u32, value: u32) {
    common::write_u32(page, cell_offset(cell_num), value)
}

pub fn value_bytes(page: &Page, cell_num: u32) -> &[u8] {
    let offset = cell_offset(cell_num) + KEY_SIZE;
    &page[offset..offset + ROW_SIZE]
}

pub fn set_value(page: &mut Page, cell_num: u32, row: &Row) {
    let offset = cell_offset(cell_num) + KEY_SIZE;
    row.serialize_into(&mut page[offset..offset + ROW_SIZE]);
}

/// `get_node_max_key` for a leaf: the last cell's key.
pub fn max_key(page: &Page) -> u32 {
    key(page, num_cells(page) - 1)
}

/// Copies cell `src_cell` of `src` into cell `dst_cell` of `dst`. `dst` and
/// `src` are always distinct pages here (splits move cells across two
/// sibling buffers); shifting within one page uses [`shift_cells`].
pub fn copy_cell(dst: &mut Page, dst_cell: u32, src: &Page, src_cell: u32) {
    let d = cell_offset(dst_cell);
    let s = cell_offset(src_cell);
    dst[d..d + CELL_SIZE].copy_from_slice(&src[s..s + CELL_SIZE]);
}

/// Moves the half-open cell range `[from, to)` within one page so it starts
/// at cell `from + shift_by` instead, overlap-safely.
pub fn shift_cells(page: &mut Page, from: u32, to: u32, shift_by: i32) {
    if from == to {
        return;
    }
    let src_start = cell_offset(from);
    let src_end = cell_offset(to);
    let dst_start = (src_start as i64 + shift_by as i64 * CELL_SIZE as i64) as usize;
    page.copy_within(src_start..src_end, dst_start);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_matches_classic_tutorial_constants() {
        // These match the canonical db_tutorial constants bit-for-bit,
        // since ROW_SIZE and PAGE_SIZE are unchanged from the original.
        assert_eq!(HEADER_SIZE, 14);
        assert_eq!(CELL_SIZE, 297);
        assert_eq!(MAX_CELLS, 13);
        assert_eq!(LEFT_SPLIT_COUNT, 7);
        assert_eq!(RIGHT_SPLIT_COUNT, 7);
        assert_eq!(MIN_CELLS, 7);
    }

    #[test]
    fn set_and_read_cell() {
        let mut page = [0u8; PAGE_SIZE];
        initialize(&mut page);
        let row = Row::new(5, "bob", "bob@example.com").unwrap();
        set_num_cells(&mut page, 1);
        set_key(&mut page, 0, 5);
        set_value(&mut page, 0, &row);

        assert_eq!(key(&page, 0), 5);
        assert_eq!(Row::deserialize_from(value_bytes(&page, 0)), row);
        assert_eq!(max_key(&page), 5);
    }

    #[test]
    fn shift_cells_right_preserves_order() {
        let mut page = [0u8; PAGE_SIZE];
        initialize(&mut page);
        set_num_cells(&mut page, 3);
        for i in 0..3u32 {
            set_key(&mut page, i, i * 10);
            set_value(&mut page, i, &Row::new(i, "u", "e@x.com").unwrap());
        }
        // Make room at cell 1 by shifting [1, 3) right by one.
        shift_cells(&mut page, 1, 3, 1);
        set_key(&mut page, 1, 999);
        assert_eq!(key(&page, 0), 0);
        assert_eq!(key(&page, 1), 999);
        assert_eq!(key(&page, 2), 10);
        assert_eq!(key(&page, 3), 20);
    }
}
