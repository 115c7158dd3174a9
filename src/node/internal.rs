//! Pure accessors over an internal page's body: `num_keys`, `right_child`,
//! and the `(child, key)` cells. No I/O, no pager access.

use crate::node::common;
use crate::pager::Page;

const NUM_KEYS_OFFSET: usize = common::HEADER_SIZE;
const RIGHT_CHILD_OFFSET: usize = NUM_KEYS_OFFSET + 4;
pub const HEADER_SIZE: usize = common::HEADER_SIZE + 4 + 4;

const CHILD_SIZE: usize = 4;
pub const CELL_SIZE: usize = CHILD_SIZE + 4;

/// Intentionally tiny so unit tests exercise multi-level splits.
pub const MAX_CELLS: u32 = 3;
pub const LEFT_SPLIT_COUNT: u32 = 2;
pub const RIGHT_SPLIT_COUNT: u32 = (MAX_CELLS + 1) - LEFT_SPLIT_COUNT;
pub const MIN_KEYS: u32 = 1;

pub fn initialize(page: &mut Page) {
    common::set_node_type(page, common::NodeType::Internal);
    common::set_root(page, false);
    set_num_keys(page, 0);
}

pub fn num_keys(page: &Page) -> u32 {
    common::read_u32(page, NUM_KEYS_OFFSET)
}

pub fn set_num_keys(page: &mut Page, value: u32) {
    common::write_u32(page, NUM_KEYS_OFFSET, value)
}

pub fn right_child(page: &Page) -> u32 {
    common::read_u32(page, RIGHT_CHILD_OFFSET)
}

pub fn set_right_child(page: &mut Page, value: u32) {
    common::write_u32(page, RIGHT_CHILD_OFFSET, value)
}

fn cell_offset(cell_num: u32) -> usize {
    HEADER_SIZE + cell_num as usize * CELL_SIZE
}

/// Raw cell child slot, bypassing the `num_keys` bound `child`/`set_child`
/// enforce. `btree`'s split/merge code needs this while `num_keys` is
/// mid-update and temporarily out of sync with which cells hold live data.
pub(crate) fn cell_child(page: &Page, cell_num: u32) -> u32 {
    common::read_u32(page, cell_offset(cell_num))
}

pub(crate) fn set_cell_child(page: &mut Page, cell_num: u32, value: u32) {
    common::write_u32(page, cell_offset(cell_num), value)
}

pub fn key(page: &Page, key_num: u32) -> u32 {
    common::read_u32(page, cell_offset(key_num) + CHILD_SIZE)
}

pub fn set_key(page: &mut Page, key_num: u32, value: u32) {
    common::write_u32(page, cell_offset(key_num) + CHILD_SIZE, value)
}

/// Children are indexed `0..=num_keys`; child `num_keys` is `right_child`.
pub fn child(page: &Page, child_num: u32) -> u32 {
    let num_keys = num_keys(page);
    assert!(
        child_num <= num_keys,
        "tried to access child {child_num} > num_keys {num_keys}"
    );
    if child_num == num_keys {
        right_child(page)
    } else {
        cell_child(page, child_num)
    }
}

pub fn set_child(page: &mut Page, child_num: u32, value: u32) {
    let num_keys = num_keys(page);
    assert!(
        child_num <= num_keys,
        "tried to access child {child_num} > num_keys {num_keys}"
    );
    if child_num == num_keys {
        set_right_child(page, value);
    } else {
        set_cell_child(page, child_num, value);
    }
}

/// Binary search: returns the smallest index `i` with `key(i) >= target`,
/// or `num_keys` if every key is smaller. `target`'s child is `child(i)`.
pub fn find_key(page: &Page, target: u32) -> u32 {
    let mut lo = 0u32;
    let mut hi = num_keys(page);
    while lo != hi {
        let mid = lo + (hi - lo) / 2;
        if key(page, mid) >= target {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

/// Linear scan for the cell index whose child is `child_page_num`. Returns
/// `num_keys` if the match is the right child (no cell holds it).
pub fn find_child(page: &Page, child_page_num: u32) -> u32 {
    let num_keys = num_keys(page);
    for i in 0..num_keys {
        if cell_child(page, i) == child_page_num {
            return i;
        }
    }
    num_keys
}

/// Re-point the cell whose key is currently `old_key` to `new_key`, used
/// when a child's max key shifts after a split/merge on that child.
pub fn update_key(page: &mut Page, old_key: u32, new_key: u32) {
    let idx = find_key(page, old_key);
    if idx < num_keys(page) {
        set_key(page, idx, new_key);
    }
}

/// Moves the half-open cell range `[from, to)` within one page so it starts
/// at cell `from + shift_by`, overlap-safely.
pub fn shift_cells(page: &mut Page, from: u32, to: u32, shift_by: i32) {
    if from == to {
        return;
    }
    let src_start = cell_offset(from);
    let src_end = cell_offset(to);
    let dst_start = (src_start as i64 + shift_by as i64 * CELL_SIZE as i64) as usize;
    page.copy_within(src_start..src_end, dst_start);
}

pub fn copy_cell(dst: &mut Page, dst_cell: u32, src: &Page, src_cell: u32) {
    let d = cell_offset(dst_cell);
    let s = cell_offset(src_cell);
    dst[d..d + CELL_SIZE].copy_from_slice(&src[s..s + CELL_SIZE]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pager::PAGE_SIZE;

    fn node_with(keys: &[u32], children: &[u32], right_child_num: u32) -> Page {
        let mut page = [0u8; PAGE_SIZE];
        initialize(&mut page);
        set_num_keys(&mut page, keys.len() as u32);
        for (i, (&k, &c)) in keys.iter().zip(children.iter()).enumerate() {
            set_key(&mut page, i as u32, k);
            set_cell_child(&mut page, i as u32, c);
        }
        set_right_child(&mut page, right_child_num);
        page
    }

    #[test]
    fn find_key_binary_search() {
        let page = node_with(&[5, 10, 20], &[1, 2, 3], 4);
        assert_eq!(find_key(&page, 0), 0);
        assert_eq!(find_key(&page, 5), 0);
        assert_eq!(find_key(&page, 6), 1);
        assert_eq!(find_key(&page, 20), 2);
        assert_eq!(find_key(&page, 21), 3);
    }

    #[test]
    fn child_dispatches_right_child_at_num_keys() {
        let page = node_with(&[5, 10], &[1, 2], 3);
        assert_eq!(child(&page, 0), 1);
        assert_eq!(child(&page, 1), 2);
        assert_eq!(child(&page, 2), 3);
    }

    #[test]
    fn find_child_locates_cell_or_reports_right_child() {
        let page = node_with(&[5, 10], &[1, 2], 3);
        assert_eq!(find_child(&page, 1), 0);
        assert_eq!(find_child(&page, 2), 1);
        assert_eq!(find_child(&page, 3), 2); // right child: no cell owns it
    }
}
