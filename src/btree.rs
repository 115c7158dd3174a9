//! The B+tree algorithms: search, insert-with-split, delete-with-merge. Pure
//! node-body layout lives in `crate::node`; this module is the part that
//! walks pages through a `Pager` and keeps the tree's invariants intact.
//!
//! Every function takes page numbers, not owned node structs: `Page` is
//! `Copy`, so a page that's only needed for a value (not a live mutable
//! view) is read out as an owned snapshot, which ends the borrow on the
//! pager immediately and lets the next line fetch a different page.

use crate::node::{self, common::NodeType};
use crate::pager::{Pager, Page, PAGE_SIZE};
use crate::row::Row;
use crate::storage::Storage;

pub const ROOT_PAGE_NUM: u32 = 0;

/// Position of a cell within the tree: either an existing key, or the slot
/// where it would be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub page_num: u32,
    pub cell_num: u32,
}

pub fn get_node_max_key<T: Storage>(pager: &mut Pager<T>, page_num: u32) -> u32 {
    let page = *pager.get_page(page_num);
    match node::common::node_type(&page) {
        NodeType::Internal => get_node_max_key(pager, node::internal::right_child(&page)),
        NodeType::Leaf => node::leaf::max_key(&page),
    }
}

fn leaf_node_find<T: Storage>(pager: &mut Pager<T>, page_num: u32, key: u32) -> Position {
    let page = pager.get_page(page_num);
    let mut lo = 0u32;
    let mut hi = node::leaf::num_cells(page);
    while lo != hi {
        let mid = lo + (hi - lo) / 2;
        let key_at_mid = node::leaf::key(page, mid);
        if key == key_at_mid {
            return Position { page_num, cell_num: mid };
        }
        if key < key_at_mid {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Position { page_num, cell_num: lo }
}

fn internal_node_find<T: Storage>(pager: &mut Pager<T>, page_num: u32, key: u32) -> Position {
    let page = pager.get_page(page_num);
    let child_index = node::internal::find_key(page, key);
    let child_num = node::internal::child(page, child_index);
    let child_type = node::common::node_type(pager.get_page(child_num));
    match child_type {
        NodeType::Leaf => leaf_node_find(pager, child_num, key),
        NodeType::Internal => internal_node_find(pager, child_num, key),
    }
}

/// Finds `key`'s position, or the position it would occupy if inserted.
pub fn table_find<T: Storage>(pager: &mut Pager<T>, root_page_num: u32, key: u32) -> Position {
    let root_type = node::common::node_type(pager.get_page(root_page_num));
    match root_type {
        NodeType::Leaf => leaf_node_find(pager, root_page_num, key),
        NodeType::Internal => internal_node_find(pager, root_page_num, key),
    }
}

/// The leftmost leaf's first cell, found by always descending child 0
/// rather than routing through `table_find(0)`.
pub fn table_start<T: Storage>(pager: &mut Pager<T>, root_page_num: u32) -> Position {
    let mut page_num = root_page_num;
    loop {
        let page = pager.get_page(page_num);
        match node::common::node_type(page) {
            NodeType::Leaf => return Position { page_num, cell_num: 0 },
            NodeType::Internal => page_num = node::internal::child(page, 0),
        }
    }
}

/// Advances past `(page_num, cell_num)`, following the leaf sibling chain.
/// Returns the new position and whether it has run off the end of the table.
pub fn cursor_advance<T: Storage>(
    pager: &mut Pager<T>,
    page_num: u32,
    cell_num: u32,
) -> (u32, u32, bool) {
    let page = pager.get_page(page_num);
    let next_cell = cell_num + 1;
    if next_cell >= node::leaf::num_cells(page) {
        let next_leaf = node::leaf::next_leaf(page);
        if next_leaf == 0 {
            (page_num, next_cell, true)
        } else {
            (next_leaf, 0, false)
        }
    } else {
        (page_num, next_cell, false)
    }
}

pub fn cursor_value<T: Storage>(pager: &mut Pager<T>, page_num: u32, cell_num: u32) -> Row {
    Row::deserialize_from(node::leaf::value_bytes(pager.get_page(page_num), cell_num))
}

/// Splits the root: the old root's contents move to a freshly allocated
/// left child, `right_child_page_num` becomes the new right child, and page
/// `root_page_num` is reinitialized in place as the new two-child root.
pub fn create_new_root<T: Storage>(
    pager: &mut Pager<T>,
    root_page_num: u32,
    right_child_page_num: u32,
) {
    let old_root = *pager.get_page(root_page_num);
    let left_child_page_num = pager.get_unused_page_num();

    let left_child = pager.get_page(left_child_page_num);
    *left_child = old_root;
    node::common::set_root(left_child, false);
    let left_child_snapshot = *left_child;

    let left_child_max_key = get_node_max_key(pager, left_child_page_num);

    let root = pager.get_page(root_page_num);
    node::internal::initialize(root);
    node::common::set_root(root, true);
    node::internal::set_num_keys(root, 1);
    node::internal::set_cell_child(root, 0, left_child_page_num);
    node::internal::set_key(root, 0, left_child_max_key);
    node::internal::set_right_child(root, right_child_page_num);

    node::common::set_parent(pager.get_page(left_child_page_num), root_page_num);
    node::common::set_parent(pager.get_page(right_child_page_num), root_page_num);

    if node::common::node_type(&left_child_snapshot) != NodeType::Internal {
        return;
    }
    let num = node::internal::num_keys(&left_child_snapshot);
    for i in 0..num {
        let child_page_num = node::internal::child(&left_child_snapshot, i);
        node::common::set_parent(pager.get_page(child_page_num), left_child_page_num);
    }
    let right_grandchild = node::internal::right_child(&left_child_snapshot);
    node::common::set_parent(pager.get_page(right_grandchild), left_child_page_num);
}

/// Splits a full internal node to make room for one more `(child, key)`
/// cell, returning the page number of the newly allocated right sibling.
/// `right_child_split` is the edge case where the inserted cell belongs
/// past every existing key, displacing the node's own `right_child` field
/// into a regular cell.
fn internal_node_split<T: Storage>(
    pager: &mut Pager<T>,
    parent_page_num: u32,
    child_page_num: u32,
) -> u32 {
    use node::internal::{LEFT_SPLIT_COUNT, MAX_CELLS, RIGHT_SPLIT_COUNT};

    let mut old_node = *pager.get_page(parent_page_num);
    let old_right_child_page_num = node::internal::right_child(&old_node);
    let child_max_key = get_node_max_key(pager, child_page_num);
    let index = node::internal::find_key(&old_node, child_max_key);
    let new_page_num = pager.get_unused_page_num();

    let mut new_node = [0u8; PAGE_SIZE];
    node::internal::initialize(&mut new_node);
    node::common::set_root(&mut new_node, false);
    node::common::set_parent(&mut new_node, node::common::parent(&old_node));

    let mut right_child_split = false;
    let mut right_child_page_num = 0u32;
    let mut right_child_max_key = 0u32;
    if index == MAX_CELLS {
        right_child_page_num = old_right_child_page_num;
        right_child_max_key = get_node_max_key(pager, right_child_page_num);
        right_child_split = child_max_key > right_child_max_key;
    }

    node::internal::set_num_keys(&mut old_node, LEFT_SPLIT_COUNT);
    node::internal::set_num_keys(&mut new_node, RIGHT_SPLIT_COUNT);

    let mut i = MAX_CELLS as i64;
    while i >= 0 {
        let i_u = i as u32;
        let goes_right = i_u >= LEFT_SPLIT_COUNT;
        let index_within_node = i_u % LEFT_SPLIT_COUNT;

        let (dest_child, dest_key) = if i_u == index {
            if !right_child_split {
                (child_page_num, child_max_key)
            } else {
                (right_child_page_num, right_child_max_key)
            }
        } else if i_u > index {
            (
                node::internal::cell_child(&old_node, i_u - 1),
                node::internal::key(&old_node, i_u - 1),
            )
        } else {
            (
                node::internal::cell_child(&old_node, i_u),
                node::internal::key(&old_node, i_u),
            )
        };

        let (parent_after, t_parent_page_num) = if goes_right {
            (&mut new_node, new_page_num)
        } else {
            (&mut old_node, parent_page_num)
        };
        node::internal::set_cell_child(parent_after, index_within_node, dest_child);
        node::internal::set_key(parent_after, index_within_node, dest_key);
        node::common::set_parent(pager.get_page(dest_child), t_parent_page_num);

        i -= 1;
    }

    // The cell that lands at LEFT_SPLIT_COUNT - 1 becomes old_node's new
    // right_child; old_node loses one key to make room for it.
    let new_old_right_child = node::internal::cell_child(&old_node, LEFT_SPLIT_COUNT - 1);
    node::internal::set_right_child(&mut old_node, new_old_right_child);
    node::internal::set_num_keys(&mut old_node, LEFT_SPLIT_COUNT - 1);
    node::internal::set_num_keys(&mut new_node, RIGHT_SPLIT_COUNT);
    if right_child_split {
        node::internal::set_right_child(&mut new_node, child_page_num);
        node::common::set_parent(pager.get_page(child_page_num), new_page_num);
    } else {
        node::internal::set_right_child(&mut new_node, old_right_child_page_num);
        node::common::set_parent(pager.get_page(old_right_child_page_num), new_page_num);
    }

    *pager.get_page(parent_page_num) = old_node;
    *pager.get_page(new_page_num) = new_node;
    new_page_num
}

/// Adds a `(child, key)` cell for `child_page_num` into `parent_page_num`,
/// splitting (and recursing up) if the parent is already full.
fn internal_node_insert<T: Storage>(pager: &mut Pager<T>, parent_page_num: u32, child_page_num: u32) {
    let parent = *pager.get_page(parent_page_num);
    let original_num_keys = node::internal::num_keys(&parent);

    if original_num_keys >= node::internal::MAX_CELLS {
        // Must read the parent's max key before splitting it: the split
        // rewrites page `parent_page_num` in place as the reduced left half.
        let old_max = get_node_max_key(pager, parent_page_num);
        let new_page_num = internal_node_split(pager, parent_page_num, child_page_num);
        if node::common::is_root(&parent) {
            create_new_root(pager, parent_page_num, new_page_num);
        } else {
            let grandparent_page_num = node::common::parent(&parent);
            let new_max = get_node_max_key(pager, parent_page_num);
            let grandparent = pager.get_page(grandparent_page_num);
            node::internal::update_key(grandparent, old_max, new_max);
            internal_node_insert(pager, grandparent_page_num, new_page_num);
        }
        return;
    }

    let child_max_key = get_node_max_key(pager, child_page_num);
    let index = node::internal::find_key(&parent, child_max_key);

    let right_child_page_num = node::internal::right_child(&parent);
    let right_child_max_key = get_node_max_key(pager, right_child_page_num);

    let parent = pager.get_page(parent_page_num);
    node::internal::set_num_keys(parent, original_num_keys + 1);
    if child_max_key > right_child_max_key {
        node::internal::set_cell_child(parent, original_num_keys, right_child_page_num);
        node::internal::set_key(parent, original_num_keys, right_child_max_key);
        node::internal::set_right_child(parent, child_page_num);
    } else {
        node::internal::shift_cells(parent, index, original_num_keys, 1);
        node::internal::set_cell_child(parent, index, child_page_num);
        node::internal::set_key(parent, index, child_max_key);
    }
}

/// Creates a new leaf, moves half of `page_num`'s cells (plus the incoming
/// one) across, and propagates the split into the parent.
fn leaf_node_split_and_insert<T: Storage>(
    pager: &mut Pager<T>,
    page_num: u32,
    cell_num: u32,
    key: u32,
    value: &Row,
) {
    use node::leaf::{LEFT_SPLIT_COUNT, MAX_CELLS, RIGHT_SPLIT_COUNT};

    let old_max = get_node_max_key(pager, page_num);
    let new_page_num = pager.get_unused_page_num();
    let old_node_snapshot = *pager.get_page(page_num);

    let mut new_node = [0u8; PAGE_SIZE];
    node::leaf::initialize(&mut new_node);
    node::common::set_parent(&mut new_node, node::common::parent(&old_node_snapshot));
    node::leaf::set_next_leaf(&mut new_node, node::leaf::next_leaf(&old_node_snapshot));

    let mut old_node = old_node_snapshot;
    node::leaf::set_next_leaf(&mut old_node, new_page_num);

    let mut i = MAX_CELLS as i64;
    while i >= 0 {
        let i_u = i as u32;
        let goes_right = i_u >= LEFT_SPLIT_COUNT;
        let index_within_node = i_u % LEFT_SPLIT_COUNT;
        let dest = if goes_right { &mut new_node } else { &mut old_node };

        if i_u == cell_num {
            node::leaf::set_value(dest, index_within_node, value);
            node::leaf::set_key(dest, index_within_node, key);
        } else if i_u > cell_num {
            node::leaf::copy_cell(dest, index_within_node, &old_node_snapshot, i_u - 1);
        } else {
            node::leaf::copy_cell(dest, index_within_node, &old_node_snapshot, i_u);
        }
        i -= 1;
    }

    node::leaf::set_num_cells(&mut old_node, LEFT_SPLIT_COUNT);
    node::leaf::set_num_cells(&mut new_node, RIGHT_SPLIT_COUNT);

    *pager.get_page(page_num) = old_node;
    *pager.get_page(new_page_num) = new_node;

    if node::common::is_root(&old_node) {
        create_new_root(pager, page_num, new_page_num);
    } else {
        let parent_page_num = node::common::parent(&old_node);
        let new_max = get_node_max_key(pager, page_num);
        let parent = pager.get_page(parent_page_num);
        node::internal::update_key(parent, old_max, new_max);
        internal_node_insert(pager, parent_page_num, new_page_num);
    }
}

pub fn leaf_node_insert<T: Storage>(
    pager: &mut Pager<T>,
    page_num: u32,
    cell_num: u32,
    key: u32,
    value: &Row,
) {
    let page = pager.get_page(page_num);
    let num_cells = node::leaf::num_cells(page);
    if num_cells >= node::leaf::MAX_CELLS {
        leaf_node_split_and_insert(pager, page_num, cell_num, key, value);
        return;
    }

    let page = pager.get_page(page_num);
    if cell_num < num_cells {
        node::leaf::shift_cells(page, cell_num, num_cells, 1);
    }
    node::leaf::set_num_cells(page, num_cells + 1);
    node::leaf::set_key(page, cell_num, key);
    node::leaf::set_value(page, cell_num, value);
}

/// Merges `right_child_index` into `left_child_index` if the combination
/// still underflows a single node, or otherwise rebalances cells between
/// them. Returns `true` if it redistributed (parent keeps both children),
/// `false` if it merged (parent must drop the `right_child_index` cell).
fn node_merge_then_split<T: Storage>(
    pager: &mut Pager<T>,
    page_num: u32,
    left_child_index: u32,
    right_child_index: u32,
) -> bool {
    let parent = *pager.get_page(page_num);
    let left_child_page_num = node::internal::child(&parent, left_child_index);
    let right_child_page_num = node::internal::child(&parent, right_child_index);
    let left_child_type = node::common::node_type(pager.get_page(left_child_page_num));

    if left_child_type == NodeType::Leaf {
        merge_then_split_leaves(
            pager,
            page_num,
            left_child_index,
            right_child_index,
            left_child_page_num,
            right_child_page_num,
        )
    } else {
        merge_then_split_internals(
            pager,
            page_num,
            right_child_index,
            left_child_page_num,
            right_child_page_num,
        )
    }
}

fn merge_then_split_leaves<T: Storage>(
    pager: &mut Pager<T>,
    parent_page_num: u32,
    left_child_index: u32,
    right_child_index: u32,
    left_child_page_num: u32,
    right_child_page_num: u32,
) -> bool {
    let mut left_child = *pager.get_page(left_child_page_num);
    let right_child = *pager.get_page(right_child_page_num);
    let left_n = node::leaf::num_cells(&left_child);
    let right_n = node::leaf::num_cells(&right_child);
    let left_split_num = (left_n + right_n) / 2;
    let right_split_num = (left_n + right_n) - left_split_num;

    if left_split_num < node::leaf::MIN_CELLS {
        for i in 0..right_n {
            node::leaf::copy_cell(&mut left_child, left_n + i, &right_child, i);
        }
        node::leaf::set_num_cells(&mut left_child, left_n + right_n);
        node::leaf::set_next_leaf(&mut left_child, node::leaf::next_leaf(&right_child));
        *pager.get_page(left_child_page_num) = left_child;
        node::internal::set_child(pager.get_page(parent_page_num), right_child_index, left_child_page_num);
        pager.release_page(right_child_page_num);
        false
    } else {
        let mut right_child = right_child;
        if left_n < left_split_num {
            let n = left_split_num - left_n;
            for i in 0..n {
                node::leaf::copy_cell(&mut left_child, left_n + i, &right_child, i);
            }
            let mut shifted = right_child;
            for i in n..right_n {
                node::leaf::copy_cell(&mut shifted, i - n, &right_child, i);
            }
            right_child = shifted;
        } else {
            let n = left_n - left_split_num;
            let mut shifted = right_child;
            for i in (0..right_n).rev() {
                node::leaf::copy_cell(&mut shifted, i + n, &right_child, i);
            }
            for i in 0..n {
                node::leaf::copy_cell(&mut shifted, i, &left_child, left_split_num + i);
            }
            right_child = shifted;
        }
        node::leaf::set_num_cells(&mut left_child, left_split_num);
        node::leaf::set_num_cells(&mut right_child, right_split_num);
        *pager.get_page(left_child_page_num) = left_child;
        *pager.get_page(right_child_page_num) = right_child;

        let new_max = get_node_max_key(pager, left_child_page_num);
        node::internal::set_key(pager.get_page(parent_page_num), left_child_index, new_max);
        true
    }
}

fn merge_then_split_internals<T: Storage>(
    pager: &mut Pager<T>,
    parent_page_num: u32,
    right_child_index: u32,
    left_child_page_num: u32,
    right_child_page_num: u32,
) -> bool {
    use node::internal::MIN_KEYS;

    let mut left_child = *pager.get_page(left_child_page_num);
    let right_child_snapshot = *pager.get_page(right_child_page_num);
    let left_n = node::internal::num_keys(&left_child);
    let right_n = node::internal::num_keys(&right_child_snapshot);
    let left_split_num = (left_n + right_n) / 2;
    let right_split_num = (left_n + right_n) - left_split_num;

    let virtual_child_page_num = node::internal::right_child(&left_child);
    let virtual_key = get_node_max_key(pager, virtual_child_page_num);

    if left_split_num < MIN_KEYS {
        node::internal::set_right_child(&mut left_child, node::internal::right_child(&right_child_snapshot));
        node::internal::set_num_keys(&mut left_child, left_n + 1 + right_n);
        node::internal::set_key(&mut left_child, left_n, virtual_key);
        node::internal::set_cell_child(&mut left_child, left_n, virtual_child_page_num);
        for i in 0..right_n {
            node::internal::copy_cell(&mut left_child, left_n + 1 + i, &right_child_snapshot, i);
            let moved = node::internal::cell_child(&right_child_snapshot, i);
            node::common::set_parent(pager.get_page(moved), left_child_page_num);
        }
        *pager.get_page(left_child_page_num) = left_child;
        node::internal::set_child(pager.get_page(parent_page_num), right_child_index, left_child_page_num);
        pager.release_page(right_child_page_num);
        false
    } else if left_n < left_split_num {
        let mut right_child = right_child_snapshot;
        node::internal::set_num_keys(&mut left_child, left_split_num);
        node::internal::set_key(&mut left_child, left_n, virtual_key);
        node::internal::set_cell_child(&mut left_child, left_n, virtual_child_page_num);
        let n = left_split_num - left_n;
        for i in 0..n {
            let key = node::internal::key(&right_child, i);
            let child_page_num = node::internal::cell_child(&right_child, i);
            if i + 1 == n {
                node::internal::set_right_child(&mut left_child, child_page_num);
            } else {
                node::internal::set_cell_child(&mut left_child, left_n + i + 1, child_page_num);
                node::internal::set_key(&mut left_child, left_n + i + 1, key);
            }
            node::common::set_parent(pager.get_page(child_page_num), left_child_page_num);
        }
        let shifted = right_child;
        for i in n..right_n {
            node::internal::copy_cell(&mut right_child, i - n, &shifted, i);
        }
        node::internal::set_num_keys(&mut right_child, right_split_num);
        *pager.get_page(left_child_page_num) = left_child;
        *pager.get_page(right_child_page_num) = right_child;
        true
    } else {
        let mut right_child = right_child_snapshot;
        let shifted = right_child;
        node::internal::set_num_keys(&mut right_child, right_split_num);
        let n = left_n - left_split_num;
        for i in (0..right_n).rev() {
            node::internal::copy_cell(&mut right_child, i + n, &shifted, i);
        }
        for i in 0..n {
            if i == n - 1 {
                node::internal::set_key(&mut right_child, i, virtual_key);
                node::internal::set_cell_child(&mut right_child, i, virtual_child_page_num);
            } else {
                node::internal::copy_cell(&mut right_child, i, &left_child, left_split_num + 1 + i);
            }
            let child_page_num = node::internal::cell_child(&right_child, i);
            node::common::set_parent(pager.get_page(child_page_num), right_child_page_num);
        }
        let new_right_child_page_num = node::internal::cell_child(&left_child, left_split_num);
        node::internal::set_right_child(&mut left_child, new_right_child_page_num);
        node::internal::set_num_keys(&mut left_child, left_split_num);
        *pager.get_page(left_child_page_num) = left_child;
        *pager.get_page(right_child_page_num) = right_child;
        true
    }
}

/// Drops cell `child_index` from an internal node after one of its children
/// underflowed and got merged away; recurses and collapses the root if the
/// merge cascades.
pub fn internal_node_delete<T: Storage>(pager: &mut Pager<T>, page_num: u32, child_index: u32) {
    let node = pager.get_page(page_num);
    let num_keys = node::internal::num_keys(node);
    node::internal::shift_cells(node, child_index + 1, num_keys, -1);
    let remaining = num_keys - 1;
    node::internal::set_num_keys(node, remaining);

    if remaining >= node::internal::MIN_KEYS {
        return;
    }

    let node_snapshot = *pager.get_page(page_num);
    if node::common::is_root(&node_snapshot) {
        if remaining > 0 {
            return;
        }
        collapse_root(pager, page_num);
    } else {
        let parent_page_num = node::common::parent(&node_snapshot);
        let parent = pager.get_page(parent_page_num);
        let mut idx = node::internal::find_child(parent, page_num);
        let parent_num_keys = node::internal::num_keys(parent);
        if idx >= parent_num_keys {
            idx -= 1;
        }
        let split = node_merge_then_split(pager, parent_page_num, idx, idx + 1);
        if !split {
            internal_node_delete(pager, parent_page_num, idx);
        }
    }
}

/// The root internal node emptied to zero keys: promote its sole remaining
/// (right) child's contents into the root page and drop the child.
fn collapse_root<T: Storage>(pager: &mut Pager<T>, root_page_num: u32) {
    let root = *pager.get_page(root_page_num);
    let right_child_page_num = node::internal::right_child(&root);
    let right_child = *pager.get_page(right_child_page_num);

    match node::common::node_type(&right_child) {
        NodeType::Leaf => {
            let mut new_root = right_child;
            node::common::set_root(&mut new_root, true);
            *pager.get_page(root_page_num) = new_root;
        }
        NodeType::Internal => {
            let mut new_root = right_child;
            node::common::set_root(&mut new_root, true);
            let num_keys = node::internal::num_keys(&new_root);
            for i in 0..num_keys {
                let child_page_num = node::internal::child(&new_root, i);
                node::common::set_parent(pager.get_page(child_page_num), root_page_num);
            }
            let rc = node::internal::right_child(&new_root);
            node::common::set_parent(pager.get_page(rc), root_page_num);
            *pager.get_page(root_page_num) = new_root;
        }
    }
    pager.release_page(right_child_page_num);
}

/// Deletes the cell at `(page_num, cell_num)`, fixing up the parent's
/// separator key and merging with a sibling if the leaf underflows.
pub fn leaf_node_delete<T: Storage>(pager: &mut Pager<T>, page_num: u32, cell_num: u32) {
    let page = pager.get_page(page_num);
    let num_cells = node::leaf::num_cells(page);
    let old_max = node::leaf::max_key(page);
    node::leaf::shift_cells(page, cell_num + 1, num_cells, -1);
    node::leaf::set_num_cells(page, num_cells - 1);
    let remaining = num_cells - 1;
    let new_max = if remaining == 0 { old_max } else { node::leaf::max_key(page) };

    let is_root = node::common::is_root(page);
    if is_root {
        return;
    }

    let parent_page_num = node::common::parent(page);
    let parent = pager.get_page(parent_page_num);
    let mut child_index = node::internal::find_child(parent, page_num);
    let parent_num_keys = node::internal::num_keys(parent);
    if old_max != new_max {
        node::internal::update_key(parent, old_max, new_max);
    }

    if remaining >= node::leaf::MIN_CELLS {
        return;
    }

    if child_index >= parent_num_keys {
        child_index -= 1;
    }
    let split = node_merge_then_split(pager, parent_page_num, child_index, child_index + 1);
    if !split {
        internal_node_delete(pager, parent_page_num, child_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use std::collections::HashMap;

    fn fresh_pager() -> Pager<InMemoryStorage<'static>> {
        // Leaked on purpose: tests are short-lived processes and this keeps
        // the borrow checker from fighting a self-referential test fixture.
        let backing: &'static mut HashMap<usize, [u8; PAGE_SIZE]> =
            Box::leak(Box::new(HashMap::new()));
        let mut pager = Pager::open(InMemoryStorage::new(backing)).unwrap();
        let root = pager.get_page(ROOT_PAGE_NUM);
        node::leaf::initialize(root);
        node::common::set_root(root, true);
        pager
    }

    fn insert(pager: &mut Pager<InMemoryStorage<'static>>, id: u32) {
        let pos = table_find(pager, ROOT_PAGE_NUM, id);
        let row = Row::new(id, "user", "user@example.com").unwrap();
        leaf_node_insert(pager, pos.page_num, pos.cell_num, id, &row);
    }

    fn scan_ids(pager: &mut Pager<InMemoryStorage<'static>>) -> Vec<u32> {
        let start = table_start(pager, ROOT_PAGE_NUM);
        let mut ids = Vec::new();
        let (mut page_num, mut cell_num) = (start.page_num, start.cell_num);
        let leaf = pager.get_page(page_num);
        if node::leaf::num_cells(leaf) == 0 {
            return ids;
        }
        loop {
            ids.push(cursor_value(pager, page_num, cell_num).id);
            let (next_page, next_cell, done) = cursor_advance(pager, page_num, cell_num);
            if done {
                break;
            }
            page_num = next_page;
            cell_num = next_cell;
        }
        ids
    }

    #[test]
    fn insert_and_find_within_single_leaf() {
        let mut pager = fresh_pager();
        for id in [5, 1, 3] {
            insert(&mut pager, id);
        }
        assert_eq!(scan_ids(&mut pager), vec![1, 3, 5]);
    }

    #[test]
    fn inserting_past_one_leaf_promotes_a_root() {
        let mut pager = fresh_pager();
        for id in 1..=(node::leaf::MAX_CELLS + 1) {
            insert(&mut pager, id);
        }
        assert_eq!(
            node::common::node_type(pager.get_page(ROOT_PAGE_NUM)),
            NodeType::Internal
        );
        let expected: Vec<u32> = (1..=(node::leaf::MAX_CELLS + 1)).collect();
        assert_eq!(scan_ids(&mut pager), expected);
    }

    #[test]
    fn inserting_enough_to_force_internal_split_keeps_all_keys_reachable() {
        let mut pager = fresh_pager();
        let total = node::leaf::MAX_CELLS * (node::internal::MAX_CELLS + 3);
        for id in 1..=total {
            insert(&mut pager, id);
        }
        let expected: Vec<u32> = (1..=total).collect();
        assert_eq!(scan_ids(&mut pager), expected);
    }

    #[test]
    fn deleting_ascending_merges_leaves_without_losing_keys() {
        let mut pager = fresh_pager();
        let total = node::leaf::MAX_CELLS * 6;
        for id in 1..=total {
            insert(&mut pager, id);
        }
        for id in 1..=(total / 2) {
            let pos = table_find(&mut pager, ROOT_PAGE_NUM, id);
            leaf_node_delete(&mut pager, pos.page_num, pos.cell_num);
        }
        let expected: Vec<u32> = (total / 2 + 1..=total).collect();
        assert_eq!(scan_ids(&mut pager), expected);
    }

    #[test]
    fn deleting_everything_collapses_back_to_a_leaf_root() {
        let mut pager = fresh_pager();
        let total = node::leaf::MAX_CELLS * 6;
        for id in 1..=total {
            insert(&mut pager, id);
        }
        for id in (1..=total).rev() {
            let pos = table_find(&mut pager, ROOT_PAGE_NUM, id);
            leaf_node_delete(&mut pager, pos.page_num, pos.cell_num);
        }
        assert_eq!(scan_ids(&mut pager), Vec::<u32>::new());
        assert_eq!(
            node::common::node_type(pager.get_page(ROOT_PAGE_NUM)),
            NodeType::Leaf
        );
        assert!(node::common::is_root(pager.get_page(ROOT_PAGE_NUM)));
    }
}
