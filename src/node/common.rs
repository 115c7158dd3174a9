//! Pure accessors over the 6-byte header shared by every page, regardless
//! of node kind. No I/O lives here — only byte layout.

use crate::pager::Page;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// node_type(1) + is_root(1) + parent_page_num(4).
pub const HEADER_SIZE: usize = 6;

#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    Internal = 0,
    Leaf = 1,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    node_type: NodeType,
    #[serde(serialize_with = "bool_as_u8", deserialize_with = "bool_from_u8")]
    is_root: bool,
    parent_page_num: u32,
}

fn bool_as_u8<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u8(*value as u8)
}

fn bool_from_u8<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    match u8::deserialize(d)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(serde::de::Error::invalid_value(
            serde::de::Unexpected::Unsigned(other as u64),
            &"zero or one",
        )),
    }
}

fn header(page: &Page) -> Header {
    bincode::deserialize(&page[..HEADER_SIZE]).expect("header decode")
}

fn set_header(page: &mut Page, header: &Header) {
    bincode::serialize_into(&mut page[..HEADER_SIZE], header).expect("header encode")
}

pub fn node_type(page: &Page) -> NodeType {
    header(page).node_type
}

pub fn set_node_type(page: &mut Page, node_type: NodeType) {
    let mut h = header(page);
    h.node_type = node_type;
    set_header(page, &h);
}

pub fn is_root(page: &Page) -> bool {
    header(page).is_root
}

pub fn set_root(page: &mut Page, is_root: bool) {
    let mut h = header(page);
    h.is_root = is_root;
    set_header(page, &h);
}

pub fn parent(page: &Page) -> u32 {
    header(page).parent_page_num
}

pub fn set_parent(page: &mut Page, parent_page_num: u32) {
    let mut h = header(page);
    h.parent_page_num = parent_page_num;
    set_header(page, &h);
}

/// Shared helper for the leaf/internal body fields, which are plain
/// fixed-width integers not worth a serde round trip.
pub(crate) fn read_u32(page: &Page, offset: usize) -> u32 {
    u32::from_ne_bytes(
        page[offset..offset + 4]
            .try_into()
            .expect("u32 field slice"),
    )
}

pub(crate) fn write_u32(page: &mut Page, offset: usize, value: u32) {
    page[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pager::PAGE_SIZE;

    #[test]
    fn header_round_trips_on_zeroed_page() {
        let mut page = [0u8; PAGE_SIZE];
        assert_eq!(node_type(&page), NodeType::Internal);
        assert!(!is_root(&page));
        assert_eq!(parent(&page), 0);

        set_node_type(&mut page, NodeType::Leaf);
        set_root(&mut page, true);
        set_parent(&mut page, 17);

        assert_eq!(node_type(&page), NodeType::Leaf);
        assert!(is_root(&page));
        assert_eq!(parent(&page), 17);
    }
}
