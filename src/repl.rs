//! Terminal I/O and the `.`-prefixed meta-commands that bypass the SQL-ish
//! statement language to poke at the engine directly.

use crate::node::{self, common::NodeType};
use crate::pager::Pager;
use crate::row::ROW_SIZE;
use crate::storage::Storage;
use std::io::{BufRead, Write};

pub fn print_prompt() {
    print!("db > ");
    std::io::stdout().flush().unwrap();
}

pub fn read_input() -> Option<String> {
    let mut input = String::new();
    let mut stdin = std::io::stdin().lock();
    let bytes_read = stdin.read_line(&mut input).expect("error reading input");
    if bytes_read == 0 {
        return None;
    }
    Some(input.trim_end().to_string())
}

pub enum MetaCommand {
    Exit,
    PrintTree,
    PrintConstants,
    PrintPage(u32),
}

#[derive(Debug)]
pub struct UnrecognizedMetaCommand;

pub fn parse_meta_command(input: &str) -> Result<MetaCommand, UnrecognizedMetaCommand> {
    let mut parts = input.split_whitespace();
    match parts.next() {
        Some(".exit") => Ok(MetaCommand::Exit),
        Some(".btree") => Ok(MetaCommand::PrintTree),
        Some(".constants") => Ok(MetaCommand::PrintConstants),
        Some(".page") => parts
            .next()
            .and_then(|n| n.parse().ok())
            .map(MetaCommand::PrintPage)
            .ok_or(UnrecognizedMetaCommand),
        _ => Err(UnrecognizedMetaCommand),
    }
}

pub fn print_constants() {
    println!("ROW_SIZE: {}", ROW_SIZE);
    println!("COMMON_NODE_HEADER_SIZE: {}", node::common::HEADER_SIZE);
    println!("LEAF_NODE_HEADER_SIZE: {}", node::leaf::HEADER_SIZE);
    println!("LEAF_NODE_CELL_SIZE: {}", node::leaf::CELL_SIZE);
    println!("LEAF_NODE_SPACE_FOR_CELLS: {}", node::leaf::SPACE_FOR_CELLS);
    println!("LEAF_NODE_MAX_CELLS: {}", node::leaf::MAX_CELLS);
}

pub fn print_tree<T: Storage>(pager: &mut Pager<T>, page_num: u32, indentation_level: u32) {
    let page = *pager.get_page(page_num);
    match node::common::node_type(&page) {
        NodeType::Leaf => {
            let num_cells = node::leaf::num_cells(&page);
            indent(indentation_level);
            println!("- leaf (size {num_cells})");
            for i in 0..num_cells {
                indent(indentation_level + 1);
                println!("- {}", node::leaf::key(&page, i));
            }
        }
        NodeType::Internal => {
            let num_keys = node::internal::num_keys(&page);
            indent(indentation_level);
            println!("- internal (size {num_keys})");
            for i in 0..num_keys {
                let child = node::internal::child(&page, i);
                print_tree(pager, child, indentation_level + 1);
                indent(indentation_level + 1);
                println!("- key {}", node::internal::key(&page, i));
            }
            let right_child = node::internal::right_child(&page);
            print_tree(pager, right_child, indentation_level + 1);
        }
    }
}

/// Dumps the raw bytes of one page as hex, for `.page <n>` debugging.
pub fn print_page<T: Storage>(pager: &mut Pager<T>, page_num: u32) {
    let page = pager.get_page(page_num);
    for (i, chunk) in page.chunks(16).enumerate() {
        print!("{:04x}: ", i * 16);
        for byte in chunk {
            print!("{byte:02x} ");
        }
        println!();
    }
}

fn indent(level: u32) {
    for _ in 0..level {
        print!("  ");
    }
}
