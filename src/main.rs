mod btree;
mod node;
mod pager;
mod repl;
mod row;
mod storage;
mod table;
mod vm;

use repl::{parse_meta_command, print_constants, print_page, print_prompt, print_tree, read_input, MetaCommand};
use storage::FileStorage;
use table::Table;
use vm::{execute_statement, prepare_statement};

fn main() {
    let filename = std::env::args()
        .nth(1)
        .expect("must supply a database filename");

    let storage = FileStorage::open(std::path::Path::new(&filename)).expect("failed to open db file");
    let mut table = Table::open(storage).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    loop {
        print_prompt();
        let input = match read_input() {
            Some(input) => input,
            None => break,
        };

        if let Some(rest) = input.strip_prefix('.') {
            let command = format!(".{rest}");
            match parse_meta_command(&command) {
                Ok(MetaCommand::Exit) => {
                    table.close();
                    return;
                }
                Ok(MetaCommand::PrintTree) => {
                    println!("Tree:");
                    print_tree(table.pager(), btree::ROOT_PAGE_NUM, 0);
                }
                Ok(MetaCommand::PrintConstants) => {
                    println!("Constants:");
                    print_constants();
                }
                Ok(MetaCommand::PrintPage(page_num)) => {
                    print_page(table.pager(), page_num);
                }
                Err(_) => println!("Unrecognized command '{input}'"),
            }
            continue;
        }

        let statement = match prepare_statement(&input) {
            Ok(statement) => statement,
            Err(error) => {
                println!("{error}");
                continue;
            }
        };

        match execute_statement(&statement, &mut table) {
            Ok(()) => println!("Executed."),
            Err(error) => println!("{error}"),
        }
    }
}
