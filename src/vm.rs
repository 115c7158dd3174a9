//! The tiny statement language: `insert`, `select`, and `select where id =
//! N` and `delete where id = N` (the latter two not in the original
//! tutorial's grammar, added here since a store with no way to read or
//! remove a single row isn't much of one).

use crate::row::{Row, StringTooLong, COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE};
use crate::storage::Storage;
use crate::table::{InsertError, Table};

pub enum Statement {
    Insert(Row),
    Select { id_filter: Option<u32> },
    Delete { id: u32 },
}

#[derive(Debug)]
pub enum PrepareError {
    SyntaxError,
    NegativeId,
    StringTooLong,
    UnrecognizedStatement,
}

impl std::fmt::Display for PrepareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrepareError::SyntaxError => write!(f, "Syntax error. Could not parse statement."),
            PrepareError::NegativeId => write!(f, "ID must be positive."),
            PrepareError::StringTooLong => write!(f, "String is too long."),
            PrepareError::UnrecognizedStatement => write!(f, "Unrecognized keyword at start of input."),
        }
    }
}

pub fn prepare_statement(input: &str) -> Result<Statement, PrepareError> {
    if input.starts_with("insert") {
        prepare_insert(input)
    } else if input == "select" {
        Ok(Statement::Select { id_filter: None })
    } else if let Some(rest) = input.strip_prefix("select where id = ") {
        let id: u32 = rest.parse().map_err(|_| PrepareError::SyntaxError)?;
        Ok(Statement::Select { id_filter: Some(id) })
    } else if let Some(rest) = input.strip_prefix("delete where id = ") {
        let id: u32 = rest.parse().map_err(|_| PrepareError::SyntaxError)?;
        Ok(Statement::Delete { id })
    } else {
        Err(PrepareError::UnrecognizedStatement)
    }
}

fn prepare_insert(input: &str) -> Result<Statement, PrepareError> {
    let mut parts = input.split(' ');
    let _keyword = parts.next();
    let (id_str, username, email) = match (parts.next(), parts.next(), parts.next()) {
        (Some(id), Some(username), Some(email)) => (id, username, email),
        _ => return Err(PrepareError::SyntaxError),
    };

    let id: i64 = id_str.parse().map_err(|_| PrepareError::SyntaxError)?;
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }
    if username.len() > COLUMN_USERNAME_SIZE || email.len() > COLUMN_EMAIL_SIZE {
        return Err(PrepareError::StringTooLong);
    }

    let row = Row::new(id as u32, username, email).map_err(|StringTooLong| PrepareError::StringTooLong)?;
    Ok(Statement::Insert(row))
}

#[derive(Debug)]
pub enum ExecuteError {
    DuplicateKey,
}

impl std::fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecuteError::DuplicateKey => write!(f, "Error: Duplicate key."),
        }
    }
}

pub fn execute_statement<T: Storage>(
    statement: &Statement,
    table: &mut Table<T>,
) -> Result<(), ExecuteError> {
    match statement {
        Statement::Insert(row) => table.insert(row).map_err(|InsertError::DuplicateKey| ExecuteError::DuplicateKey),
        Statement::Select { id_filter } => {
            execute_select(table, *id_filter);
            Ok(())
        }
        Statement::Delete { id } => {
            if !table.delete(*id) {
                println!("No row with id {id}.");
            }
            Ok(())
        }
    }
}

fn execute_select<T: Storage>(table: &mut Table<T>, id_filter: Option<u32>) {
    if let Some(id) = id_filter {
        if let Some(row) = table.find_row(id) {
            println!("{row}");
        }
        return;
    }

    let mut cursor = table.start();
    while !cursor.is_end() {
        println!("{}", table.cursor_value(&cursor));
        table.advance(&mut cursor);
    }
}
