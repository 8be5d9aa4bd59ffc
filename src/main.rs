//! MikroDB - Embeddable, Multi-Table Key-Value Storage Engine
//! Interactive REPL for exercising an engine instance from the command line.

use std::io::{self, BufRead, Write};

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

use config::Config;
use engine::filter::QueryOptions;
use engine::{GetResult, MikroDb};
use types::{Value, WriteOp, WriteOptions};

fn main() {
    env_logger::init();

    println!();
    println!("  ╔═══════════════════════════════════════════╗");
    println!("  ║            MikroDB Storage Engine          ║");
    println!("  ║     Multi-Table Key-Value Store v1.0.0     ║");
    println!("  ╚═══════════════════════════════════════════╝");
    println!();
    println!("  Commands:");
    println!("    write <table> <key> <value> [v:<expectedVersion>] - Write a record");
    println!("    get <table> <key>       - Retrieve a record by key");
    println!("    all <table>             - List every key in a table");
    println!("    del <table> <key>       - Delete a record");
    println!("    droptable <table>       - Remove a table from memory");
    println!("    size <table>            - Count live keys in a table");
    println!("    checkpoint              - Force a checkpoint now");
    println!("    flush                   - Flush WAL and pending writes");
    println!("    dump [table]            - Write a JSON snapshot to disk");
    println!("    stats                   - Show engine metrics");
    println!("    exit                    - Shut down the engine");
    println!();

    let config = Config::default();
    let mut db = match MikroDb::open(config) {
        Ok(db) => db,
        Err(err) => {
            eprintln!("[ERROR] Failed to open engine: {}", err);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("mikrodb> ");
        stdout.flush().unwrap();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap() == 0 {
            break; // EOF
        }

        let parts: Vec<&str> = line.trim().split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0].to_lowercase().as_str() {
            "write" | "put" => {
                if parts.len() < 4 {
                    println!("  Usage: write <table> <key> <value> [v:<expectedVersion>]");
                    continue;
                }
                let table = parts[1];
                let key = parts[2];
                let mut value_parts = parts[3..].to_vec();
                let mut expected_version = None;
                if let Some(last) = value_parts.last() {
                    if let Some(v) = last.strip_prefix("v:") {
                        if let Ok(parsed) = v.parse::<u32>() {
                            expected_version = Some(parsed);
                            value_parts.pop();
                        }
                    }
                }
                if value_parts.is_empty() {
                    println!("  Usage: write <table> <key> <value> [v:<expectedVersion>]");
                    continue;
                }
                let mut op = WriteOp::new(table, key, Value::Str(value_parts.join(" ")));
                if let Some(version) = expected_version {
                    op = op.with_expected_version(version);
                }
                match db.write(vec![op], WriteOptions::default()) {
                    Ok(true) => println!("  OK"),
                    Ok(false) => println!("  REJECTED (version mismatch)"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "get" => {
                if parts.len() < 3 {
                    println!("  Usage: get <table> <key>");
                    continue;
                }
                match db.get(parts[1], Some(parts[2]), None) {
                    Ok(GetResult::Single(Some(record))) => {
                        println!("  {:?} (v{}, ts {})", record.value, record.version, record.timestamp)
                    }
                    Ok(GetResult::Single(None)) => println!("  (not found)"),
                    Ok(_) => unreachable!("single-key get always returns GetResult::Single"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "all" => {
                if parts.len() < 2 {
                    println!("  Usage: all <table>");
                    continue;
                }
                match db.get(parts[1], None, Some(QueryOptions::new())) {
                    Ok(GetResult::Filtered(values)) => {
                        if values.is_empty() {
                            println!("  (empty)");
                        } else {
                            for value in &values {
                                println!("  {:?}", value);
                            }
                            println!("  ({} entries)", values.len());
                        }
                    }
                    Ok(_) => unreachable!("querying with options always returns GetResult::Filtered"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "del" | "delete" => {
                if parts.len() < 3 {
                    println!("  Usage: del <table> <key>");
                    continue;
                }
                match db.delete(parts[1], parts[2], None) {
                    Ok(true) => println!("  OK (deleted)"),
                    Ok(false) => println!("  (not found)"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "droptable" => {
                if parts.len() < 2 {
                    println!("  Usage: droptable <table>");
                    continue;
                }
                match db.delete_table(parts[1]) {
                    Ok(()) => println!("  OK (table dropped from memory)"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "size" => {
                if parts.len() < 2 {
                    println!("  Usage: size <table>");
                    continue;
                }
                match db.get_table_size(parts[1]) {
                    Ok(size) => println!("  {}", size),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "checkpoint" => match db.checkpoint(true) {
                Ok(()) => println!("  OK (checkpoint complete)"),
                Err(e) => println!("  ERROR: {}", e),
            },
            "flush" => match db.flush() {
                Ok(()) => println!("  OK (flushed)"),
                Err(e) => println!("  ERROR: {}", e),
            },
            "dump" => {
                let table = parts.get(1).copied();
                match db.dump(table) {
                    Ok(()) => println!("  OK (dumped)"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "stats" => println!("{}", db.metrics().report()),
            "exit" | "quit" | "q" => {
                println!("  Shutting down MikroDB...");
                if let Err(e) = db.flush() {
                    eprintln!("[WARN] final flush failed: {}", e);
                }
                break;
            }
            _ => {
                println!("  Unknown command: '{}'. Type 'exit' to quit.", parts[0]);
            }
        }
    }
}
