//! Interactive shell over a FAT32 disk image.
//!
//! Reads commands one per line, tokenized by whitespace, and dispatches them
//! against a single `fat32_emu::Session`. The FAT32 engine itself, the image
//! format, and the filesystem operations this shell calls are the point of
//! this crate; the shell is a thin collaborator around them.

use std::io::{self, Write};

use clap::Parser;
use fat32_emu::Session;

#[derive(Parser)]
#[command(about = "A small interactive shell over a FAT32 disk image")]
struct Args {
    /// Path to the disk image (created if it does not already exist).
    disk_path: String,
}

fn main() {
    env_logger::init();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mut session = match Session::open(&args.disk_path) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("failed to open {}: {e}", args.disk_path);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    loop {
        print!("{}>", session.current_path);
        io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let mut tokens = line.trim().split_whitespace();
        let Some(cmd) = tokens.next() else {
            continue;
        };
        let arg = tokens.next();

        match cmd {
            "format" => match session.format() {
                Ok(()) => println!("Ok"),
                Err(_) => println!("Format failed"),
            },
            "ls" => {
                if !session.is_valid() {
                    println!("Unknown disk format");
                    continue;
                }
                match session.ls(arg) {
                    Ok(names) => {
                        for name in names {
                            println!("{name}");
                        }
                    }
                    Err(_) => println!("Unknown disk format"),
                }
            }
            "mkdir" => {
                let Some(name) = arg else {
                    println!("usage: mkdir <name>");
                    continue;
                };
                match session.mkdir(name) {
                    Ok(()) => println!("Ok"),
                    Err(_) => println!("mkdir failed"),
                }
            }
            "touch" => {
                let Some(name) = arg else {
                    println!("usage: touch <name>");
                    continue;
                };
                match session.touch(name) {
                    Ok(()) => println!("Ok"),
                    Err(_) => println!("touch failed"),
                }
            }
            "cd" => {
                let Some(path) = arg else {
                    println!("usage: cd <path>");
                    continue;
                };
                if session.cd(path).is_err() {
                    println!("cd failed");
                }
            }
            "exit" | "quit" => {
                println!("Goodbye!");
                break;
            }
            other => println!("Unknown command: {other}"),
        }
    }
}
