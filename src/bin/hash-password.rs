//! Print a bcrypt hash for ADMIN_PASSWORD_HASH.
//!
//! The password comes from the first argument, or from stdin when no
//! argument is given so it stays out of shell history.
use bcrypt::{hash, DEFAULT_COST};
use std::io::{self, BufRead};

fn read_password() -> io::Result<String> {
    if let Some(arg) = std::env::args().nth(1) {
        return Ok(arg);
    }
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn main() {
    let password = match read_password() {
        Ok(p) if !p.is_empty() => p,
        Ok(_) => {
            eprintln!("Usage: hash-password <PASSWORD>   (or pipe it on stdin)");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Could not read password: {}", e);
            std::process::exit(1);
        }
    };

    match hash(&password, DEFAULT_COST) {
        Ok(hashed) => {
            println!("# bcrypt cost {}; add to .env:", DEFAULT_COST);
            println!("ADMIN_PASSWORD_HASH={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
