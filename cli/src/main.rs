//! One-shot provisioning tool: plaintext passwords in, Argon2id hashes out.
//!
//! Hashes are printed in input order, one per line, for pasting into
//! `data/auth.yaml`. With `--yaml`, inputs are `username=password` pairs and
//! the output is a ready-made `credentials` block.

use std::io::{self, BufRead};

use clap::Parser;
use matchhub::services::password::{self, PasswordError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("no passwords given; pass them as arguments or one per line on stdin")]
    NoInput,
    #[error("input {0} is not of the form `username=password` with a username of A-Z, a-z, 0-9, `_` or `-`")]
    MalformedPair(usize),
    #[error("failed to read stdin: {0}")]
    Stdin(#[from] io::Error),
    #[error("hashing failed: {0}")]
    Hash(#[from] PasswordError),
}

#[derive(Parser, Debug)]
#[command(name = "matchhub-hash", about = "Hash plaintext passwords for data/auth.yaml")]
struct Cli {
    /// Plaintext passwords. Read one per line from stdin when omitted.
    passwords: Vec<String>,

    /// Treat each input as `username=password` and print an auth.yaml credentials block.
    #[arg(long)]
    yaml: bool,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let inputs = if cli.passwords.is_empty() {
        read_lines(io::stdin().lock())?
    } else {
        cli.passwords
    };
    if inputs.is_empty() {
        return Err(CliError::NoInput);
    }

    if cli.yaml {
        print!("{}", render_yaml(&hash_pairs(&inputs)?));
    } else {
        for hash in hash_all(&inputs)? {
            println!("{hash}");
        }
    }
    Ok(())
}

fn read_lines(reader: impl BufRead) -> Result<Vec<String>, io::Error> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if !line.is_empty() {
            lines.push(line.to_owned());
        }
    }
    Ok(lines)
}

fn hash_all(passwords: &[String]) -> Result<Vec<String>, CliError> {
    passwords
        .iter()
        .map(|p| password::hash_password(p).map_err(CliError::from))
        .collect()
}

fn hash_pairs(entries: &[String]) -> Result<Vec<(String, String)>, CliError> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let (username, plaintext) = parse_pair(entry).ok_or(CliError::MalformedPair(i + 1))?;
            Ok((username, password::hash_password(plaintext)?))
        })
        .collect()
}

fn parse_pair(entry: &str) -> Option<(String, &str)> {
    let (username, plaintext) = entry.split_once('=')?;
    let username = username.trim();
    if username.is_empty() || plaintext.is_empty() || !is_plain_username(username) {
        return None;
    }
    Some((username.to_owned(), plaintext))
}

/// Usernames are written into quoted YAML scalars without escaping, so only
/// allow characters that need none.
fn is_plain_username(username: &str) -> bool {
    username.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn render_yaml(users: &[(String, String)]) -> String {
    let mut out = String::from("credentials:\n  usernames:\n");
    for (username, hash) in users {
        out.push_str(&format!("    \"{username}\":\n      name: \"{username}\"\n      password: \"{hash}\"\n"));
    }
    out
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
