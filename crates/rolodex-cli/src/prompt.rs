use std::io::{self, BufRead, Write};

use color_eyre::eyre::{Report, Result};

/// Standard input reached end of file. The shell treats it as a quit.
#[derive(Debug, thiserror::Error)]
#[error("Input closed")]
pub struct InputClosed;

pub fn is_input_closed(err: &Report) -> bool {
    err.downcast_ref::<InputClosed>().is_some()
}

/// Read one trimmed line. End of input ends the session.
pub fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    next_line(&mut io::stdin().lock())
}

fn next_line(reader: &mut impl BufRead) -> Result<String> {
    let mut input = String::new();
    if reader.read_line(&mut input)? == 0 {
        return Err(InputClosed.into());
    }
    Ok(input.trim().to_string())
}

/// Blank input keeps the current value.
pub fn read_optional(prompt: &str) -> Result<Option<String>> {
    let value = read_line(prompt)?;
    Ok(if value.is_empty() { None } else { Some(value) })
}

pub fn read_id(prompt: &str) -> Result<Option<u64>> {
    let value = read_line(prompt)?;
    Ok(value.parse().ok())
}

pub fn confirm(prompt: &str) -> Result<bool> {
    let value = read_line(&format!("{} [y/N]: ", prompt))?;
    Ok(matches!(value.to_ascii_lowercase().as_str(), "y" | "yes"))
}

pub fn print_box(title: &str, items: &[(&str, &str)]) {
    const WIDTH: usize = 36;
    println!();
    println!("╔{}╗", "═".repeat(WIDTH));
    println!("║{:^width$}║", title, width = WIDTH);
    println!("╠{}╣", "═".repeat(WIDTH));
    for (key, label) in items {
        println!("║  {:>2}. {:<width$}║", key, label, width = WIDTH - 6);
    }
    println!("╚{}╝", "═".repeat(WIDTH));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_input_is_reported_as_closed() {
        let mut input: &[u8] = b"  alice \n\n";
        assert_eq!(next_line(&mut input).unwrap(), "alice");
        assert_eq!(next_line(&mut input).unwrap(), "");

        let err = next_line(&mut input).unwrap_err();
        assert!(is_input_closed(&err));
        assert!(!is_input_closed(&color_eyre::eyre::eyre!("disk full")));
    }
}
