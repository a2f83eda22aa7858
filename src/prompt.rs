//! Validated console input.
//!
//! The backup engine never sees raw text: everything typed by the user passes
//! through these helpers first and arrives as names, paths, or booleans.

use crate::error::DrivebakError;
use crate::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Print `question` and read one line, without the trailing newline.
///
/// Returns [`DrivebakError::InputClosed`] on end of input.
pub fn ask_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{question}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(DrivebakError::InputClosed);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Ask a yes/no question until the answer is `y` or `n` (any case).
pub fn ask_yes_no<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    loop {
        let answer = ask_line(input, output, &format!("{question} (y/n): "))?;
        match parse_yes_no(&answer) {
            Some(value) => return Ok(value),
            None => writeln!(output, "Please answer 'y' or 'n'.")?,
        }
    }
}

fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" => Some(true),
        "n" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated list of folder names, dropping blanks
pub fn parse_folder_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Clean a pasted destination path: surrounding whitespace and quotes are removed.
///
/// Returns `None` when nothing is left.
pub fn clean_destination(input: &str) -> Option<PathBuf> {
    let cleaned = input.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(PathBuf::from(cleaned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_folder_list() {
        assert_eq!(
            parse_folder_list("Pictures, Videos ,Music"),
            vec!["Pictures", "Videos", "Music"]
        );
        assert_eq!(parse_folder_list(" , ,Docs,,"), vec!["Docs"]);
        assert!(parse_folder_list("").is_empty());
        assert_eq!(parse_folder_list("My Photos"), vec!["My Photos"]);
    }

    #[test]
    fn test_clean_destination() {
        assert_eq!(
            clean_destination("\"D:\\Backups\\2024\""),
            Some(PathBuf::from("D:\\Backups\\2024"))
        );
        assert_eq!(
            clean_destination("  /mnt/usb/backup \n"),
            Some(PathBuf::from("/mnt/usb/backup"))
        );
        assert_eq!(
            clean_destination("'/media/my disk'"),
            Some(PathBuf::from("/media/my disk"))
        );
        assert_eq!(clean_destination("\"\""), None);
        assert_eq!(clean_destination("   "), None);
    }

    #[test]
    fn test_ask_yes_no_reprompts_until_valid() {
        let mut input = Cursor::new("maybe\nyes\nY\n");
        let mut output = Vec::new();

        let answer = ask_yes_no(&mut input, &mut output, "Continue?").unwrap();
        assert!(answer);

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches("Continue? (y/n): ").count(), 3);
        assert_eq!(text.matches("Please answer").count(), 2);
    }

    #[test]
    fn test_ask_yes_no_accepts_lowercase_no() {
        let mut input = Cursor::new("n\n");
        let mut output = Vec::new();
        assert!(!ask_yes_no(&mut input, &mut output, "Create it?").unwrap());
    }

    #[test]
    fn test_ask_yes_no_end_of_input() {
        let mut input = Cursor::new("what\n");
        let mut output = Vec::new();
        assert!(matches!(
            ask_yes_no(&mut input, &mut output, "Continue?"),
            Err(DrivebakError::InputClosed)
        ));
    }

    #[test]
    fn test_ask_line_strips_line_ending() {
        let mut input = Cursor::new("Pictures, Music\r\n");
        let mut output = Vec::new();
        let line = ask_line(&mut input, &mut output, "Folders: ").unwrap();
        assert_eq!(line, "Pictures, Music");
        assert_eq!(String::from_utf8(output).unwrap(), "Folders: ");
    }
}
