//! Parsing of console lines.
//!
//! Lines starting with `:` control the console itself; everything else is a
//! debugger command.

use eyre::{WrapErr, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(String),
    Toggle { filename: String, line: usize },
    Delete { filename: String, line: usize },
    Config { name: String, text: String },
    List { filename: String, line: usize },
    Previous,
    Next,
    Quit,
}

pub fn parse(line: &str) -> eyre::Result<Input> {
    let Some(directive) = line.trim_start().strip_prefix(':') else {
        return Ok(Input::Command(line.to_string()));
    };

    let (word, rest) = directive
        .trim()
        .split_once(char::is_whitespace)
        .unwrap_or((directive.trim(), ""));
    let rest = rest.trim();

    let input = match word {
        "b" => {
            let (filename, line) = location(rest)?;
            Input::Toggle { filename, line }
        }
        "d" => {
            let (filename, line) = location(rest)?;
            Input::Delete { filename, line }
        }
        "l" => {
            let (filename, line) = location(rest)?;
            Input::List { filename, line }
        }
        "c" => {
            let (name, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            if name.is_empty() {
                bail!("usage: :c NAME TEXT");
            }
            Input::Config {
                name: name.to_string(),
                text: text.trim_start().replace("\\n", "\n"),
            }
        }
        "up" => Input::Previous,
        "down" => Input::Next,
        "q" => Input::Quit,
        other => bail!("unknown directive :{other}"),
    };
    Ok(input)
}

/// The history entry last recalled with `:up` or `:down`.
///
/// A blank line submits it. Typing anything else discards it.
#[derive(Debug, Default)]
pub struct Recall {
    entry: Option<String>,
}

impl Recall {
    pub fn set(&mut self, entry: Option<String>) {
        self.entry = entry;
    }

    /// The command to submit for a typed `line`.
    pub fn resolve(&mut self, line: String) -> String {
        match self.entry.take() {
            Some(entry) if line.trim().is_empty() => entry,
            _ => line,
        }
    }
}

fn location(args: &str) -> eyre::Result<(String, usize)> {
    let mut parts = args.split_whitespace();
    let (Some(filename), Some(line), None) = (parts.next(), parts.next(), parts.next()) else {
        bail!("expected FILE LINE");
    };
    let line = line
        .parse::<usize>()
        .wrap_err_with(|| format!("invalid line number {line:?}"))?;
    Ok((filename.to_string(), line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_submits_recalled_command() {
        let mut recall = Recall::default();
        recall.set(Some("print x".to_string()));

        assert_eq!(recall.resolve(String::new()), "print x");
        // consumed once submitted
        assert_eq!(recall.resolve(String::new()), "");
    }

    #[test]
    fn typed_command_discards_recall() {
        let mut recall = Recall::default();
        recall.set(Some("print x".to_string()));

        assert_eq!(recall.resolve("next".to_string()), "next");
        assert_eq!(recall.resolve("  ".to_string()), "  ");
    }

    #[test]
    fn walking_past_newest_clears_recall() {
        let mut recall = Recall::default();
        recall.set(Some("print x".to_string()));
        recall.set(None);

        assert_eq!(recall.resolve(String::new()), "");
    }

    #[test]
    fn plain_lines_are_commands() {
        assert_eq!(
            parse("break main.go:10").unwrap(),
            Input::Command("break main.go:10".to_string())
        );
        assert_eq!(parse("").unwrap(), Input::Command(String::new()));
    }

    #[test]
    fn breakpoint_directives() {
        assert_eq!(
            parse(":b main.go 10").unwrap(),
            Input::Toggle {
                filename: "main.go".to_string(),
                line: 10
            }
        );
        assert_eq!(
            parse("  :d main.go 12").unwrap(),
            Input::Delete {
                filename: "main.go".to_string(),
                line: 12
            }
        );
        assert!(parse(":b main.go").is_err());
        assert!(parse(":b main.go ten").is_err());
    }

    #[test]
    fn config_text_unescapes_newlines() {
        assert_eq!(
            parse(":c B1 print x\\nlocals").unwrap(),
            Input::Config {
                name: "B1".to_string(),
                text: "print x\nlocals".to_string()
            }
        );
        assert_eq!(
            parse(":c B1").unwrap(),
            Input::Config {
                name: "B1".to_string(),
                text: String::new()
            }
        );
        assert!(parse(":c").is_err());
    }

    #[test]
    fn console_directives() {
        assert_eq!(parse(":up").unwrap(), Input::Previous);
        assert_eq!(parse(":down").unwrap(), Input::Next);
        assert_eq!(parse(":q").unwrap(), Input::Quit);
        assert!(parse(":frobnicate").is_err());
    }
}
