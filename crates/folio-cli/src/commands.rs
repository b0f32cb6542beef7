//! Line commands standing in for remote-control signals.

use folio_core::navigation::RemoteKey;
use folio_core::viewer::Input;

pub const HELP: &str = "\
keys:  left right up down ok back esc bs pgup pgdn home end
text:  type <text>
menu:  hover <n>      (pointer over the n-th entry, 0-based)
other: retry  help  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Inputs(Vec<Input>),
    Hover(usize),
    Help,
    Quit,
    Unknown(String),
}

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));

    let key = match word.to_ascii_lowercase().as_str() {
        "" => return Command::Inputs(Vec::new()),
        "left" | "l" => RemoteKey::Left,
        "right" | "r" => RemoteKey::Right,
        "up" | "u" => RemoteKey::Up,
        "down" | "d" => RemoteKey::Down,
        "ok" | "enter" => RemoteKey::Ok,
        "back" | "b" => RemoteKey::Back,
        "esc" | "escape" => RemoteKey::Escape,
        "bs" | "backspace" => RemoteKey::Backspace,
        "pgup" | "pageup" => RemoteKey::PageUp,
        "pgdn" | "pagedown" => RemoteKey::PageDown,
        "home" => RemoteKey::Home,
        "end" => RemoteKey::End,
        "type" => {
            return Command::Inputs(
                rest.chars()
                    .map(|c| Input::Key(RemoteKey::Char(c)))
                    .collect(),
            )
        }
        "hover" => {
            return match rest.trim().parse() {
                Ok(index) => Command::Hover(index),
                Err(_) => Command::Unknown(line.to_string()),
            }
        }
        "retry" => return Command::Inputs(vec![Input::Retry]),
        "help" | "?" => return Command::Help,
        "quit" | "q" | "exit" => return Command::Quit,
        _ => return Command::Unknown(line.to_string()),
    };
    Command::Inputs(vec![Input::Key(key)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(parse("left"), Command::Inputs(vec![Input::Key(RemoteKey::Left)]));
        assert_eq!(parse("  OK "), Command::Inputs(vec![Input::Key(RemoteKey::Ok)]));
        assert_eq!(parse("bs"), Command::Inputs(vec![Input::Key(RemoteKey::Backspace)]));
    }

    #[test]
    fn test_type_keeps_inner_spaces() {
        assert_eq!(
            parse("type a b"),
            Command::Inputs(vec![
                Input::Key(RemoteKey::Char('a')),
                Input::Key(RemoteKey::Char(' ')),
                Input::Key(RemoteKey::Char('b')),
            ])
        );
    }

    #[test]
    fn test_hover_and_control() {
        assert_eq!(parse("hover 2"), Command::Hover(2));
        assert!(matches!(parse("hover x"), Command::Unknown(_)));
        assert_eq!(parse("retry"), Command::Inputs(vec![Input::Retry]));
        assert_eq!(parse("q"), Command::Quit);
        assert_eq!(parse(""), Command::Inputs(Vec::new()));
        assert!(matches!(parse("jump"), Command::Unknown(_)));
    }
}
