use serde::{Deserialize, Serialize};

/// Identifier for a keyboard key as reported by `KeyboardEvent.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    /// Letters are stored lower-case so Shift does not break sequences.
    Character(char),
    Digit(u8),
    Function(u8),
}

impl KeyCode {
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if ch.is_ascii_alphabetic() {
                return Some(Self::Character(ch.to_ascii_lowercase()));
            }
            if let Some(digit) = ch.to_digit(10) {
                return Some(Self::Digit(digit as u8));
            }
        }
        if let Some(function) = name.strip_prefix('F').or_else(|| name.strip_prefix('f')) {
            if let Ok(index) = function.parse::<u8>() {
                if (1..=24).contains(&index) {
                    return Some(Self::Function(index));
                }
            }
        }
        None
    }
}

/// Keys the browser reports on their own while another key is being typed.
pub fn is_modifier(name: &str) -> bool {
    matches!(
        name,
        "Shift" | "Control" | "Alt" | "AltGraph" | "Meta" | "CapsLock" | "Fn"
    )
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        " " | "Space" | "Spacebar" => Space,
        "Enter" | "Return" => Enter,
        "Tab" => Tab,
        "ArrowLeft" | "Left" => Left,
        "ArrowRight" | "Right" => Right,
        "ArrowUp" | "Up" => Up,
        "ArrowDown" | "Down" => Down,
        "Escape" | "Esc" => Escape,
        "Backspace" => Backspace,
        "Home" => Home,
        "End" => End,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Friendly names for the non-printable keys a page sequence may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Backspace,
    Home,
    End,
    PageUp,
    PageDown,
}

/// Incremental matcher for a secret key sequence.
///
/// Keys are fed one at a time; [`KeySequence::push`] reports `true` on the
/// key that completes the sequence and then starts over. A wrong key does
/// not simply reset progress: the longest suffix of the typed keys that is
/// still a prefix of the sequence is kept, so `Up Up Up Down ...` still
/// matches a sequence beginning `Up Up Down`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySequence {
    keys: Vec<KeyCode>,
    progress: usize,
}

impl KeySequence {
    pub fn new(keys: Vec<KeyCode>) -> Self {
        Self { keys, progress: 0 }
    }

    /// Up Up Down Down Left Right Left Right B A.
    pub fn konami() -> Self {
        use NamedKey::*;
        Self::new(vec![
            KeyCode::Named(Up),
            KeyCode::Named(Up),
            KeyCode::Named(Down),
            KeyCode::Named(Down),
            KeyCode::Named(Left),
            KeyCode::Named(Right),
            KeyCode::Named(Left),
            KeyCode::Named(Right),
            KeyCode::Character('b'),
            KeyCode::Character('a'),
        ])
    }

    pub fn keys(&self) -> &[KeyCode] {
        &self.keys
    }

    pub fn progress(&self) -> usize {
        self.progress
    }

    pub fn push(&mut self, key: KeyCode) -> bool {
        if self.keys.is_empty() {
            return false;
        }
        loop {
            if self.keys[self.progress] == key {
                self.progress += 1;
                break;
            }
            if self.progress == 0 {
                break;
            }
            self.progress = self.fallback(self.progress);
        }
        if self.progress == self.keys.len() {
            self.progress = 0;
            return true;
        }
        false
    }

    /// Feeds a raw `KeyboardEvent.key` value. Modifier keys are ignored and
    /// other unknown names reset progress.
    pub fn push_name(&mut self, name: &str) -> bool {
        if is_modifier(name) {
            return false;
        }
        match KeyCode::from_name(name) {
            Some(key) => self.push(key),
            None => {
                self.progress = 0;
                false
            }
        }
    }

    pub fn reset(&mut self) {
        self.progress = 0;
    }

    // Length of the longest proper prefix of keys[..matched] that is also its suffix.
    fn fallback(&self, matched: usize) -> usize {
        let typed = &self.keys[..matched];
        (1..matched)
            .rev()
            .find(|&len| typed[matched - len..] == self.keys[..len])
            .unwrap_or(0)
    }
}
