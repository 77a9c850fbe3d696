use serde::{Deserialize, Serialize};
use std::fmt;

/// Key code as the game's keydown handler reads it from `event.keyCode`.
/// Opaque: whatever the oracle returns is passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u32);

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four arrow keys the game listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Left,
    Up,
    Right,
    Down,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Left, Move::Up, Move::Right, Move::Down];

    pub fn key_code(self) -> KeyCode {
        match self {
            Move::Left => KeyCode(37),
            Move::Up => KeyCode(38),
            Move::Right => KeyCode(39),
            Move::Down => KeyCode(40),
        }
    }

    pub fn from_key_code(code: KeyCode) -> Option<Move> {
        Move::ALL.into_iter().find(|m| m.key_code() == code)
    }
}

impl From<Move> for KeyCode {
    fn from(mv: Move) -> Self {
        mv.key_code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEventType {
    #[serde(rename = "keydown")]
    KeyDown,
}

impl KeyEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyEventType::KeyDown => "keydown",
        }
    }
}

/// Stand-in returned for `event.target` instead of a real document node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StubTarget {
    pub tag_name: String,
}

/// Event-initialisation primitive a host exposes. Exactly one is used per host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InitPrimitive {
    /// `initKeyboardEvent(..., keyCode, charCode)` with both set to the code.
    InitKeyboardEvent,
    /// Legacy `initKeyEvent(..., keyCode, charCode)` with a zero char code.
    InitKeyEvent,
}

impl InitPrimitive {
    pub fn char_code(self, key: KeyCode) -> u32 {
        match self {
            InitPrimitive::InitKeyboardEvent => key.0,
            InitPrimitive::InitKeyEvent => 0,
        }
    }
}

/// A key press whose observable properties are fixed at construction.
///
/// Hosts must make `keyCode`, `which`, `target`, `metaKey` and `shiftKey`
/// read back exactly these values, whatever the platform's event
/// initialisation would compute on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntheticKeyEvent {
    #[serde(rename = "type")]
    event_type: KeyEventType,
    key_code: KeyCode,
    which: KeyCode,
    target: StubTarget,
    meta_key: bool,
    shift_key: bool,
    ctrl_key: bool,
    alt_key: bool,
    bubbles: bool,
    cancelable: bool,
}

impl SyntheticKeyEvent {
    pub fn key_down(code: KeyCode, target_tag: &str) -> Self {
        Self {
            event_type: KeyEventType::KeyDown,
            key_code: code,
            which: code,
            target: StubTarget { tag_name: target_tag.to_string() },
            meta_key: false,
            shift_key: false,
            ctrl_key: false,
            alt_key: false,
            bubbles: true,
            cancelable: true,
        }
    }

    pub fn event_type(&self) -> KeyEventType {
        self.event_type
    }

    pub fn key_code(&self) -> KeyCode {
        self.key_code
    }

    pub fn which(&self) -> KeyCode {
        self.which
    }

    pub fn target(&self) -> &StubTarget {
        &self.target
    }

    pub fn meta_key(&self) -> bool {
        self.meta_key
    }

    pub fn shift_key(&self) -> bool {
        self.shift_key
    }

    pub fn ctrl_key(&self) -> bool {
        self.ctrl_key
    }

    pub fn alt_key(&self) -> bool {
        self.alt_key
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn cancelable(&self) -> bool {
        self.cancelable
    }
}

/// Identifies an event a host has constructed but not yet delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

/// What the host reads back from the constructed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedProperties {
    pub key_code: KeyCode,
    pub which: KeyCode,
    pub meta_key: bool,
    pub shift_key: bool,
    pub target_tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedKeyEvent {
    pub id: EventId,
    pub observed: ObservedProperties,
}
