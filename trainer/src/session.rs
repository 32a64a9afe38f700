//! Session-scoped practice state.
//!
//! A [`Session`] is created when a practice interaction starts and dropped
//! when it ends. It holds the current motion and style, the argument lists
//! on display, and a memo of completed generations keyed by
//! (topic, stance, style) so identical requests are not billed twice.

use std::collections::HashMap;

use crate::core::types::{Argument, Stance, Style};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    topic: String,
    stance: Stance,
    style: Style,
}

#[derive(Debug, Clone)]
pub struct Session {
    motion: String,
    style: Style,
    favour: Vec<Argument>,
    opponents: Vec<Argument>,
    memo: HashMap<MemoKey, Vec<Argument>>,
}

impl Session {
    pub fn new(motion: impl Into<String>, style: Style) -> Self {
        Self {
            motion: motion.into().trim().to_string(),
            style,
            favour: Vec::new(),
            opponents: Vec::new(),
            memo: HashMap::new(),
        }
    }

    pub fn motion(&self) -> &str {
        &self.motion
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Switch motion. Displayed arguments are cleared; the memo is kept.
    pub fn set_motion(&mut self, motion: impl Into<String>) {
        let motion = motion.into().trim().to_string();
        if motion != self.motion {
            self.motion = motion;
            self.clear_displayed();
        }
    }

    /// Switch style. Displayed arguments are cleared; the memo is kept.
    pub fn set_style(&mut self, style: Style) {
        if style != self.style {
            self.style = style;
            self.clear_displayed();
        }
    }

    pub fn favour(&self) -> &[Argument] {
        &self.favour
    }

    pub fn opponents(&self) -> &[Argument] {
        &self.opponents
    }

    pub fn opponent(&self, index: usize) -> Option<&Argument> {
        self.opponents.get(index)
    }

    /// Memoised arguments for the current motion and style.
    pub fn recall(&self, stance: Stance) -> Option<&[Argument]> {
        self.memo.get(&self.key(stance)).map(Vec::as_slice)
    }

    /// Display `arguments` and memoise them for the current motion and style.
    pub(crate) fn remember(&mut self, stance: Stance, arguments: Vec<Argument>) {
        self.memo.insert(self.key(stance), arguments.clone());
        self.show(stance, arguments);
    }

    /// Display `arguments` without memoising them.
    pub(crate) fn show(&mut self, stance: Stance, arguments: Vec<Argument>) {
        match stance {
            Stance::InFavour => self.favour = arguments,
            Stance::Against => self.opponents = arguments,
        }
    }

    /// Number of memoised (topic, stance, style) entries.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    fn clear_displayed(&mut self) {
        self.favour.clear();
        self.opponents.clear();
    }

    fn key(&self, stance: Stance) -> MemoKey {
        MemoKey {
            topic: self.motion.clone(),
            stance,
            style: self.style,
        }
    }
}
