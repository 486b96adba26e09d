use crate::candidate::Candidate;
use rand::Rng;
use std::fmt;

/// Placeholder shown while the scanner has nothing to offer yet
pub const EMPTY_PLACEHOLDER: &str =
    "No videos found, please wait a few seconds and try again.";

/// Uniform in-place Fisher-Yates shuffle, last index down to 1
///
/// The swap bound is inclusive so every permutation is equally likely.
/// Lengths 0 and 1 come back unchanged.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    if items.len() < 2 {
        return;
    }
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// What the presentation surface should currently display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Nothing to show yet
    Empty,
    /// One candidate, with 1-based pagination
    Entry {
        title: Option<String>,
        link: Option<String>,
        image_url: Option<String>,
        position: usize,
        total: usize,
    },
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Empty => write!(f, "{}", EMPTY_PLACEHOLDER),
            Frame::Entry {
                title,
                link,
                image_url,
                position,
                total,
            } => {
                let title = title.as_deref().unwrap_or("(untitled)");
                write!(f, "{} ({} of {})", title, position, total)?;
                if let Some(link) = link {
                    write!(f, "\n{}", link)?;
                }
                if let Some(image_url) = image_url {
                    write!(f, "\nimage: {}", image_url)?;
                }
                Ok(())
            }
        }
    }
}

/// Keys the presentation surface understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Confirm,
    Other,
}

/// A keystroke, with the IME composition flag
#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    pub key: Key,
    pub composing: bool,
}

/// The on-screen footer buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlButton {
    Previous,
    Next,
}

/// What a handled input asks the host to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Show this frame
    Rendered(Frame),
    /// Navigate the active browsing context to this link
    Navigate(String),
}

/// Presentation-side cursor over one shuffled batch of candidates
///
/// Populated from a single retrieval, shuffled once at creation; the
/// resulting order stands for the whole session.
pub struct NavigationSession {
    items: Vec<Candidate>,
    cursor: Option<usize>,
}

impl NavigationSession {
    /// Shuffles the items with the thread RNG and opens at the start
    pub fn new(items: Vec<Candidate>) -> Self {
        Self::with_rng(items, &mut rand::thread_rng())
    }

    /// Shuffles the items with the given RNG, for deterministic seeding
    pub fn with_rng<R: Rng + ?Sized>(mut items: Vec<Candidate>, rng: &mut R) -> Self {
        shuffle(&mut items, rng);
        Self::from_ordered(items)
    }

    /// Opens over the items exactly as given, skipping the shuffle
    ///
    /// Used for deterministic replay of a known order.
    pub fn from_ordered(items: Vec<Candidate>) -> Self {
        let cursor = if items.is_empty() { None } else { Some(0) };
        Self { items, cursor }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Moves the cursor to the given index and returns the frame to show
    ///
    /// An empty list always shows the placeholder and ignores the index;
    /// an out-of-bounds index is rejected and the cursor stays put.
    pub fn render_at(&mut self, index: usize) -> Frame {
        if self.items.is_empty() {
            return Frame::Empty;
        }
        if index >= self.items.len() {
            ::log::error!("Cannot render candidate at index {}", index);
            return self.current_frame();
        }
        self.cursor = Some(index);
        self.current_frame()
    }

    /// Advances the cursor; a no-op at the end of the list
    pub fn next(&mut self) -> Frame {
        match self.cursor {
            Some(cursor) if cursor + 1 < self.items.len() => self.render_at(cursor + 1),
            _ => self.current_frame(),
        }
    }

    /// Moves the cursor back; a no-op at the start of the list
    pub fn previous(&mut self) -> Frame {
        match self.cursor {
            Some(cursor) if cursor > 0 => self.render_at(cursor - 1),
            _ => self.current_frame(),
        }
    }

    /// Link of the currently rendered candidate
    pub fn activate(&self) -> Option<String> {
        let cursor = self.cursor?;
        self.items.get(cursor)?.link.clone()
    }

    /// The frame for the current cursor position
    pub fn current_frame(&self) -> Frame {
        let Some(cursor) = self.cursor else {
            return Frame::Empty;
        };
        match self.items.get(cursor) {
            Some(candidate) => Frame::Entry {
                title: candidate.title.clone(),
                link: candidate.link.clone(),
                image_url: candidate.image_url.clone(),
                position: cursor + 1,
                total: self.items.len(),
            },
            None => Frame::Empty,
        }
    }

    /// Routes a keystroke; composition-pending events are ignored
    pub fn handle_key(&mut self, event: KeyEvent) -> Option<SessionEvent> {
        if event.composing {
            return None;
        }
        match event.key {
            Key::Left => Some(SessionEvent::Rendered(self.previous())),
            Key::Right => Some(SessionEvent::Rendered(self.next())),
            Key::Confirm => self.activate().map(SessionEvent::Navigate),
            Key::Other => None,
        }
    }

    /// Routes a footer button press
    ///
    /// The shipped control layout wires these crosswise: the previous
    /// button advances and the next button goes back. The keys keep the
    /// conventional mapping.
    pub fn press(&mut self, button: ControlButton) -> Frame {
        match button {
            ControlButton::Previous => self.next(),
            ControlButton::Next => self.previous(),
        }
    }
}
