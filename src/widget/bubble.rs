//! Chat bubbles: the rendered unit of the message list.

use std::fmt;

/// Classes shared by every bubble.
const BASE_CLASSES: &str = "mb-2 p-2 rounded";
/// Width cap shared by every bubble.
const WIDTH_CLASS: &str = "max-w-xs";

/// Identifier of a bubble within its container. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BubbleId(pub(crate) u64);

impl fmt::Display for BubbleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bubble-{}", self.0)
    }
}

/// Who a bubble speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// What a bubble currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleKind {
    /// Regular message text.
    Message,
    /// Temporary "working" indicator awaiting a reply.
    Placeholder,
    /// Fallback shown when a send failed.
    Error,
}

/// A single rendered chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub id: BubbleId,
    pub role: Role,
    pub kind: BubbleKind,
    pub text: String,
}

impl Bubble {
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == BubbleKind::Placeholder
    }

    /// Tailwind classes for this bubble.
    ///
    /// User bubbles are blue and pushed to the end of the flex column,
    /// everything else is grey. Error bubbles keep the grey background with
    /// red text.
    pub fn class_name(&self) -> String {
        let tone = match (self.role, self.kind) {
            (Role::User, _) => "bg-blue-100 self-end",
            (Role::Assistant, BubbleKind::Error) => "bg-gray-200 text-red-700",
            (Role::Assistant, _) => "bg-gray-200",
        };
        format!("{BASE_CLASSES} {tone} {WIDTH_CLASS}")
    }

    /// Render as a `<div>` node with escaped text.
    pub fn to_html(&self) -> String {
        format!(
            r#"<div id="{}" class="{}">{}</div>"#,
            self.id,
            self.class_name(),
            escape_html(&self.text)
        )
    }
}

/// Escape text for safe inclusion in HTML element content or attributes.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
