//! Inline text marks.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags::bitflags! {
    /// Format flags carried by a text node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextFormat: u8 {
        const BOLD = 1;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
        const SUPERSCRIPT = 1 << 4;
        const SUBSCRIPT = 1 << 5;
        const CODE = 1 << 6;
    }
}

impl Default for TextFormat {
    fn default() -> Self {
        TextFormat::empty()
    }
}

impl TextFormat {
    /// Superscript and subscript never coexist on one run
    pub fn is_consistent(self) -> bool {
        !self.contains(TextFormat::SUPERSCRIPT | TextFormat::SUBSCRIPT)
    }

    /// Marks that cannot be set together with `self`
    pub fn exclusions(self, code_excludes_marks: bool) -> TextFormat {
        let mut excluded = TextFormat::empty();
        if self.contains(TextFormat::SUPERSCRIPT) {
            excluded |= TextFormat::SUBSCRIPT;
        }
        if self.contains(TextFormat::SUBSCRIPT) {
            excluded |= TextFormat::SUPERSCRIPT;
        }
        if code_excludes_marks {
            if self.contains(TextFormat::CODE) {
                excluded |= TextFormat::all() - TextFormat::CODE;
            } else if !self.is_empty() {
                excluded |= TextFormat::CODE;
            }
        }
        excluded
    }

    /// Parse a format name as used by toolbar commands ("bold", "code", ...)
    pub fn from_mark_name(name: &str) -> Option<TextFormat> {
        MARK_NAMES
            .iter()
            .find(|(mark_name, _)| *mark_name == name)
            .map(|(_, mark)| *mark)
    }

    /// Name of a single mark, the inverse of [`TextFormat::from_mark_name`]
    pub fn mark_name(self) -> Option<&'static str> {
        MARK_NAMES
            .iter()
            .find(|(_, mark)| *mark == self)
            .map(|(name, _)| *name)
    }
}

const MARK_NAMES: [(&str, TextFormat); 7] = [
    ("bold", TextFormat::BOLD),
    ("italic", TextFormat::ITALIC),
    ("underline", TextFormat::UNDERLINE),
    ("strikethrough", TextFormat::STRIKETHROUGH),
    ("superscript", TextFormat::SUPERSCRIPT),
    ("subscript", TextFormat::SUBSCRIPT),
    ("code", TextFormat::CODE),
];

impl Serialize for TextFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TextFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        TextFormat::from_bits(bits).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid TextFormat bits: {bits:#x}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superscript_and_subscript_are_exclusive() {
        assert!(TextFormat::BOLD.union(TextFormat::SUPERSCRIPT).is_consistent());
        assert!(!(TextFormat::SUPERSCRIPT | TextFormat::SUBSCRIPT).is_consistent());
        assert_eq!(
            TextFormat::SUPERSCRIPT.exclusions(false),
            TextFormat::SUBSCRIPT
        );
    }

    #[test]
    fn test_code_exclusions_follow_policy() {
        assert_eq!(TextFormat::CODE.exclusions(false), TextFormat::empty());
        assert_eq!(
            TextFormat::CODE.exclusions(true),
            TextFormat::all() - TextFormat::CODE
        );
        assert_eq!(TextFormat::BOLD.exclusions(true), TextFormat::CODE);
    }

    #[test]
    fn test_mark_names_round_trip() {
        for name in ["bold", "italic", "underline", "strikethrough", "superscript", "subscript", "code"] {
            let format = TextFormat::from_mark_name(name).unwrap();
            assert_eq!(format.mark_name(), Some(name));
        }
        assert_eq!((TextFormat::BOLD | TextFormat::ITALIC).mark_name(), None);
        assert_eq!(TextFormat::from_mark_name("highlight"), None);
        // flag names stay with bitflags; toolbar names are lowercase
        assert_eq!(TextFormat::from_name("BOLD"), Some(TextFormat::BOLD));
        assert_eq!(TextFormat::from_mark_name("BOLD"), None);
    }

    #[test]
    fn test_format_serializes_as_bits() {
        let format = TextFormat::BOLD | TextFormat::ITALIC;
        let json = serde_json::to_string(&format).unwrap();
        assert_eq!(json, "3");
        let back: TextFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(back, format);
        assert!(serde_json::from_str::<TextFormat>("255").is_err());
    }
}
