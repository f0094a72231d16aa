//! Span edits over the original source buffer.
//!
//! Every replacement keeps the newline count of the span it replaces, so line
//! numbers of untouched code never move. Without a tracked source the editor
//! is inert and the pass only produces structural output.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Zero-width insert attached to the text ending at `start`.
    After,
    /// Zero-width insert attached to the text starting at `start`.
    Before,
    /// Replacement of `[start, end)`.
    Replace,
}

impl Placement {
    fn rank(self) -> u8 {
        match self {
            Placement::After => 0,
            Placement::Before => 1,
            Placement::Replace => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanEdit {
    pub start: u32,
    pub end: u32,
    pub text: String,
    pub placement: Placement,
}

#[derive(Debug, Default)]
pub struct TextEditor<'s> {
    source: Option<&'s str>,
    edits: Vec<SpanEdit>,
}

impl<'s> TextEditor<'s> {
    pub fn new(source: Option<&'s str>) -> Self {
        TextEditor {
            source,
            edits: Vec::new(),
        }
    }

    pub fn source(&self) -> Option<&'s str> {
        self.source
    }

    /// Replace `[start, end)` with `text`, or insert `text` at `start` when the
    /// span is empty. Empty-span inserts go before the text at `start` unless
    /// `trailing` is set, in which case they stay with the text ending there.
    pub fn overwrite(&mut self, start: u32, end: u32, text: &str, trailing: bool) {
        let Some(source) = self.source else {
            return;
        };
        assert!(
            start <= end && end as usize <= source.len(),
            "text edit [{}, {}) outside a {}-byte source",
            start,
            end,
            source.len()
        );

        if start == end {
            tracing::trace!(start, trailing, text, "insert");
            self.edits.push(SpanEdit {
                start,
                end,
                text: text.to_string(),
                placement: if trailing {
                    Placement::After
                } else {
                    Placement::Before
                },
            });
            return;
        }

        let original_lines = count_newlines(&source[start as usize..end as usize]);
        let mut text = text.to_string();
        let lines = count_newlines(&text);
        if lines < original_lines {
            text.push_str(&"\n".repeat(original_lines - lines));
        }
        tracing::trace!(start, end, text = text.as_str(), "overwrite");
        self.edits.push(SpanEdit {
            start,
            end,
            text,
            placement: Placement::Replace,
        });
    }

    pub fn insert(&mut self, at: u32, text: &str, trailing: bool) {
        self.overwrite(at, at, text, trailing);
    }

    /// Edits in application order: by position, then after-inserts,
    /// before-inserts and replacements, then in the order they were made.
    pub fn edits(&self) -> Vec<SpanEdit> {
        let mut sorted = self.edits.clone();
        sorted.sort_by_key(|edit| (edit.start, edit.placement.rank()));
        sorted
    }

    pub fn render(&self) -> Option<String> {
        let source = self.source?;
        let mut out = String::with_capacity(source.len());
        let mut cursor = 0usize;

        for edit in self.edits() {
            let start = edit.start as usize;
            assert!(
                start >= cursor,
                "text edit at {} overlaps a replacement ending at {}",
                start,
                cursor
            );
            out.push_str(&source[cursor..start]);
            cursor = start;
            out.push_str(&edit.text);
            if edit.placement == Placement::Replace {
                cursor = edit.end as usize;
            }
        }
        out.push_str(&source[cursor..]);
        Some(out)
    }
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_keeps_line_count() {
        let source = "a;\nimport {\n  x\n} from 'x';\nb;";
        let start = source.find("import").unwrap() as u32;
        let end = (source.find("'x';").unwrap() + 4) as u32;
        let mut editor = TextEditor::new(Some(source));
        editor.overwrite(start, end, "", false);
        let out = editor.render().unwrap();
        assert_eq!(out, "a;\n\n\n\nb;");
        assert_eq!(count_newlines(&out), count_newlines(source));
    }

    #[test]
    fn test_insert_ordering_at_shared_offset() {
        let source = "if (x) y;";
        let mut editor = TextEditor::new(Some(source));
        // Wrap `y;` and hoist code in front of it.
        editor.insert(7, "{", false);
        editor.insert(9, "}", true);
        editor.overwrite(7, 9, "", false);
        editor.insert(7, "h();", false);
        assert_eq!(editor.render().unwrap(), "if (x) {h();}");
    }

    #[test]
    fn test_trailing_insert_follows_replacement() {
        let source = "export default 1";
        let mut editor = TextEditor::new(Some(source));
        editor.overwrite(0, 15, "f(", false);
        editor.insert(16, ");", true);
        assert_eq!(editor.render().unwrap(), "f(1);");
    }

    #[test]
    fn test_structural_only_mode_is_inert() {
        let mut editor = TextEditor::new(None);
        editor.overwrite(0, 10, "x", false);
        assert!(editor.edits().is_empty());
        assert!(editor.render().is_none());
    }

    #[test]
    #[should_panic]
    fn test_overlapping_edits_are_a_bug() {
        let mut editor = TextEditor::new(Some("abcdef"));
        editor.overwrite(0, 4, "", false);
        editor.overwrite(2, 5, "", false);
        editor.render();
    }
}
