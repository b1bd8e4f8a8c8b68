use serde::Deserialize;
use unicode_width::UnicodeWidthStr;

use crate::ir::Node;

/// Fixed geometry of a table box. Width is shared by every node; height
/// follows from the column counts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeMetrics {
    pub width: f64,
    pub header_height: f64,
    pub row_height: f64,
    pub section_padding: f64,
    pub separator_height: f64,
    pub min_height: f64,
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self {
            width: 288.0,
            header_height: 48.0,
            row_height: 24.0,
            section_padding: 8.0,
            separator_height: 8.0,
            min_height: 80.0,
        }
    }
}

impl NodeMetrics {
    /// Height of a table with the given section sizes.
    pub fn height(&self, pk_count: usize, other_count: usize, show_detail: bool) -> f64 {
        if !show_detail {
            return self.min_height;
        }

        let rows = (pk_count + other_count) as f64;
        let mut height = self.header_height + self.section_padding * 2.0 + rows * self.row_height;
        if pk_count > 0 && other_count > 0 {
            height += self.separator_height;
        }

        height.max(self.min_height)
    }

    pub fn node_height(&self, node: &Node, show_detail: bool) -> f64 {
        self.height(
            node.primary_key_columns.len(),
            node.other_columns.len(),
            show_detail,
        )
    }

    /// Offset from the node's top edge to the centre of the named column's row.
    /// Primary-key rows come first, then the separator, then the other rows.
    pub fn row_offset(&self, node: &Node, column: &str) -> Option<f64> {
        let top = self.header_height + self.section_padding;
        let half_row = self.row_height / 2.0;

        if let Some(idx) = node.primary_key_columns.iter().position(|c| c.name == column) {
            return Some(top + idx as f64 * self.row_height + half_row);
        }

        let idx = node.other_columns.iter().position(|c| c.name == column)?;
        let pk_rows = node.primary_key_columns.len();
        let separator = if pk_rows > 0 {
            self.separator_height
        } else {
            0.0
        };
        Some(top + (pk_rows + idx) as f64 * self.row_height + separator + half_row)
    }
}

/// Monospace text estimate used to fit labels inside the fixed node width.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextMetrics {
    pub char_width: f64,
    pub padding_x: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            padding_x: 12.0,
        }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    /// Cut `text` so it fits in `max_width`, marking the cut with an ellipsis.
    pub fn truncate(&self, text: &str, max_width: f64) -> String {
        if self.text_width(text) <= max_width {
            return text.to_string();
        }

        let budget = max_width - self.char_width;
        let mut out = String::new();
        let mut used = 0.0;
        for ch in text.chars() {
            let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0) as f64 * self.char_width;
            if used + w > budget {
                break;
            }
            used += w;
            out.push(ch);
        }
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Column;

    fn node_with(pk: &[&str], other: &[&str]) -> Node {
        let col = |name: &&str, is_pk| Column {
            name: name.to_string(),
            data_type: "int".to_string(),
            is_primary_key: is_pk,
            is_foreign_key: false,
        };
        Node {
            id: "t".to_string(),
            name: "t".to_string(),
            primary_key_columns: pk.iter().map(|n| col(n, true)).collect(),
            other_columns: other.iter().map(|n| col(n, false)).collect(),
            x: 0.0,
            y: 0.0,
            width: 288.0,
            height: 80.0,
        }
    }

    #[test]
    fn test_hidden_detail_is_min_height() {
        let m = NodeMetrics::default();
        assert_eq!(m.height(3, 10, false), 80.0);
    }

    #[test]
    fn test_height_with_both_sections() {
        let m = NodeMetrics::default();
        // 48 + 16 + 5 * 24 + 8
        assert_eq!(m.height(2, 3, true), 192.0);
    }

    #[test]
    fn test_height_single_section_has_no_separator() {
        let m = NodeMetrics::default();
        assert_eq!(m.height(0, 3, true), 48.0 + 16.0 + 72.0);
        assert_eq!(m.height(3, 0, true), 48.0 + 16.0 + 72.0);
    }

    #[test]
    fn test_height_clamped_to_floor() {
        let m = NodeMetrics::default();
        assert_eq!(m.height(0, 0, true), 80.0);
        assert_eq!(m.height(1, 0, true), 88.0);
    }

    #[test]
    fn test_height_independent_of_position() {
        let m = NodeMetrics::default();
        let mut node = node_with(&["id"], &["a", "b"]);
        let before = m.node_height(&node, true);
        node.x = 1234.0;
        node.y = -50.0;
        assert_eq!(m.node_height(&node, true), before);
        assert!(m.node_height(&node, true) >= m.node_height(&node, false));
    }

    #[test]
    fn test_row_offsets_ordering() {
        let m = NodeMetrics::default();
        let node = node_with(&["id", "tenant_id"], &["a", "b", "c"]);
        let pk2 = m.row_offset(&node, "tenant_id").unwrap();
        let others: Vec<f64> = ["a", "b", "c"]
            .iter()
            .map(|c| m.row_offset(&node, c).unwrap())
            .collect();

        assert!(m.row_offset(&node, "id").unwrap() < pk2);
        assert!(others.iter().all(|&o| pk2 < o));
        assert!(others.windows(2).all(|w| w[0] < w[1]));
        // separator applied once
        assert_eq!(others[0] - pk2, m.row_height + m.separator_height);
    }

    #[test]
    fn test_row_offset_unknown_column() {
        let m = NodeMetrics::default();
        let node = node_with(&["id"], &["a"]);
        assert_eq!(m.row_offset(&node, "missing"), None);
        assert_eq!(m.row_offset(&node, ""), None);
    }

    #[test]
    fn test_ascii_width() {
        let m = TextMetrics::default();
        assert_eq!(m.text_width("User"), 4.0 * 8.0);
    }

    #[test]
    fn test_unicode_width() {
        let m = TextMetrics::default();
        // 全角文字は幅2
        assert_eq!(m.text_width("ユーザー"), 8.0 * 8.0);
    }

    #[test]
    fn test_truncate() {
        let m = TextMetrics::default();
        assert_eq!(m.truncate("users", 100.0), "users");
        let cut = m.truncate("a_very_long_column_name", 80.0);
        assert!(cut.ends_with('…'));
        assert!(m.text_width(&cut) <= 80.0 + m.char_width);
    }
}
