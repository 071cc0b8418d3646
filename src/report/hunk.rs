/// Role of one line in a unified-diff fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkLineKind {
    Addition,
    Deletion,
    Header,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkLine<'a> {
    pub kind: HunkLineKind,
    pub text: &'a str,
}

/// Split a diff hunk into classified lines, dropping empty ones.
/// Styling is left to the caller.
pub fn render_hunk(text: &str) -> Vec<HunkLine<'_>> {
    text.split('\n')
        .filter(|line| !line.is_empty())
        .map(|line| {
            let kind = match line.as_bytes()[0] {
                b'+' => HunkLineKind::Addition,
                b'-' => HunkLineKind::Deletion,
                b'@' => HunkLineKind::Header,
                _ => HunkLineKind::Context,
            };
            HunkLine { kind, text: line }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_lines() {
        let hunk = "@@ -38,6 +38,8 @@ fn main() {\n     let a = 1;\n-    let b = 2;\n+    let b = 3;\n\n";
        let lines = render_hunk(hunk);
        let kinds: Vec<HunkLineKind> = lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                HunkLineKind::Header,
                HunkLineKind::Context,
                HunkLineKind::Deletion,
                HunkLineKind::Addition,
            ]
        );
        assert_eq!(lines[2].text, "-    let b = 2;");
    }

    #[test]
    fn test_empty_hunk() {
        assert!(render_hunk("").is_empty());
        assert!(render_hunk("\n\n").is_empty());
    }
}
