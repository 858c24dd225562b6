/// One `- [ ] title` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    /// 1 for top level; each two columns of indentation adds one
    pub depth: usize,
    pub title: String,
    pub completed: bool,
}

/// A checklist read from markdown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedChecklist {
    /// From the first `# ` heading, if any
    pub name: Option<String>,
    pub entries: Vec<ParsedEntry>,
    /// Non-blank lines that were not items, with 1-based line numbers
    pub skipped: Vec<(usize, String)>,
}

/// Parse a markdown checklist.
///
/// Item lines are `- [ ] title`, `- [x] title`, or a bare `- title`
/// (uncompleted); `*` works in place of `-`. Depth comes from leading
/// indentation (a tab counts as two columns). Depth is not validated here:
/// jumps of more than one level are clamped when the entries are applied.
pub fn parse_checklist(source: &str) -> ParsedChecklist {
    let mut parsed = ParsedChecklist::default();

    for (idx, line) in source.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(heading) = trimmed.strip_prefix("# ") {
            if parsed.name.is_none() {
                parsed.name = Some(heading.trim().to_string());
            } else {
                parsed.skipped.push((idx + 1, line.to_string()));
            }
            continue;
        }

        match parse_item_line(line) {
            Some(entry) => parsed.entries.push(entry),
            None => parsed.skipped.push((idx + 1, line.to_string())),
        }
    }

    parsed
}

fn parse_item_line(line: &str) -> Option<ParsedEntry> {
    let mut columns = 0;
    for c in line.chars() {
        match c {
            ' ' => columns += 1,
            '\t' => columns += 2,
            _ => break,
        }
    }
    let rest = line.trim_start();
    let rest = rest
        .strip_prefix("- ")
        .or_else(|| rest.strip_prefix("* "))?;

    let (completed, title) = if let Some(t) = rest.strip_prefix("[ ]") {
        (false, t)
    } else if let Some(t) = rest
        .strip_prefix("[x]")
        .or_else(|| rest.strip_prefix("[X]"))
    {
        (true, t)
    } else {
        (false, rest)
    };

    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    Some(ParsedEntry {
        depth: columns / 2 + 1,
        title: title.to_string(),
        completed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(depth: usize, title: &str, completed: bool) -> ParsedEntry {
        ParsedEntry {
            depth,
            title: title.to_string(),
            completed,
        }
    }

    #[test]
    fn test_parse_nested_checklist() {
        let source = "\
# Camping

- [ ] Tent
  - [x] Pegs
  - [ ] Poles
- [X] Stove
\t- Gas
";
        let parsed = parse_checklist(source);
        assert_eq!(parsed.name.as_deref(), Some("Camping"));
        assert_eq!(
            parsed.entries,
            vec![
                entry(1, "Tent", false),
                entry(2, "Pegs", true),
                entry(2, "Poles", false),
                entry(1, "Stove", true),
                entry(2, "Gas", false),
            ]
        );
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_non_item_lines_are_skipped() {
        let source = "\
Some intro text
- [ ] Real item
- [ ]
# Second heading
";
        let parsed = parse_checklist(source);
        assert_eq!(parsed.name.as_deref(), Some("Second heading"));
        assert_eq!(parsed.entries, vec![entry(1, "Real item", false)]);
        assert_eq!(
            parsed.skipped,
            vec![(1, "Some intro text".to_string()), (3, "- [ ]".to_string())]
        );
    }

    #[test]
    fn test_odd_indentation_rounds_down() {
        let parsed = parse_checklist("- a\n   - b\n      - c\n");
        let depths: Vec<usize> = parsed.entries.iter().map(|e| e.depth).collect();
        assert_eq!(depths, vec![1, 2, 4]);
    }

    #[test]
    fn test_star_bullets() {
        let parsed = parse_checklist("* [x] done\n* todo\n");
        assert_eq!(
            parsed.entries,
            vec![entry(1, "done", true), entry(1, "todo", false)]
        );
    }
}
