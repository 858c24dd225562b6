use crate::model::Checklist;
use crate::ops::flatten::flatten;

/// Serialize a checklist as markdown: a `# name` heading followed by one
/// `- [ ]`/`- [x]` line per item in preorder, two spaces per level.
pub fn serialize_list(list: &Checklist) -> String {
    let mut lines = vec![format!("# {}", list.name)];
    if !list.is_empty() {
        lines.push(String::new());
    }
    for entry in flatten(list) {
        let Some(item) = list.get(entry.id) else {
            continue;
        };
        let mark = if item.completed { 'x' } else { ' ' };
        lines.push(format!(
            "{}- [{}] {}",
            "  ".repeat(entry.depth - 1),
            mark,
            item.title
        ));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListId, NodeId};
    use crate::ops::completion::set_completion;
    use crate::parse::checklist_parser::parse_checklist;
    use insta::assert_snapshot;

    #[test]
    fn test_serialize_nested() {
        let mut list = Checklist::new(ListId(1), "Camping".into());
        let tent = list.insert_item("Tent".into(), NodeId::Root, usize::MAX).unwrap();
        let pegs = list.insert_item("Pegs".into(), NodeId::Item(tent), usize::MAX).unwrap();
        list.insert_item("Poles".into(), NodeId::Item(tent), usize::MAX).unwrap();
        let stove = list.insert_item("Stove".into(), NodeId::Root, usize::MAX).unwrap();
        list.insert_item("Gas".into(), NodeId::Item(stove), usize::MAX).unwrap();
        set_completion(&mut list, pegs, true).unwrap();
        set_completion(&mut list, stove, true).unwrap();

        assert_snapshot!(serialize_list(&list), @r"
        # Camping

        - [ ] Tent
          - [x] Pegs
          - [ ] Poles
        - [x] Stove
          - [x] Gas
        ");
    }

    #[test]
    fn test_empty_list_is_heading_only() {
        let list = Checklist::new(ListId(1), "Empty".into());
        assert_eq!(serialize_list(&list), "# Empty\n");
    }

    #[test]
    fn test_output_parses_back() {
        let mut list = Checklist::new(ListId(1), "Trip".into());
        let a = list.insert_item("A".into(), NodeId::Root, usize::MAX).unwrap();
        list.insert_item("A1".into(), NodeId::Item(a), usize::MAX).unwrap();

        let parsed = parse_checklist(&serialize_list(&list));
        assert_eq!(parsed.name.as_deref(), Some("Trip"));
        let shape: Vec<(usize, &str)> = parsed
            .entries
            .iter()
            .map(|e| (e.depth, e.title.as_str()))
            .collect();
        assert_eq!(shape, vec![(1, "A"), (2, "A1")]);
    }
}
