use serde::Serialize;

use crate::model::{Checklist, ItemId, NodeId};
use crate::ops::flatten::flatten;
use crate::ops::sections::Sections;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ListSummaryJson {
    pub id: u64,
    pub name: String,
    pub template: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub items: usize,
    pub completed: usize,
}

#[derive(Serialize)]
pub struct ItemJson {
    pub id: u64,
    pub title: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ItemJson>,
}

#[derive(Serialize)]
pub struct ListJson {
    pub id: u64,
    pub name: String,
    pub template: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub items: Vec<ItemJson>,
}

#[derive(Serialize)]
pub struct SectionsJson {
    pub list: String,
    pub open: Vec<ItemJson>,
    pub completed: Vec<ItemJson>,
}

/// Result of a single write command
#[derive(Serialize)]
pub struct ChangeJson {
    pub list: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<u64>,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub fn list_summary_json(list: &Checklist) -> ListSummaryJson {
    ListSummaryJson {
        id: list.id.0,
        name: list.name.clone(),
        template: list.template,
        date: list.date.map(|d| d.to_string()),
        items: list.len(),
        completed: list.items().filter(|i| i.completed).count(),
    }
}

pub fn item_json(list: &Checklist, id: ItemId) -> Option<ItemJson> {
    let item = list.get(id)?;
    Some(ItemJson {
        id: id.0,
        title: item.title.clone(),
        completed: item.completed,
        children: list
            .children(NodeId::Item(id))
            .iter()
            .filter_map(|&c| item_json(list, c))
            .collect(),
    })
}

pub fn list_json(list: &Checklist) -> ListJson {
    ListJson {
        id: list.id.0,
        name: list.name.clone(),
        template: list.template,
        date: list.date.map(|d| d.to_string()),
        items: list
            .children(NodeId::Root)
            .iter()
            .filter_map(|&id| item_json(list, id))
            .collect(),
    }
}

pub fn sections_json(list: &Checklist, sections: &Sections) -> SectionsJson {
    let convert = |ids: &[ItemId]| ids.iter().filter_map(|&id| item_json(list, id)).collect();
    SectionsJson {
        list: list.name.clone(),
        open: convert(&sections.open),
        completed: convert(&sections.completed),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// One line per list: id, name, progress, and markers
pub fn format_list_summary(list: &Checklist) -> String {
    let done = list.items().filter(|i| i.completed).count();
    let mut line = format!("{:>3}  {}  ({}/{})", list.id.0, list.name, done, list.len());
    if list.template {
        line.push_str("  [template]");
    }
    if let Some(date) = list.date {
        line.push_str(&format!("  {}", date));
    }
    line
}

/// The full projection, one row per item: `row  [x] title  #id`
pub fn format_tree(list: &Checklist) -> Vec<String> {
    flatten(list)
        .iter()
        .enumerate()
        .filter_map(|(row, entry)| {
            let item = list.get(entry.id)?;
            Some(format!(
                "{:>3}  {}{} {}  #{}",
                row,
                "  ".repeat(entry.depth - 1),
                checkbox(item.completed),
                item.title,
                item.id
            ))
        })
        .collect()
}

/// A top-level item and its subtree, without row numbers
pub fn format_subtree(list: &Checklist, id: ItemId, depth: usize, out: &mut Vec<String>) {
    let mut stack = vec![(id, depth)];
    while let Some((next, d)) = stack.pop() {
        let Some(item) = list.get(next) else {
            continue;
        };
        out.push(format!(
            "  {}{} {}  #{}",
            "  ".repeat(d),
            checkbox(item.completed),
            item.title,
            item.id
        ));
        stack.extend(
            list.children(NodeId::Item(next))
                .iter()
                .rev()
                .map(|&child| (child, d + 1)),
        );
    }
}

fn checkbox(completed: bool) -> &'static str {
    if completed { "[x]" } else { "[ ]" }
}
