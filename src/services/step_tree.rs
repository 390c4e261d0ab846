use std::collections::{HashMap, HashSet};

use crate::models::{ActionType, StepNode, StepRow};

/// Assemble flat step rows into a parent/child tree.
///
/// Steps are stored as an adjacency list; this loads nesting of any depth
/// from a single query's worth of rows. Roots and siblings are ordered by
/// `step_number` (id as tiebreaker, since step numbers are caller-supplied
/// and may collide). A step whose parent is missing from the row set
/// surfaces as a root rather than being dropped.
pub fn build_step_tree(
    rows: Vec<StepRow>,
    action_types: &HashMap<i32, ActionType>,
) -> Vec<StepNode> {
    let known: HashSet<i64> = rows.iter().map(|row| row.id).collect();

    let mut roots: Vec<StepRow> = Vec::new();
    let mut children: HashMap<i64, Vec<StepRow>> = HashMap::new();

    for row in rows {
        match row.parent_step_id {
            Some(parent) if known.contains(&parent) => {
                children.entry(parent).or_default().push(row);
            }
            _ => roots.push(row),
        }
    }

    roots.sort_by_key(|row| (row.step_number, row.id));
    for siblings in children.values_mut() {
        siblings.sort_by_key(|row| (row.step_number, row.id));
    }

    roots
        .into_iter()
        .map(|row| assemble(row, &mut children, action_types))
        .collect()
}

fn assemble(
    row: StepRow,
    children: &mut HashMap<i64, Vec<StepRow>>,
    action_types: &HashMap<i32, ActionType>,
) -> StepNode {
    let nested = children.remove(&row.id).unwrap_or_default();
    let steps = nested
        .into_iter()
        .map(|child| assemble(child, children, action_types))
        .collect();

    StepNode {
        id: row.id,
        training_uuid: row.training_uuid,
        step_number: row.step_number,
        parent_step_id: row.parent_step_id,
        area: row.area,
        meta: row.meta,
        annotation: row.annotation,
        image_url: row.image_url,
        action_type: row
            .action_type_id
            .and_then(|id| action_types.get(&id).cloned()),
        steps,
    }
}
