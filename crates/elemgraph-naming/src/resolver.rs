//! Reference-driven instance naming.
//!
//! Instance names are composed from their id fields. An id field holding a
//! reference contributes the *resolved* name of the instance it references, and
//! `extendsParentId` prefixes the first parent's resolved name, so names are
//! computed dependencies-first over an explicit dependency graph.
//!
//! Instances keep their fetched name when:
//! - their type's naming does not depend on other instances,
//! - their fetched identifier is shared with another instance,
//! - they sit on a naming-dependency cycle,
//! - their computed identifier collides with another instance's.
//!
//! Held instances contribute their fetched name to dependents. Collisions are
//! re-checked until no new instance gets held.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use elemgraph_core::{
    get_by_path, ElemId, Element, InstanceElement, ReferenceExpression, Value, NAME_SEPARATOR,
};

use crate::config::NamingConfig;
use crate::error::NamingResult;
use crate::reference_index::ReferenceIndex;

/// Joins fragments contributed by id fields.
pub const ID_SEPARATOR: &str = "_";

/// Joins a parent's name to its child's own fragment.
pub const PARENT_SEPARATOR: &str = "__";

/// Outcome of a naming run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamingReport {
    /// Applied renames, `(old, new)`.
    pub renamed: Vec<(ElemId, ElemId)>,
    /// Instances whose rename was suppressed because of a collision.
    pub suppressed: Vec<ElemId>,
    /// Fetched identifiers shared by more than one instance.
    pub duplicates: Vec<ElemId>,
    /// Instances on a naming-dependency cycle.
    pub cyclic: Vec<ElemId>,
    /// Reference targets absent from the batch.
    pub missing_targets: Vec<ElemId>,
    /// Number of references rewritten to a new identifier.
    pub rewritten_references: usize,
}

/// Why an instance keeps its fetched name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hold {
    NotNameable,
    Duplicate,
    Cycle,
    Collision,
}

/// Evaluation order over instance slots.
#[derive(Debug, Default, PartialEq, Eq)]
struct NamingOrder {
    /// Slots not on a cycle, every slot after all of its dependencies.
    order: Vec<usize>,
    /// Slots on a cycle (including self-dependencies).
    cyclic: Vec<usize>,
}

/// Split slots into a dependencies-first order and the slots on cycles.
///
/// `deps[i]` lists the slots whose names slot `i` needs.
fn naming_order(deps: &[Vec<usize>]) -> NamingOrder {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(deps.len(), deps.len());
    let nodes: Vec<NodeIndex> = (0..deps.len()).map(|slot| graph.add_node(slot)).collect();
    for (from, targets) in deps.iter().enumerate() {
        for &to in targets {
            graph.update_edge(nodes[from], nodes[to], ());
        }
    }

    // Tarjan emits components in postorder, so dependencies come first.
    let mut result = NamingOrder::default();
    for component in tarjan_scc(&graph) {
        let on_cycle =
            component.len() > 1 || graph.contains_edge(component[0], component[0]);
        let mut members: Vec<usize> = component.iter().map(|n| graph[*n]).collect();
        members.sort_unstable();
        if on_cycle {
            result.cyclic.extend(members);
        } else {
            result.order.extend(members);
        }
    }
    result.cyclic.sort_unstable();
    result
}

/// A rename decided during planning.
#[derive(Debug)]
struct Rename {
    position: usize,
    from: ElemId,
    to: ElemId,
}

/// Everything needed to mutate the elements, detached from their borrow.
#[derive(Debug)]
struct RenamePlan {
    renames: Vec<Rename>,
    index: ReferenceIndex,
    positions_by_id: HashMap<ElemId, Vec<usize>>,
    report: NamingReport,
}

/// Computes and applies reference-driven names.
#[derive(Debug, Clone, Copy)]
pub struct NameResolver<'c> {
    config: &'c NamingConfig,
}

impl<'c> NameResolver<'c> {
    pub fn new(config: &'c NamingConfig) -> Self {
        Self { config }
    }

    /// Rename instances in place and rewrite every reference to them.
    ///
    /// Elements are never added or removed. Fails only on invalid configuration.
    pub fn resolve(&self, elements: &mut [Element]) -> NamingResult<NamingReport> {
        let _span = info_span!("resolve_names", elements = elements.len()).entered();
        self.config.validate()?;

        let plan = self.plan(elements);
        let report = apply_plan(elements, plan);

        info!(
            renamed = report.renamed.len(),
            suppressed = report.suppressed.len(),
            cyclic = report.cyclic.len(),
            duplicates = report.duplicates.len(),
            references = report.rewritten_references,
            "Resolved instance names"
        );
        Ok(report)
    }

    fn plan(&self, elements: &[Element]) -> RenamePlan {
        let instances: Vec<(usize, &InstanceElement)> = elements
            .iter()
            .enumerate()
            .filter_map(|(pos, e)| e.as_instance().map(|i| (pos, i)))
            .collect();
        let other_ids: HashSet<&ElemId> = elements
            .iter()
            .filter(|e| !e.is_instance())
            .map(Element::elem_id)
            .collect();

        let mut slots_by_id: HashMap<ElemId, Vec<usize>> = HashMap::new();
        for (slot, (_, instance)) in instances.iter().enumerate() {
            slots_by_id
                .entry(instance.elem_id.clone())
                .or_default()
                .push(slot);
        }

        let mut hold: Vec<Option<Hold>> = instances
            .iter()
            .map(|(_, instance)| {
                if slots_by_id[&instance.elem_id].len() > 1 {
                    Some(Hold::Duplicate)
                } else if !self.config.is_nameable(instance.type_name()) {
                    Some(Hold::NotNameable)
                } else {
                    None
                }
            })
            .collect();

        let deps: Vec<Vec<usize>> = instances
            .iter()
            .enumerate()
            .map(|(slot, (_, instance))| {
                if hold[slot].is_some() {
                    return Vec::new();
                }
                self.dependency_targets(instance)
                    .iter()
                    .filter_map(|target| match slots_by_id.get(target).map(Vec::as_slice) {
                        Some([only]) if hold[*only].is_none() => Some(*only),
                        _ => None,
                    })
                    .collect()
            })
            .collect();

        let NamingOrder { order, cyclic } = naming_order(&deps);
        for &slot in &cyclic {
            hold[slot] = Some(Hold::Cycle);
        }

        let resolution = Resolution {
            config: self.config,
            instances: &instances,
            slots_by_id: &slots_by_id,
            other_ids: &other_ids,
        };

        let mut fragments: Vec<String> = instances
            .iter()
            .map(|(_, i)| i.elem_id.name().to_string())
            .collect();
        let mut missing: BTreeSet<ElemId> = BTreeSet::new();
        let mut final_ids: Vec<ElemId>;

        loop {
            for &slot in &order {
                fragments[slot] = match hold[slot] {
                    Some(_) => instances[slot].1.elem_id.name().to_string(),
                    None => resolution
                        .compute_fragment(slot, &fragments, &mut missing)
                        .unwrap_or_else(|| instances[slot].1.elem_id.name().to_string()),
                };
            }

            final_ids = instances
                .iter()
                .enumerate()
                .map(|(slot, (_, instance))| match hold[slot] {
                    Some(_) => instance.elem_id.clone(),
                    None => ElemId::instance(
                        instance.elem_id.adapter(),
                        instance.elem_id.type_name(),
                        fragments[slot].clone(),
                    ),
                })
                .collect();

            let mut by_final: HashMap<&ElemId, Vec<usize>> = HashMap::new();
            for (slot, id) in final_ids.iter().enumerate() {
                by_final.entry(id).or_default().push(slot);
            }

            let mut newly_held = false;
            for (id, slots) in by_final.iter().filter(|(_, slots)| slots.len() > 1) {
                for &slot in slots {
                    if hold[slot].is_none() {
                        debug!(
                            instance = %instances[slot].1.elem_id,
                            computed = %id,
                            "Suppressing colliding rename"
                        );
                        hold[slot] = Some(Hold::Collision);
                        newly_held = true;
                    }
                }
            }
            if !newly_held {
                break;
            }
        }

        for target in &missing {
            warn!(target = %target, "Reference target is not part of the batch, using placeholder");
        }

        let mut report = NamingReport {
            missing_targets: missing.into_iter().collect(),
            ..NamingReport::default()
        };
        let mut renames = Vec::new();
        for (slot, (position, instance)) in instances.iter().enumerate() {
            match hold[slot] {
                Some(Hold::Collision) => report.suppressed.push(instance.elem_id.clone()),
                Some(Hold::Cycle) => report.cyclic.push(instance.elem_id.clone()),
                Some(Hold::Duplicate) | Some(Hold::NotNameable) => {}
                None if final_ids[slot] != instance.elem_id => renames.push(Rename {
                    position: *position,
                    from: instance.elem_id.clone(),
                    to: final_ids[slot].clone(),
                }),
                None => {}
            }
        }
        report.duplicates = slots_by_id
            .iter()
            .filter(|(_, slots)| slots.len() > 1)
            .map(|(id, _)| id.clone())
            .collect();
        report.duplicates.sort();

        let nameable_targets: HashSet<ElemId> = instances
            .iter()
            .filter(|(_, i)| self.config.is_nameable(i.type_name()))
            .map(|(_, i)| i.elem_id.clone())
            .collect();
        let index = ReferenceIndex::build(instances.iter().map(|(_, i)| *i), &nameable_targets);

        let positions_by_id = slots_by_id
            .into_iter()
            .map(|(id, slots)| (id, slots.into_iter().map(|s| instances[s].0).collect()))
            .collect();

        RenamePlan {
            renames,
            index,
            positions_by_id,
            report,
        }
    }

    /// Top-level ids of the instances whose names this instance's name needs.
    ///
    /// Any id field holding a reference counts, plain or `&`.
    fn dependency_targets(&self, instance: &InstanceElement) -> Vec<ElemId> {
        let config = self.config.config_for(instance.type_name());
        let mut targets: Vec<ElemId> = config
            .id_fields
            .iter()
            .filter_map(|f| get_by_path(&instance.value, f.field_path()))
            .filter_map(Value::as_reference)
            .map(ReferenceExpression::top_level_target)
            .collect();
        if config.extends_parent_id {
            if let Some(parent) = instance.parents().first() {
                targets.push(parent.top_level_target());
            }
        }
        targets
    }
}

/// Read-only context for computing fragments.
struct Resolution<'a> {
    config: &'a NamingConfig,
    instances: &'a [(usize, &'a InstanceElement)],
    slots_by_id: &'a HashMap<ElemId, Vec<usize>>,
    other_ids: &'a HashSet<&'a ElemId>,
}

impl Resolution<'_> {
    /// Name fragment for `slot`, or `None` when nothing usable was contributed.
    fn compute_fragment(
        &self,
        slot: usize,
        fragments: &[String],
        missing: &mut BTreeSet<ElemId>,
    ) -> Option<String> {
        let instance = self.instances[slot].1;
        let config = self.config.config_for(instance.type_name());

        let parts: Vec<String> = config
            .id_fields
            .iter()
            .map(|field| match get_by_path(&instance.value, field.field_path()) {
                None => String::new(),
                Some(Value::Reference(r)) => self.target_fragment(r, fragments, missing),
                Some(value) => value.to_name_fragment(),
            })
            .collect();
        let mut name = parts.join(ID_SEPARATOR);

        if config.extends_parent_id {
            if let Some(parent) = instance.parents().first() {
                let parent_name = self.target_fragment(parent, fragments, missing);
                name = format!("{}{}{}", parent_name, PARENT_SEPARATOR, name);
            }
        }

        if name.chars().all(|c| c == '_') {
            return None;
        }
        Some(name.replace(NAME_SEPARATOR, ID_SEPARATOR))
    }

    /// Name contributed by a referenced instance.
    fn target_fragment(
        &self,
        reference: &ReferenceExpression,
        fragments: &[String],
        missing: &mut BTreeSet<ElemId>,
    ) -> String {
        let target = reference.top_level_target();
        match self.slots_by_id.get(&target) {
            Some(slots) => fragments[slots[0]].clone(),
            None => {
                if !self.other_ids.contains(&target) {
                    missing.insert(target);
                }
                reference.elem_id.name().to_string()
            }
        }
    }
}

/// Rewrite references to renamed instances, then rename the instances.
fn apply_plan(elements: &mut [Element], plan: RenamePlan) -> NamingReport {
    let RenamePlan {
        renames,
        index,
        positions_by_id,
        mut report,
    } = plan;

    for rename in &renames {
        for site in index.referrers(&rename.from) {
            let Some(positions) = positions_by_id.get(&site.source) else {
                continue;
            };
            for &position in positions {
                let Some(source) = elements[position].as_instance_mut() else {
                    continue;
                };
                if let Some(Value::Reference(reference)) = source.value_at_mut(&site.path) {
                    if reference.elem_id != site.target {
                        continue;
                    }
                    if let Some(rebased) = reference.elem_id.rebase(&rename.from, &rename.to) {
                        reference.elem_id = rebased;
                        report.rewritten_references += 1;
                    }
                }
            }
        }
    }

    for rename in renames {
        if let Some(instance) = elements[rename.position].as_instance_mut() {
            debug!(from = %rename.from, to = %rename.to, "Renaming instance");
            instance.elem_id = rename.to.clone();
        }
        report.renamed.push((rename.from, rename.to));
    }

    report
}

/// Resolve names for `elements` under `config`.
pub fn resolve_names(
    elements: &mut [Element],
    config: &NamingConfig,
) -> NamingResult<NamingReport> {
    NameResolver::new(config).resolve(elements)
}
