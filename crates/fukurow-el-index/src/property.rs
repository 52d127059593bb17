//! Object property hierarchy and chain saturation

use crate::indexed::{PropertyId, PropertyNode};
use std::collections::{HashMap, VecDeque};

/// A binary chain `left ∘ right ⊑ super_property`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BinaryChain {
    pub left: PropertyId,
    pub right: PropertyId,
    pub super_property: PropertyId,
}

pub(crate) struct PropertySaturation {
    pub compositions: HashMap<(PropertyId, PropertyId), Vec<PropertyId>>,
    pub reflexive_properties: Vec<PropertyId>,
}

/// Fill in [`crate::SaturatedProperty`] of every node and compute the
/// composition table
pub(crate) fn saturate_properties(
    properties: &mut [PropertyNode],
    chains: &[BinaryChain],
) -> PropertySaturation {
    let count = properties.len();

    // super-property closure by breadth-first search over told edges
    let mut supers: Vec<Vec<PropertyId>> = Vec::with_capacity(count);
    for start in 0..count {
        let mut seen = vec![false; count];
        let mut queue = VecDeque::from([start]);
        let mut closure = Vec::new();
        seen[start] = true;
        while let Some(next) = queue.pop_front() {
            closure.push(PropertyId(next as u32));
            for told in &properties[next].told_super_properties {
                if !seen[told.index()] {
                    seen[told.index()] = true;
                    queue.push_back(told.index());
                }
            }
        }
        supers.push(closure);
    }

    let mut subs: Vec<Vec<PropertyId>> = vec![Vec::new(); count];
    for (sub, closure) in supers.iter().enumerate() {
        for sup in closure {
            subs[sup.index()].push(PropertyId(sub as u32));
        }
    }

    let mut reflexive: Vec<bool> = properties.iter().map(|p| p.told_reflexive).collect();
    let mut changed = true;
    while changed {
        changed = false;
        for p in 0..count {
            if reflexive[p] {
                continue;
            }
            if subs[p].iter().any(|sub| reflexive[sub.index()]) {
                reflexive[p] = true;
                changed = true;
            }
        }
        for chain in chains {
            if !reflexive[chain.super_property.index()]
                && reflexive[chain.left.index()]
                && reflexive[chain.right.index()]
            {
                reflexive[chain.super_property.index()] = true;
                changed = true;
            }
        }
    }

    let mut compositions: HashMap<(PropertyId, PropertyId), Vec<PropertyId>> = HashMap::new();
    let mut needs_forward_links = vec![false; count];
    for chain in chains {
        for left in &subs[chain.left.index()] {
            for right in &subs[chain.right.index()] {
                let composed = compositions.entry((*left, *right)).or_default();
                if !composed.contains(&chain.super_property) {
                    composed.push(chain.super_property);
                }
                needs_forward_links[right.index()] = true;
            }
        }
    }

    for (p, node) in properties.iter_mut().enumerate() {
        node.saturated.sub_properties = std::mem::take(&mut subs[p]);
        node.saturated.super_properties = std::mem::take(&mut supers[p]);
        node.saturated.reflexive = reflexive[p];
        node.saturated.needs_forward_links = needs_forward_links[p];
    }

    let reflexive_properties = (0..count)
        .filter(|p| reflexive[*p])
        .map(|p| PropertyId(p as u32))
        .collect();

    PropertySaturation {
        compositions,
        reflexive_properties,
    }
}
