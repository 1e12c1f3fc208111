use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::id::PersonId;

/// Name of the currency resource. Wealth is measured in it.
pub const COIN: &str = "Coin";

fn default_true() -> bool {
    true
}

/// Catalog definition of a resource kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDef {
    pub name: String,
    #[serde(default = "default_true")]
    pub inheritable: bool,
    /// Turns an instance survives. 0 never expires.
    #[serde(default)]
    pub lifespan: u32,
    /// Sub-resource -> units consumed to make one unit.
    #[serde(default)]
    pub required_resources: BTreeMap<String, u32>,
}

impl ResourceDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inheritable: true,
            lifespan: 0,
            required_resources: BTreeMap::new(),
        }
    }

    pub fn instance(&self) -> Resource {
        Resource {
            name: self.name.clone(),
            inheritable: self.inheritable,
            for_sale: false,
            matched_buyer: None,
            lifespan: self.lifespan,
            age: 0,
        }
    }
}

/// Per-instance state of a held resource. Instances with identical state are
/// stacked into a [`ResourceLot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    pub inheritable: bool,
    pub for_sale: bool,
    pub matched_buyer: Option<PersonId>,
    pub lifespan: u32,
    pub age: u32,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inheritable: true,
            for_sale: false,
            matched_buyer: None,
            lifespan: 0,
            age: 0,
        }
    }

    pub fn for_sale(mut self, for_sale: bool) -> Self {
        self.for_sale = for_sale;
        self
    }

    fn is_offered(&self) -> bool {
        self.for_sale && self.matched_buyer.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLot {
    pub resource: Resource,
    pub count: u32,
}

/// A person's holdings: lots of identical resource instances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    lots: Vec<ResourceLot>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lots(&self) -> &[ResourceLot] {
        &self.lots
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Units held of `name`, whatever their age or sale state.
    pub fn count(&self, name: &str) -> u32 {
        self.lots
            .iter()
            .filter(|l| l.resource.name == name)
            .map(|l| l.count)
            .sum()
    }

    /// Units of `name` on offer and not yet promised to a buyer.
    pub fn offered(&self, name: &str) -> u32 {
        self.lots
            .iter()
            .filter(|l| l.resource.name == name && l.resource.is_offered())
            .map(|l| l.count)
            .sum()
    }

    pub fn matched_to(&self, buyer: PersonId, name: &str) -> u32 {
        self.lots
            .iter()
            .filter(|l| l.resource.name == name && l.resource.matched_buyer == Some(buyer))
            .map(|l| l.count)
            .sum()
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.lots.iter().map(|l| l.resource.name.clone()).collect()
    }

    pub fn add(&mut self, resource: Resource, count: u32) {
        if count == 0 {
            return;
        }
        match self.lots.iter_mut().find(|l| l.resource == resource) {
            Some(lot) => lot.count += count,
            None => self.lots.push(ResourceLot { resource, count }),
        }
    }

    /// Remove `count` units of `name`, unpromised and oldest first.
    /// Returns `None` and leaves the inventory untouched if too few are held.
    pub fn take(&mut self, name: &str, count: u32) -> Option<Vec<ResourceLot>> {
        if self.count(name) < count {
            return None;
        }
        let mut order: Vec<usize> = (0..self.lots.len())
            .filter(|&i| self.lots[i].resource.name == name)
            .collect();
        order.sort_by_key(|&i| {
            let r = &self.lots[i].resource;
            (r.matched_buyer.is_some(), Reverse(r.age))
        });

        let mut remaining = count;
        let mut taken = Vec::new();
        for i in order {
            if remaining == 0 {
                break;
            }
            let lot = &mut self.lots[i];
            let n = lot.count.min(remaining);
            lot.count -= n;
            remaining -= n;
            taken.push(ResourceLot {
                resource: lot.resource.clone(),
                count: n,
            });
        }
        self.lots.retain(|l| l.count > 0);
        Some(taken)
    }

    /// Remove one unit of `name` that was promised to `buyer`.
    pub fn take_matched(&mut self, buyer: PersonId, name: &str) -> Option<Resource> {
        let idx = self
            .lots
            .iter()
            .position(|l| l.resource.name == name && l.resource.matched_buyer == Some(buyer))?;
        let lot = &mut self.lots[idx];
        lot.count -= 1;
        let unit = lot.resource.clone();
        if lot.count == 0 {
            self.lots.remove(idx);
        }
        Some(unit)
    }

    /// Promise up to `max` offered units of `name` to `buyer`. Returns how many
    /// were tagged.
    pub fn tag_for_buyer(&mut self, name: &str, buyer: PersonId, max: u32) -> u32 {
        let mut remaining = max;
        let mut split = Vec::new();
        for lot in self
            .lots
            .iter_mut()
            .filter(|l| l.resource.name == name && l.resource.is_offered())
        {
            if remaining == 0 {
                break;
            }
            let n = lot.count.min(remaining);
            remaining -= n;
            if n == lot.count {
                lot.resource.matched_buyer = Some(buyer);
            } else {
                lot.count -= n;
                let mut tagged = lot.resource.clone();
                tagged.matched_buyer = Some(buyer);
                split.push(ResourceLot {
                    resource: tagged,
                    count: n,
                });
            }
        }
        for lot in split {
            self.add(lot.resource, lot.count);
        }
        self.consolidate();
        max - remaining
    }

    /// Withdraw every promise made to `buyer`. Returns the units released.
    pub fn clear_matches(&mut self, buyer: PersonId) -> u32 {
        let mut released = 0;
        for lot in &mut self.lots {
            if lot.resource.matched_buyer == Some(buyer) {
                lot.resource.matched_buyer = None;
                released += lot.count;
            }
        }
        if released > 0 {
            self.consolidate();
        }
        released
    }

    pub fn set_for_sale(&mut self, name: &str, for_sale: bool) {
        for lot in self.lots.iter_mut().filter(|l| l.resource.name == name) {
            lot.resource.for_sale = for_sale;
            if !for_sale {
                lot.resource.matched_buyer = None;
            }
        }
        self.consolidate();
    }

    /// Age every mortal instance by one turn and drop those past their lifespan.
    /// Returns the number of units that expired.
    pub fn age_one_turn(&mut self) -> u32 {
        let mut expired = 0;
        for lot in &mut self.lots {
            if lot.resource.lifespan > 0 {
                lot.resource.age += 1;
                if lot.resource.age > lot.resource.lifespan {
                    expired += lot.count;
                    lot.count = 0;
                }
            }
        }
        self.lots.retain(|l| l.count > 0);
        expired
    }

    pub fn drain(&mut self) -> Vec<ResourceLot> {
        std::mem::take(&mut self.lots)
    }

    fn consolidate(&mut self) {
        let mut merged: Vec<ResourceLot> = Vec::with_capacity(self.lots.len());
        for lot in self.lots.drain(..) {
            if lot.count == 0 {
                continue;
            }
            match merged.iter_mut().find(|l| l.resource == lot.resource) {
                Some(existing) => existing.count += lot.count,
                None => merged.push(lot),
            }
        }
        self.lots = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sword(lifespan: u32) -> Resource {
        Resource {
            lifespan,
            ..Resource::new("Sword")
        }
    }

    #[test]
    fn identical_instances_stack() {
        let mut inv = Inventory::new();
        inv.add(Resource::new(COIN), 3);
        inv.add(Resource::new(COIN), 2);
        inv.add(Resource::new(COIN).for_sale(true), 1);
        assert_eq!(inv.lots().len(), 2);
        assert_eq!(inv.count(COIN), 6);
    }

    #[test]
    fn take_is_all_or_nothing() {
        let mut inv = Inventory::new();
        inv.add(Resource::new(COIN), 4);
        assert!(inv.take(COIN, 5).is_none());
        assert_eq!(inv.count(COIN), 4);
        let taken = inv.take(COIN, 4).unwrap();
        assert_eq!(taken.iter().map(|l| l.count).sum::<u32>(), 4);
        assert!(inv.is_empty());
    }

    #[test]
    fn take_prefers_oldest() {
        let mut inv = Inventory::new();
        inv.add(sword(5), 1);
        inv.age_one_turn();
        inv.add(sword(5), 1);
        let taken = inv.take("Sword", 1).unwrap();
        assert_eq!(taken[0].resource.age, 1);
        assert_eq!(inv.lots()[0].resource.age, 0);
    }

    #[test]
    fn tagging_splits_lots() {
        let mut inv = Inventory::new();
        inv.add(Resource::new("Labour").for_sale(true), 3);
        assert_eq!(inv.tag_for_buyer("Labour", 7, 2), 2);
        assert_eq!(inv.matched_to(7, "Labour"), 2);
        assert_eq!(inv.offered("Labour"), 1);
        assert_eq!(inv.tag_for_buyer("Labour", 8, 5), 1);
        assert_eq!(inv.offered("Labour"), 0);

        assert_eq!(inv.clear_matches(7), 2);
        assert_eq!(inv.offered("Labour"), 2);
        assert_eq!(inv.count("Labour"), 3);
    }

    #[test]
    fn take_matched_removes_one_unit() {
        let mut inv = Inventory::new();
        inv.add(Resource::new("Sword").for_sale(true), 2);
        inv.tag_for_buyer("Sword", 3, 1);
        let unit = inv.take_matched(3, "Sword").unwrap();
        assert_eq!(unit.matched_buyer, Some(3));
        assert!(inv.take_matched(3, "Sword").is_none());
        assert_eq!(inv.count("Sword"), 1);
    }

    #[test]
    fn mortal_resources_expire() {
        let mut inv = Inventory::new();
        inv.add(sword(2), 2);
        inv.add(Resource::new(COIN), 1);
        assert_eq!(inv.age_one_turn(), 0);
        assert_eq!(inv.age_one_turn(), 0);
        assert_eq!(inv.age_one_turn(), 2);
        assert_eq!(inv.count("Sword"), 0);
        assert_eq!(inv.count(COIN), 1);
    }
}
