use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::InvoiceError;
use super::types::{LineItem, LineItemPatch};

/// Ordered collection of line items. Display order is billing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItems(Vec<LineItem>);

impl LineItems {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[LineItem] {
        &self.0
    }

    pub fn get(&self, id: Uuid) -> Option<&LineItem> {
        self.0.iter().find(|item| item.id == id)
    }

    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.0.iter().position(|item| item.id == id)
    }

    /// Append a blank row and return its id.
    pub fn add_blank(&mut self) -> Uuid {
        let item = LineItem::new();
        let id = item.id;
        self.0.push(item);
        id
    }

    /// Append a prepared row. Quantity is clamped to at least 1.
    pub fn push(&mut self, mut item: LineItem) -> Uuid {
        item.quantity = item.quantity.max(1);
        let id = item.id;
        self.0.push(item);
        id
    }

    /// Apply a field-level patch in place.
    pub fn update(&mut self, id: Uuid, patch: LineItemPatch) -> Result<&LineItem, InvoiceError> {
        let item = self.get_mut(id)?;
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity.max(1);
        }
        if let Some(unit_price) = patch.unit_price {
            item.unit_price = unit_price;
        }
        Ok(item)
    }

    /// Step the quantity up by one.
    pub fn increment(&mut self, id: Uuid) -> Result<u32, InvoiceError> {
        let item = self.get_mut(id)?;
        item.quantity = item.quantity.saturating_add(1).max(1);
        Ok(item.quantity)
    }

    /// Step the quantity down by one, never below 1.
    pub fn decrement(&mut self, id: Uuid) -> Result<u32, InvoiceError> {
        let item = self.get_mut(id)?;
        item.quantity = item.quantity.saturating_sub(1).max(1);
        Ok(item.quantity)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<LineItem, InvoiceError> {
        let index = self
            .position(id)
            .ok_or_else(|| InvoiceError::NotFound(format!("line item {id}")))?;
        Ok(self.0.remove(index))
    }

    /// Move the item with `id` to position `to` (clamped to the end).
    pub fn move_to(&mut self, id: Uuid, to: usize) -> Result<(), InvoiceError> {
        let from = self
            .position(id)
            .ok_or_else(|| InvoiceError::NotFound(format!("line item {id}")))?;
        let item = self.0.remove(from);
        let to = to.min(self.0.len());
        self.0.insert(to, item);
        Ok(())
    }

    fn get_mut(&mut self, id: Uuid) -> Result<&mut LineItem, InvoiceError> {
        self.0
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| InvoiceError::NotFound(format!("line item {id}")))
    }
}

impl From<Vec<LineItem>> for LineItems {
    fn from(items: Vec<LineItem>) -> Self {
        Self(items)
    }
}

impl From<LineItems> for Vec<LineItem> {
    fn from(items: LineItems) -> Self {
        items.0
    }
}

impl<'a> IntoIterator for &'a LineItems {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptions(items: &LineItems) -> Vec<&str> {
        items.iter().map(|i| i.description.as_str()).collect()
    }

    fn named(name: &str) -> LineItem {
        LineItem {
            description: name.into(),
            ..LineItem::new()
        }
    }

    #[test]
    fn add_and_update() {
        let mut items = LineItems::new();
        let id = items.add_blank();
        items
            .update(
                id,
                LineItemPatch {
                    description: Some("Design".into()),
                    unit_price: Some("80".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let item = items.get(id).unwrap();
        assert_eq!(item.description, "Design");
        assert_eq!(item.quantity, 1);
        assert_eq!(item.unit_price, "80");
    }

    #[test]
    fn quantity_never_drops_below_one() {
        let mut items = LineItems::new();
        let id = items.add_blank();
        assert_eq!(items.decrement(id).unwrap(), 1);
        assert_eq!(items.increment(id).unwrap(), 2);
        assert_eq!(items.decrement(id).unwrap(), 1);

        items
            .update(
                id,
                LineItemPatch {
                    quantity: Some(0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(items.get(id).unwrap().quantity, 1);
    }

    #[test]
    fn reorder() {
        let mut items = LineItems::new();
        let a = items.push(named("a"));
        items.push(named("b"));
        let c = items.push(named("c"));

        items.move_to(c, 0).unwrap();
        assert_eq!(descriptions(&items), ["c", "a", "b"]);

        items.move_to(a, 99).unwrap();
        assert_eq!(descriptions(&items), ["c", "b", "a"]);
    }

    #[test]
    fn remove_unknown_is_not_found() {
        let mut items = LineItems::new();
        items.add_blank();
        let err = items.remove(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, InvoiceError::NotFound(_)));
        assert_eq!(items.len(), 1);
    }
}
