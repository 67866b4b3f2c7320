/// Checked state for a list of app names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    items: Vec<String>,
    checked: Vec<bool>,
}

impl Selection {
    pub fn new(items: Vec<String>) -> Self {
        let checked = vec![false; items.len()];
        Self { items, checked }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn checked(&self) -> &[bool] {
        &self.checked
    }

    pub fn all_checked(&self) -> bool {
        !self.checked.is_empty() && self.checked.iter().all(|c| *c)
    }

    /// Clear everything when all items are checked, otherwise check all
    pub fn toggle_all(&mut self) {
        let value = !self.all_checked();
        self.checked.iter_mut().for_each(|c| *c = value);
    }

    /// Replace the checked set with the item indices in `indices`
    pub fn set_checked(&mut self, indices: &[usize]) {
        self.checked.iter_mut().for_each(|c| *c = false);
        for &index in indices {
            if let Some(c) = self.checked.get_mut(index) {
                *c = true;
            }
        }
    }

    pub fn selected(&self) -> Vec<String> {
        self.items
            .iter()
            .zip(&self.checked)
            .filter(|(_, checked)| **checked)
            .map(|(item, _)| item.clone())
            .collect()
    }
}
