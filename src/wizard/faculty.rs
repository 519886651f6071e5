//! Faculty preference slots over a shared pool.

use crate::model::{FACULTY_SLOTS, FacultyMember};

use super::WizardError;

/// Up to four ranked faculty picks. No member appears in two slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacultyPicks {
    slots: [Option<u64>; FACULTY_SLOTS],
}

impl FacultyPicks {
    pub fn get(&self, slot: usize) -> Option<u64> {
        self.slots.get(slot).copied().flatten()
    }

    /// Members offered in `slot`: everyone not picked in another slot.
    pub fn options<'a>(&self, slot: usize, pool: &'a [FacultyMember]) -> Vec<&'a FacultyMember> {
        pool.iter()
            .filter(|m| !self.picked_elsewhere(slot, m.id))
            .collect()
    }

    pub fn pick(&mut self, slot: usize, id: u64, pool: &[FacultyMember]) -> Result<(), WizardError> {
        if slot >= FACULTY_SLOTS {
            return Err(WizardError::NoSuchSlot(slot));
        }
        if !pool.iter().any(|m| m.id == id) {
            return Err(WizardError::UnknownFaculty(id));
        }
        if self.picked_elsewhere(slot, id) {
            return Err(WizardError::AlreadyPicked(id));
        }
        self.slots[slot] = Some(id);
        Ok(())
    }

    pub fn clear(&mut self, slot: usize) -> Result<(), WizardError> {
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(WizardError::NoSuchSlot(slot))?;
        *entry = None;
        Ok(())
    }

    /// Picked ids in slot order, skipping empty slots.
    pub fn ids(&self) -> Vec<u64> {
        self.slots.iter().flatten().copied().collect()
    }

    fn picked_elsewhere(&self, slot: usize, id: u64) -> bool {
        self.slots
            .iter()
            .enumerate()
            .any(|(i, s)| i != slot && *s == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<FacultyMember> {
        [(1, "Ada"), (2, "Alan"), (3, "Grace")]
            .into_iter()
            .map(|(id, name)| FacultyMember {
                id,
                first_name: name.into(),
                last_name: "Faculty".into(),
                email: String::new(),
                room_number: None,
            })
            .collect()
    }

    fn ids(members: &[&FacultyMember]) -> Vec<u64> {
        members.iter().map(|m| m.id).collect()
    }

    #[test]
    fn pick_is_hidden_from_other_slots_only() {
        let pool = pool();
        let mut picks = FacultyPicks::default();
        picks.pick(0, 2, &pool).unwrap();

        assert_eq!(ids(&picks.options(0, &pool)), vec![1, 2, 3]);
        assert_eq!(ids(&picks.options(1, &pool)), vec![1, 3]);
    }

    #[test]
    fn duplicate_pick_is_rejected() {
        let pool = pool();
        let mut picks = FacultyPicks::default();
        picks.pick(0, 2, &pool).unwrap();
        assert!(matches!(
            picks.pick(3, 2, &pool),
            Err(WizardError::AlreadyPicked(2))
        ));
        // Re-picking in the same slot is fine.
        picks.pick(0, 2, &pool).unwrap();
    }

    #[test]
    fn ids_skip_empty_slots() {
        let pool = pool();
        let mut picks = FacultyPicks::default();
        picks.pick(2, 3, &pool).unwrap();
        picks.pick(0, 1, &pool).unwrap();
        picks.clear(0).unwrap();
        assert_eq!(picks.ids(), vec![3]);
        assert!(matches!(picks.clear(4), Err(WizardError::NoSuchSlot(4))));
    }
}
