use serde::Serialize;
use crate::core::types::{AccountId, NameId};
use crate::index::attribute::AttributeIndex;
use crate::index::posting::Postings;

/// Location and status of one account inside a tier, as seen by the mutation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TierSlot {
    pub interest: NameId,
    pub city: NameId,
    pub country: NameId,
    pub status: u8,
    pub sex: u8,
}

/// Interest-keyed candidate pool for recommendations, with city and country
/// narrowing. The premium pool also splits by (status, sex).
pub struct TierIndex {
    by_interest: AttributeIndex<NameId>,
    by_city: AttributeIndex<(NameId, NameId)>,
    by_country: AttributeIndex<(NameId, NameId)>,
    by_status_sex: Option<AttributeIndex<(NameId, u8, u8)>>,
}

impl TierIndex {
    pub fn new() -> Self {
        TierIndex {
            by_interest: AttributeIndex::new("tier_interest"),
            by_city: AttributeIndex::new("tier_interest_city"),
            by_country: AttributeIndex::new("tier_interest_country"),
            by_status_sex: None,
        }
    }

    pub fn with_status_sex() -> Self {
        TierIndex {
            by_status_sex: Some(AttributeIndex::new("tier_interest_status_sex")),
            ..TierIndex::new()
        }
    }

    pub fn add(&self, slot: TierSlot, id: AccountId) {
        self.by_interest.add(slot.interest, id);
        if slot.city != 0 {
            self.by_city.add((slot.interest, slot.city), id);
        }
        if slot.country != 0 {
            self.by_country.add((slot.interest, slot.country), id);
        }
        if let Some(index) = &self.by_status_sex {
            index.add((slot.interest, slot.status, slot.sex), id);
        }
    }

    pub fn append(&self, slot: TierSlot, id: AccountId) {
        self.by_interest.append(slot.interest, id);
        if slot.city != 0 {
            self.by_city.append((slot.interest, slot.city), id);
        }
        if slot.country != 0 {
            self.by_country.append((slot.interest, slot.country), id);
        }
        if let Some(index) = &self.by_status_sex {
            index.append((slot.interest, slot.status, slot.sex), id);
        }
    }

    pub fn remove(&self, slot: TierSlot, id: AccountId) {
        self.by_interest.remove(slot.interest, id);
        if slot.city != 0 {
            self.by_city.remove((slot.interest, slot.city), id);
        }
        if slot.country != 0 {
            self.by_country.remove((slot.interest, slot.country), id);
        }
        if let Some(index) = &self.by_status_sex {
            index.remove((slot.interest, slot.status, slot.sex), id);
        }
    }

    pub fn find(&self, interest: NameId) -> Postings {
        self.by_interest.find(interest)
    }

    pub fn find_by_city(&self, interest: NameId, city: NameId) -> Postings {
        self.by_city.find((interest, city))
    }

    pub fn find_by_country(&self, interest: NameId, country: NameId) -> Postings {
        self.by_country.find((interest, country))
    }

    /// Only populated on the premium tier; other tiers return an empty list.
    pub fn find_by_status_sex(&self, interest: NameId, status: u8, sex: u8) -> Postings {
        match &self.by_status_sex {
            Some(index) => index.find((interest, status, sex)),
            None => Postings::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_interest.posting_count()
    }

    pub fn update_all(&self) {
        self.by_interest.update_all();
        self.by_city.update_all();
        self.by_country.update_all();
        if let Some(index) = &self.by_status_sex {
            index.update_all();
        }
    }
}

impl Default for TierIndex {
    fn default() -> Self {
        TierIndex::new()
    }
}
