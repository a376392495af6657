use serde::Serialize;
use crate::core::types::{Account, NameId};

/// 64-bit packed aggregation key.
///
/// ```text
///  63      56 55      48 47      40 39      32 31              16 15       8 7        0
/// +----------+----------+----------+----------+------------------+----------+----------+
/// |  birth   |  joined  | interest | country  |       city       |  status  |   sex    |
/// +----------+----------+----------+----------+------------------+----------+----------+
/// ```
///
/// Years are stored as one-byte offsets from their epochs, wrapping outside
/// the representable range. Name ids must fit their field; the dictionary
/// refuses to hand out larger ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct GroupHash(pub u64);

pub const SEX_SHIFT: u32 = 0;
pub const STATUS_SHIFT: u32 = 8;
pub const CITY_SHIFT: u32 = 16;
pub const COUNTRY_SHIFT: u32 = 32;
pub const INTEREST_SHIFT: u32 = 40;
pub const JOINED_SHIFT: u32 = 48;
pub const BIRTH_SHIFT: u32 = 56;

pub const JOINED_EPOCH: u16 = 2010;
pub const BIRTH_EPOCH: u16 = 1949;

/// Field masks; a filter mask or group mask is an OR of these.
pub const SEX: u64 = 0xff << SEX_SHIFT;
pub const STATUS: u64 = 0xff << STATUS_SHIFT;
pub const CITY: u64 = 0xffff << CITY_SHIFT;
pub const COUNTRY: u64 = 0xff << COUNTRY_SHIFT;
pub const INTEREST: u64 = 0xff << INTEREST_SHIFT;
pub const JOINED: u64 = 0xff << JOINED_SHIFT;
pub const BIRTH: u64 = 0xff << BIRTH_SHIFT;

impl GroupHash {
    pub fn pack(
        sex: u8,
        status: u8,
        city: NameId,
        country: NameId,
        interest: NameId,
        joined_year: u16,
        birth_year: u16,
    ) -> Self {
        let mut hash = GroupHash(0);
        hash.set_sex(sex);
        hash.set_status(status);
        hash.set_city(city);
        hash.set_country(country);
        hash.set_interest(interest);
        hash.set_joined(joined_year);
        hash.set_birth(birth_year);
        hash
    }

    /// Hash of an account without the interest field; interests fan out separately.
    pub fn of_account(account: &Account) -> Self {
        GroupHash::pack(
            account.sex.code(),
            account.status.code(),
            account.city,
            account.country,
            0,
            account.joined_year,
            account.birth_year,
        )
    }

    #[inline]
    fn set(&mut self, mask: u64, shift: u32, value: u64) {
        self.0 = (self.0 & !mask) | ((value << shift) & mask);
    }

    pub fn sex(self) -> u8 {
        (self.0 >> SEX_SHIFT) as u8
    }

    pub fn set_sex(&mut self, sex: u8) {
        self.set(SEX, SEX_SHIFT, sex as u64);
    }

    pub fn status(self) -> u8 {
        (self.0 >> STATUS_SHIFT) as u8
    }

    pub fn set_status(&mut self, status: u8) {
        self.set(STATUS, STATUS_SHIFT, status as u64);
    }

    pub fn city(self) -> NameId {
        ((self.0 & CITY) >> CITY_SHIFT) as NameId
    }

    pub fn set_city(&mut self, city: NameId) {
        debug_assert!(city <= 0xffff, "city id {} overflows the hash", city);
        self.set(CITY, CITY_SHIFT, city as u64);
    }

    pub fn country(self) -> NameId {
        ((self.0 & COUNTRY) >> COUNTRY_SHIFT) as NameId
    }

    pub fn set_country(&mut self, country: NameId) {
        debug_assert!(country <= 0xff, "country id {} overflows the hash", country);
        self.set(COUNTRY, COUNTRY_SHIFT, country as u64);
    }

    pub fn interest(self) -> NameId {
        ((self.0 & INTEREST) >> INTEREST_SHIFT) as NameId
    }

    pub fn set_interest(&mut self, interest: NameId) {
        debug_assert!(interest <= 0xff, "interest id {} overflows the hash", interest);
        self.set(INTEREST, INTEREST_SHIFT, interest as u64);
    }

    pub fn joined(self) -> u16 {
        ((self.0 >> JOINED_SHIFT) as u8) as u16 + JOINED_EPOCH
    }

    pub fn set_joined(&mut self, year: u16) {
        let offset = year.wrapping_sub(JOINED_EPOCH) as u8;
        self.set(JOINED, JOINED_SHIFT, offset as u64);
    }

    pub fn birth(self) -> u16 {
        ((self.0 >> BIRTH_SHIFT) as u8) as u16 + BIRTH_EPOCH
    }

    pub fn set_birth(&mut self, year: u16) {
        let offset = year.wrapping_sub(BIRTH_EPOCH) as u8;
        self.set(BIRTH, BIRTH_SHIFT, offset as u64);
    }

    pub fn masked(self, mask: u64) -> GroupHash {
        GroupHash(self.0 & mask)
    }

    pub fn with_interest(mut self, interest: NameId) -> GroupHash {
        self.set_interest(interest);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn pack_round_trips() {
        let hash = GroupHash::pack(b'm', 3, 610, 71, 90, 2017, 1990);
        assert_eq!(hash.sex(), b'm');
        assert_eq!(hash.status(), 3);
        assert_eq!(hash.city(), 610);
        assert_eq!(hash.country(), 71);
        assert_eq!(hash.interest(), 90);
        assert_eq!(hash.joined(), 2017);
        assert_eq!(hash.birth(), 1990);
    }

    #[test]
    fn setters_do_not_leak() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let mut hash = GroupHash(rng.r#gen::<u64>());
            let before = hash;
            let city = rng.gen_range(0..=0xffff);
            hash.set_city(city);
            assert_eq!(hash.city(), city);
            assert_eq!(hash.masked(!CITY), before.masked(!CITY));

            let before = hash;
            hash.set_birth(rng.gen_range(BIRTH_EPOCH..BIRTH_EPOCH + 255));
            assert_eq!(hash.masked(!BIRTH), before.masked(!BIRTH));

            let before = hash;
            let interest = rng.gen_range(0..=0xff);
            hash.set_interest(interest);
            assert_eq!(hash.interest(), interest);
            assert_eq!(hash.masked(!INTEREST), before.masked(!INTEREST));
        }
    }

    #[test]
    fn masks_are_disjoint_and_cover_all_bits() {
        let masks = [SEX, STATUS, CITY, COUNTRY, INTEREST, JOINED, BIRTH];
        let mut union = 0u64;
        for mask in masks {
            assert_eq!(union & mask, 0);
            union |= mask;
        }
        assert_eq!(union, u64::MAX);
    }

    #[test]
    fn same_hash_sliced_two_ways() {
        let hash = GroupHash::pack(b'f', 2, 7, 3, 0, 2015, 1980);
        let filter = hash.masked(COUNTRY);
        let group = hash.masked(SEX | STATUS);
        assert_eq!(filter.country(), 3);
        assert_eq!(filter.sex(), 0);
        assert_eq!(group.sex(), b'f');
        assert_eq!(group.city(), 0);
    }

    #[test]
    fn field_widths_match_dictionary_caps() {
        use crate::core::dict::DictKind;
        let hash = GroupHash::pack(
            b'f',
            1,
            DictKind::City.capacity(),
            DictKind::Country.capacity(),
            DictKind::Interest.capacity(),
            2010,
            1949,
        );
        assert_eq!(hash.city(), DictKind::City.capacity());
        assert_eq!(hash.country(), DictKind::Country.capacity());
        assert_eq!(hash.interest(), DictKind::Interest.capacity());
    }

    #[test]
    #[should_panic(expected = "overflows the hash")]
    #[cfg(debug_assertions)]
    fn oversized_interest_id_is_caught() {
        GroupHash::default().set_interest(0x100);
    }
}
