#![allow(dead_code)]

use Matchdex::core::types::{AccountId, Premium, RawAccount, Sex, Status};
use Matchdex::{Config, IndexMode, Store};

/// June 1990
pub const BIRTH_1990: i64 = 645_400_000;
/// 2015-03-01
pub const JOINED_2015: u32 = 1_425_168_000;

pub fn store() -> Store {
    Store::new(Config::default()).unwrap()
}

pub fn store_at(now: u32) -> Store {
    Store::new(Config { now, ..Config::default() }).unwrap()
}

pub fn raw(id: AccountId, sex: Sex, status: Status) -> RawAccount {
    RawAccount {
        id: Some(id),
        email: Some(format!("user{}@mail.ru", id)),
        sex: Some(sex),
        status: Some(status),
        birth: Some(BIRTH_1990),
        joined: Some(JOINED_2015),
        ..RawAccount::default()
    }
}

pub fn with_city(mut raw: RawAccount, country: &str, city: &str) -> RawAccount {
    raw.country = Some(country.to_string());
    raw.city = Some(city.to_string());
    raw
}

pub fn with_interests(mut raw: RawAccount, interests: &[&str]) -> RawAccount {
    raw.interests = Some(interests.iter().map(|s| s.to_string()).collect());
    raw
}

pub fn with_premium(mut raw: RawAccount, start: u32, finish: u32) -> RawAccount {
    raw.premium = Some(Premium { start, finish });
    raw
}

pub fn add(store: &Store, raw: RawAccount) -> AccountId {
    store.add(raw, true, IndexMode::Inline).unwrap()
}

pub fn ids<'a>(accounts: impl IntoIterator<Item = &'a Matchdex::core::types::Account>) -> Vec<AccountId> {
    accounts.into_iter().map(|a| a.id).collect()
}
