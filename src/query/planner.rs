use tracing::debug;
use crate::core::dict::{DictKind, Dictionary};
use crate::core::types::{Account, AccountId, NameId};
use crate::index::catalog::Catalog;
use crate::index::group_hash::{GroupHash, BIRTH, CITY, COUNTRY, INTEREST, JOINED, SEX, STATUS};
use crate::query::iterators::{BoxCursor, Intersect, Union};
use crate::query::types::{FilterQuery, GroupQuery, SortOrder};
use crate::writer::batch::{PREMIUM_ACTIVE, PREMIUM_INACTIVE, PREMIUM_NONE};

fn lookup_one(dict: &dyn Dictionary, kind: DictKind, value: &Option<String>) -> Option<Option<NameId>> {
    match value {
        None => Some(None),
        Some(value) => dict.lookup(kind, value).map(Some),
    }
}

/// Every value must be known, otherwise nothing can match.
fn lookup_all(dict: &dyn Dictionary, kind: DictKind, values: &Option<Vec<String>>) -> Option<Option<Vec<NameId>>> {
    match values {
        None => Some(None),
        Some(values) => values
            .iter()
            .map(|value| dict.lookup(kind, value))
            .collect::<Option<Vec<_>>>()
            .map(Some),
    }
}

/// Unknown values are dropped; nothing known means nothing can match.
fn lookup_any(dict: &dyn Dictionary, kind: DictKind, values: &Option<Vec<String>>) -> Option<Option<Vec<NameId>>> {
    match values {
        None => Some(None),
        Some(values) => {
            let ids: Vec<NameId> = values.iter().filter_map(|value| dict.lookup(kind, value)).collect();
            if ids.is_empty() { None } else { Some(Some(ids)) }
        }
    }
}

/// Filter predicates with names replaced by dictionary ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFilter {
    pub limit: usize,
    pub sex: Option<u8>,
    pub status_eq: Option<u8>,
    pub status_neq: Option<u8>,
    pub email_domain: Option<String>,
    pub email_lt: Option<String>,
    pub email_gt: Option<String>,
    pub fname_eq: Option<NameId>,
    pub fname_any: Option<Vec<NameId>>,
    pub fname_null: Option<bool>,
    pub sname_eq: Option<NameId>,
    pub sname_starts: Option<String>,
    pub sname_null: Option<bool>,
    pub phone_code: Option<u16>,
    pub phone_null: Option<bool>,
    pub country_eq: Option<NameId>,
    pub country_null: Option<bool>,
    pub city_eq: Option<NameId>,
    pub city_any: Option<Vec<NameId>>,
    pub city_null: Option<bool>,
    pub birth_lt: Option<i64>,
    pub birth_gt: Option<i64>,
    pub birth_year: Option<u16>,
    pub interests_contains: Option<Vec<NameId>>,
    pub interests_any: Option<Vec<NameId>>,
    pub likes_contains: Option<Vec<AccountId>>,
    pub premium_now: bool,
    pub premium_null: Option<bool>,
}

impl ResolvedFilter {
    /// `None` when some referenced name was never interned, i.e. the result is provably empty.
    pub fn resolve(query: &FilterQuery, dict: &dyn Dictionary) -> Option<Self> {
        Some(ResolvedFilter {
            limit: query.limit,
            sex: query.sex_eq.map(|s| s.code()),
            status_eq: query.status_eq.map(|s| s.code()),
            status_neq: query.status_neq.map(|s| s.code()),
            email_domain: query.email_domain.clone(),
            email_lt: query.email_lt.clone(),
            email_gt: query.email_gt.clone(),
            fname_eq: lookup_one(dict, DictKind::FirstName, &query.fname_eq)?,
            fname_any: lookup_any(dict, DictKind::FirstName, &query.fname_any)?,
            fname_null: query.fname_null,
            sname_eq: lookup_one(dict, DictKind::Surname, &query.sname_eq)?,
            sname_starts: query.sname_starts.clone(),
            sname_null: query.sname_null,
            phone_code: query.phone_code,
            phone_null: query.phone_null,
            country_eq: lookup_one(dict, DictKind::Country, &query.country_eq)?,
            country_null: query.country_null,
            city_eq: lookup_one(dict, DictKind::City, &query.city_eq)?,
            city_any: lookup_any(dict, DictKind::City, &query.city_any)?,
            city_null: query.city_null,
            birth_lt: query.birth_lt,
            birth_gt: query.birth_gt,
            birth_year: query.birth_year,
            interests_contains: lookup_all(dict, DictKind::Interest, &query.interests_contains)?,
            interests_any: lookup_any(dict, DictKind::Interest, &query.interests_any)?,
            likes_contains: query.likes_contains.clone(),
            premium_now: query.premium_now,
            premium_null: query.premium_null,
        })
    }

    /// Residual check of every predicate except `likes_contains`,
    /// which is always answered by the likee index.
    pub fn matches(&self, account: &Account, now: u32, dict: &dyn Dictionary) -> bool {
        fn null_ok(null: Option<bool>, present: bool) -> bool {
            null.map_or(true, |want_null| want_null != present)
        }

        if self.sex.map_or(false, |s| s != account.sex.code()) {
            return false;
        }
        if self.status_eq.map_or(false, |s| s != account.status.code()) {
            return false;
        }
        if self.status_neq.map_or(false, |s| s == account.status.code()) {
            return false;
        }
        if let Some(domain) = &self.email_domain {
            if account.domain() != domain {
                return false;
            }
        }
        if let Some(bound) = &self.email_lt {
            if account.email.as_str() >= bound.as_str() {
                return false;
            }
        }
        if let Some(bound) = &self.email_gt {
            if account.email.as_str() <= bound.as_str() {
                return false;
            }
        }
        if self.fname_eq.map_or(false, |f| f != account.fname) {
            return false;
        }
        if let Some(names) = &self.fname_any {
            if !names.contains(&account.fname) {
                return false;
            }
        }
        if !null_ok(self.fname_null, account.fname != 0) {
            return false;
        }
        if self.sname_eq.map_or(false, |s| s != account.sname) {
            return false;
        }
        if let Some(prefix) = &self.sname_starts {
            let starts = dict
                .resolve(DictKind::Surname, account.sname)
                .map_or(false, |sname| sname.starts_with(prefix.as_str()));
            if !starts {
                return false;
            }
        }
        if !null_ok(self.sname_null, account.sname != 0) {
            return false;
        }
        if self.phone_code.map_or(false, |code| code != account.phone_code) {
            return false;
        }
        if !null_ok(self.phone_null, account.phone.is_some()) {
            return false;
        }
        if self.country_eq.map_or(false, |c| c != account.country) {
            return false;
        }
        if !null_ok(self.country_null, account.country != 0) {
            return false;
        }
        if self.city_eq.map_or(false, |c| c != account.city) {
            return false;
        }
        if let Some(cities) = &self.city_any {
            if !cities.contains(&account.city) {
                return false;
            }
        }
        if !null_ok(self.city_null, account.city != 0) {
            return false;
        }
        if self.birth_lt.map_or(false, |ts| account.birth >= ts) {
            return false;
        }
        if self.birth_gt.map_or(false, |ts| account.birth <= ts) {
            return false;
        }
        if self.birth_year.map_or(false, |year| year != account.birth_year) {
            return false;
        }
        if let Some(interests) = &self.interests_contains {
            if !interests.iter().all(|i| account.interests.contains(i)) {
                return false;
            }
        }
        if let Some(interests) = &self.interests_any {
            if !interests.iter().any(|i| account.interests.contains(i)) {
                return false;
            }
        }
        if self.premium_now && !account.is_premium_now(now) {
            return false;
        }
        if !null_ok(self.premium_null, account.premium.is_some()) {
            return false;
        }
        true
    }
}

/// An index-backed candidate stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Likee(AccountId),
    City(NameId),
    CityAny(Vec<NameId>),
    Country(NameId),
    BirthYear(u16),
    JoinYear(u16),
    PhoneCode(u16),
    Interest(NameId),
    InterestAny(Vec<NameId>),
    FirstName(NameId),
    FirstNameAny(Vec<NameId>),
    Premium(u8),
    PremiumSet,
    StatusSex(u8, u8),
    Sex(u8),
    Status(u8),
}

impl Source {
    pub fn open(&self, catalog: &Catalog) -> BoxCursor {
        match self {
            Source::Likee(id) => catalog.likee.cursor(*id),
            Source::City(city) => catalog.city.cursor(*city),
            Source::CityAny(cities) => {
                Box::new(Union::new(cities.iter().map(|c| catalog.city.cursor(*c)).collect()))
            }
            Source::Country(country) => catalog.country.cursor(*country),
            Source::BirthYear(year) => catalog.birth_year.cursor(*year),
            Source::JoinYear(year) => catalog.join_year.cursor(*year),
            Source::PhoneCode(code) => catalog.phone_code.cursor(*code),
            Source::Interest(interest) => catalog.interest.cursor(*interest),
            Source::InterestAny(interests) => {
                Box::new(Union::new(interests.iter().map(|i| catalog.interest.cursor(*i)).collect()))
            }
            Source::FirstName(name) => catalog.first_name.cursor(*name),
            Source::FirstNameAny(names) => {
                Box::new(Union::new(names.iter().map(|n| catalog.first_name.cursor(*n)).collect()))
            }
            Source::Premium(state) => catalog.premium.cursor(*state),
            Source::PremiumSet => Box::new(Union::new(vec![
                catalog.premium.cursor(PREMIUM_INACTIVE),
                catalog.premium.cursor(PREMIUM_ACTIVE),
            ])),
            Source::StatusSex(status, sex) => catalog.status_sex.cursor((*status, *sex)),
            Source::Sex(sex) => catalog.sex.cursor(*sex),
            Source::Status(status) => catalog.status.cursor(*status),
        }
    }
}

/// Open every source and intersect them; no sources means all accounts.
pub fn open_sources(sources: &[Source], catalog: &Catalog) -> BoxCursor {
    match sources.len() {
        0 => catalog.ids.cursor(),
        1 => sources[0].open(catalog),
        _ => Box::new(Intersect::new(sources.iter().map(|s| s.open(catalog)).collect())),
    }
}

/// Candidate sources for a filter. Sex and status split the whole table
/// roughly in halves and thirds, so they only drive when nothing narrower is set.
pub fn plan_filter(filter: &ResolvedFilter) -> Vec<Source> {
    let mut sources = Vec::new();

    if let Some(likes) = &filter.likes_contains {
        sources.extend(likes.iter().map(|&id| Source::Likee(id)));
    }
    if let Some(city) = filter.city_eq {
        sources.push(Source::City(city));
    } else if let Some(cities) = &filter.city_any {
        sources.push(Source::CityAny(cities.clone()));
    } else if filter.city_null == Some(true) {
        sources.push(Source::City(0));
    }
    if let Some(country) = filter.country_eq {
        sources.push(Source::Country(country));
    } else if filter.country_null == Some(true) {
        sources.push(Source::Country(0));
    }
    if let Some(year) = filter.birth_year {
        sources.push(Source::BirthYear(year));
    }
    if let Some(code) = filter.phone_code {
        sources.push(Source::PhoneCode(code));
    } else if filter.phone_null == Some(true) {
        sources.push(Source::PhoneCode(0));
    }
    if let Some(interests) = &filter.interests_contains {
        sources.extend(interests.iter().map(|&i| Source::Interest(i)));
    }
    if let Some(interests) = &filter.interests_any {
        sources.push(Source::InterestAny(interests.clone()));
    }
    if let Some(name) = filter.fname_eq {
        sources.push(Source::FirstName(name));
    } else if let Some(names) = &filter.fname_any {
        sources.push(Source::FirstNameAny(names.clone()));
    } else if filter.fname_null == Some(true) {
        sources.push(Source::FirstName(0));
    }
    if filter.premium_now {
        sources.push(Source::Premium(PREMIUM_ACTIVE));
    } else if filter.premium_null == Some(true) {
        sources.push(Source::Premium(PREMIUM_NONE));
    } else if filter.premium_null == Some(false) {
        sources.push(Source::PremiumSet);
    }

    if sources.is_empty() {
        match (filter.status_eq, filter.sex) {
            (Some(status), Some(sex)) => sources.push(Source::StatusSex(status, sex)),
            (Some(status), None) => sources.push(Source::Status(status)),
            (None, Some(sex)) => sources.push(Source::Sex(sex)),
            (None, None) => {}
        }
    }

    debug!(?sources, "filter plan");
    sources
}

/// Group predicates resolved to ids plus the cube masks they select.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGroup {
    pub group_mask: u64,
    pub order: SortOrder,
    pub limit: usize,
    pub filter_mask: u64,
    pub filter_value: GroupHash,
    pub sex: Option<u8>,
    pub status: Option<u8>,
    pub country: Option<NameId>,
    pub city: Option<NameId>,
    pub birth: Option<u16>,
    pub joined: Option<u16>,
    pub interest: Option<NameId>,
    pub likes: Option<AccountId>,
}

impl ResolvedGroup {
    pub fn resolve(query: &GroupQuery, dict: &dyn Dictionary) -> Option<Self> {
        let mut group = ResolvedGroup {
            group_mask: query.group_mask(),
            order: query.order,
            limit: query.limit,
            filter_mask: 0,
            filter_value: GroupHash(0),
            sex: query.sex.map(|s| s.code()),
            status: query.status.map(|s| s.code()),
            country: lookup_one(dict, DictKind::Country, &query.country)?,
            city: lookup_one(dict, DictKind::City, &query.city)?,
            birth: query.birth,
            joined: query.joined,
            interest: lookup_one(dict, DictKind::Interest, &query.interests)?,
            likes: query.likes,
        };

        let value = &mut group.filter_value;
        if let Some(sex) = group.sex {
            group.filter_mask |= SEX;
            value.set_sex(sex);
        }
        if let Some(status) = group.status {
            group.filter_mask |= STATUS;
            value.set_status(status);
        }
        if let Some(country) = group.country {
            group.filter_mask |= COUNTRY;
            value.set_country(country);
        }
        if let Some(city) = group.city {
            group.filter_mask |= CITY;
            value.set_city(city);
        }
        if let Some(year) = group.birth {
            group.filter_mask |= BIRTH;
            value.set_birth(year);
        }
        if let Some(year) = group.joined {
            group.filter_mask |= JOINED;
            value.set_joined(year);
        }
        if let Some(interest) = group.interest {
            group.filter_mask |= INTEREST;
            value.set_interest(interest);
        }

        Some(group)
    }

    pub fn matches(&self, account: &Account) -> bool {
        self.sex.map_or(true, |s| s == account.sex.code())
            && self.status.map_or(true, |s| s == account.status.code())
            && self.country.map_or(true, |c| c == account.country)
            && self.city.map_or(true, |c| c == account.city)
            && self.birth.map_or(true, |y| y == account.birth_year)
            && self.joined.map_or(true, |y| y == account.joined_year)
            && self.interest.map_or(true, |i| account.interests.contains(&i))
    }

    /// Sources for the live scan; the liked-by predicate is always one of them.
    pub fn sources(&self) -> Vec<Source> {
        let mut sources = Vec::new();
        if let Some(id) = self.likes {
            sources.push(Source::Likee(id));
        }
        if let Some(city) = self.city {
            sources.push(Source::City(city));
        }
        if let Some(country) = self.country {
            sources.push(Source::Country(country));
        }
        if let Some(interest) = self.interest {
            sources.push(Source::Interest(interest));
        }
        if let Some(year) = self.birth {
            sources.push(Source::BirthYear(year));
        }
        if let Some(year) = self.joined {
            sources.push(Source::JoinYear(year));
        }
        if sources.is_empty() {
            match (self.status, self.sex) {
                (Some(status), Some(sex)) => sources.push(Source::StatusSex(status, sex)),
                (Some(status), None) => sources.push(Source::Status(status)),
                (None, Some(sex)) => sources.push(Source::Sex(sex)),
                (None, None) => {}
            }
        }
        sources
    }
}
