use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};
use crate::core::types::{AccountId, Sex, Status};
use crate::index::group_hash::{CITY, COUNTRY, INTEREST, SEX, STATUS};

/// Sort order for group results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,   // smallest count first
    Desc,  // exact reverse of Asc
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKey {
    Sex,
    Status,
    Interests,
    Country,
    City,
}

impl GroupKey {
    pub fn parse(value: &str) -> Result<GroupKey> {
        match value {
            "sex" => Ok(GroupKey::Sex),
            "status" => Ok(GroupKey::Status),
            "interests" => Ok(GroupKey::Interests),
            "country" => Ok(GroupKey::Country),
            "city" => Ok(GroupKey::City),
            _ => Err(Error::validation(format!("unknown group key {:?}", value))),
        }
    }

    pub fn mask(self) -> u64 {
        match self {
            GroupKey::Sex => SEX,
            GroupKey::Status => STATUS,
            GroupKey::Interests => INTEREST,
            GroupKey::Country => COUNTRY,
            GroupKey::City => CITY,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(str::to_string).collect()
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::validation(format!("{}: invalid number {:?}", name, value)))
}

/// `1` asks for an absent field, `0` for a present one.
fn parse_null(name: &str, value: &str) -> Result<bool> {
    match value {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(Error::validation(format!("{}: expected 0 or 1, got {:?}", name, value))),
    }
}

fn parse_limit(value: &str) -> Result<usize> {
    match value.parse::<usize>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(Error::validation(format!("invalid limit {:?}", value))),
    }
}

fn check_value(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(format!("{}: empty value", name)));
    }
    Ok(())
}

/// Predicates of a filter request; `None` means the predicate is not set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterQuery {
    pub limit: usize,
    pub sex_eq: Option<Sex>,
    pub email_domain: Option<String>,
    pub email_lt: Option<String>,
    pub email_gt: Option<String>,
    pub status_eq: Option<Status>,
    pub status_neq: Option<Status>,
    pub fname_eq: Option<String>,
    pub fname_any: Option<Vec<String>>,
    pub fname_null: Option<bool>,
    pub sname_eq: Option<String>,
    pub sname_starts: Option<String>,
    pub sname_null: Option<bool>,
    pub phone_code: Option<u16>,
    pub phone_null: Option<bool>,
    pub country_eq: Option<String>,
    pub country_null: Option<bool>,
    pub city_eq: Option<String>,
    pub city_any: Option<Vec<String>>,
    pub city_null: Option<bool>,
    pub birth_lt: Option<i64>,
    pub birth_gt: Option<i64>,
    pub birth_year: Option<u16>,
    pub interests_contains: Option<Vec<String>>,
    pub interests_any: Option<Vec<String>>,
    pub likes_contains: Option<Vec<AccountId>>,
    pub premium_now: bool,
    pub premium_null: Option<bool>,
}

impl FilterQuery {
    pub fn new(limit: usize) -> Self {
        FilterQuery {
            limit,
            ..FilterQuery::default()
        }
    }

    pub fn from_params<'a, I>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut query = FilterQuery::default();
        for (name, value) in params {
            check_value(name, value)?;
            match name {
                "sex_eq" => query.sex_eq = Some(Sex::parse(value)?),
                "email_domain" => query.email_domain = Some(value.to_string()),
                "email_lt" => query.email_lt = Some(value.to_string()),
                "email_gt" => query.email_gt = Some(value.to_string()),
                "status_eq" => query.status_eq = Some(Status::parse(value)?),
                "status_neq" => query.status_neq = Some(Status::parse(value)?),
                "fname_eq" => query.fname_eq = Some(value.to_string()),
                "fname_any" => query.fname_any = Some(split_list(value)),
                "fname_null" => query.fname_null = Some(parse_null(name, value)?),
                "sname_eq" => query.sname_eq = Some(value.to_string()),
                "sname_starts" => query.sname_starts = Some(value.to_string()),
                "sname_null" => query.sname_null = Some(parse_null(name, value)?),
                "phone_code" => query.phone_code = Some(parse_number(name, value)?),
                "phone_null" => query.phone_null = Some(parse_null(name, value)?),
                "country_eq" => query.country_eq = Some(value.to_string()),
                "country_null" => query.country_null = Some(parse_null(name, value)?),
                "city_eq" => query.city_eq = Some(value.to_string()),
                "city_any" => query.city_any = Some(split_list(value)),
                "city_null" => query.city_null = Some(parse_null(name, value)?),
                "birth_lt" => query.birth_lt = Some(parse_number(name, value)?),
                "birth_gt" => query.birth_gt = Some(parse_number(name, value)?),
                "birth_year" => query.birth_year = Some(parse_number(name, value)?),
                "interests_contains" => query.interests_contains = Some(split_list(value)),
                "interests_any" => query.interests_any = Some(split_list(value)),
                "likes_contains" => {
                    let ids = value
                        .split(',')
                        .map(|id| parse_number(name, id))
                        .collect::<Result<Vec<AccountId>>>()?;
                    query.likes_contains = Some(ids);
                }
                "premium_now" => query.premium_now = true,
                "premium_null" => query.premium_null = Some(parse_null(name, value)?),
                "limit" => query.limit = parse_limit(value)?,
                "query_id" => {}
                _ => return Err(Error::validation(format!("unknown filter param {:?}", name))),
            }
        }

        if query.limit == 0 {
            return Err(Error::validation("limit should be specified"));
        }
        Ok(query)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupQuery {
    pub keys: Vec<GroupKey>,
    pub order: SortOrder,
    pub limit: usize,
    pub sex: Option<Sex>,
    pub status: Option<Status>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub birth: Option<u16>,
    pub joined: Option<u16>,
    pub interests: Option<String>,
    pub likes: Option<AccountId>,
}

impl GroupQuery {
    pub fn new(keys: Vec<GroupKey>, order: SortOrder, limit: usize) -> Self {
        GroupQuery {
            keys,
            order,
            limit,
            sex: None,
            status: None,
            country: None,
            city: None,
            birth: None,
            joined: None,
            interests: None,
            likes: None,
        }
    }

    pub fn from_params<'a, I>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut keys = Vec::new();
        let mut order = None;
        let mut limit = 0;
        let mut query = GroupQuery::new(Vec::new(), SortOrder::Asc, 0);

        for (name, value) in params {
            check_value(name, value)?;
            match name {
                "keys" => {
                    for key in value.split(',') {
                        keys.push(GroupKey::parse(key)?);
                    }
                }
                "order" => {
                    order = Some(match value {
                        "1" => SortOrder::Asc,
                        "-1" => SortOrder::Desc,
                        _ => return Err(Error::validation(format!("invalid order {:?}", value))),
                    });
                }
                "limit" => limit = parse_limit(value)?,
                "sex" => query.sex = Some(Sex::parse(value)?),
                "status" => query.status = Some(Status::parse(value)?),
                "country" => query.country = Some(value.to_string()),
                "city" => query.city = Some(value.to_string()),
                "birth" => query.birth = Some(parse_number(name, value)?),
                "joined" => query.joined = Some(parse_number(name, value)?),
                "interests" => query.interests = Some(value.to_string()),
                "likes" => query.likes = Some(parse_number(name, value)?),
                "query_id" => {}
                _ => return Err(Error::validation(format!("unknown group param {:?}", name))),
            }
        }

        if keys.is_empty() {
            return Err(Error::validation("keys should be specified"));
        }
        if limit == 0 {
            return Err(Error::validation("limit should be specified"));
        }
        query.order = order.ok_or_else(|| Error::validation("order should be specified"))?;
        query.keys = keys;
        query.limit = limit;
        Ok(query)
    }

    pub fn group_mask(&self) -> u64 {
        self.keys.iter().fold(0, |mask, key| mask | key.mask())
    }
}

/// Optional location narrowing shared by recommend and suggest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairQuery {
    pub limit: usize,
    pub country: Option<String>,
    pub city: Option<String>,
}

pub type RecommendQuery = PairQuery;
pub type SuggestQuery = PairQuery;

impl PairQuery {
    pub fn new(limit: usize) -> Self {
        PairQuery {
            limit,
            ..PairQuery::default()
        }
    }

    pub fn from_params<'a, I>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut query = PairQuery::default();
        for (name, value) in params {
            check_value(name, value)?;
            match name {
                "country" => query.country = Some(value.to_string()),
                "city" => query.city = Some(value.to_string()),
                "limit" => query.limit = parse_limit(value)?,
                "query_id" => {}
                _ => return Err(Error::validation(format!("unknown param {:?}", name))),
            }
        }
        if query.limit == 0 {
            return Err(Error::validation("limit should be specified"));
        }
        Ok(query)
    }
}
