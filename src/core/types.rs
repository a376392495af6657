use serde::{Serialize, Deserialize};
use crate::core::error::{Error, Result};

/// Account identifiers are positive; 0 is reserved as the "exhausted" cursor value.
pub type AccountId = u32;

/// Interned dictionary id, 0 means absent.
pub type NameId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "f")]
    Female,
    #[serde(rename = "m")]
    Male,
}

impl Sex {
    pub fn code(self) -> u8 {
        match self {
            Sex::Female => b'f',
            Sex::Male => b'm',
        }
    }

    pub fn from_code(code: u8) -> Option<Sex> {
        match code {
            b'f' => Some(Sex::Female),
            b'm' => Some(Sex::Male),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> Result<Sex> {
        match value {
            "f" => Ok(Sex::Female),
            "m" => Ok(Sex::Male),
            _ => Err(Error::validation(format!("invalid sex {:?}", value))),
        }
    }

    pub fn opposite(self) -> Sex {
        match self {
            Sex::Female => Sex::Male,
            Sex::Male => Sex::Female,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Female => "f",
            Sex::Male => "m",
        }
    }
}

/// Codes follow the alphabetical order of the status names, so comparing
/// codes is the same as comparing names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "всё сложно")]
    Complicated = 1,
    #[serde(rename = "заняты")]
    Relationship = 2,
    #[serde(rename = "свободны")]
    Single = 3,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Complicated, Status::Relationship, Status::Single];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Status> {
        match code {
            1 => Some(Status::Complicated),
            2 => Some(Status::Relationship),
            3 => Some(Status::Single),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> Result<Status> {
        match value {
            "всё сложно" => Ok(Status::Complicated),
            "заняты" => Ok(Status::Relationship),
            "свободны" => Ok(Status::Single),
            _ => Err(Error::validation(format!("invalid status {:?}", value))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Complicated => "всё сложно",
            Status::Relationship => "заняты",
            Status::Single => "свободны",
        }
    }

    /// Weight used by recommend: free accounts rank highest.
    pub fn recommend_priority(self) -> u64 {
        match self {
            Status::Relationship => 1,
            Status::Complicated => 2,
            Status::Single => 3,
        }
    }
}

/// Premium window `[start, finish)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Premium {
    pub start: u32,
    pub finish: u32,
}

impl Premium {
    pub fn is_active(&self, now: u32) -> bool {
        self.start <= now && now < self.finish
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeRef {
    pub id: AccountId,
    pub ts: u32,
}

/// One like edge as handed over by the likes decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLike {
    pub liker: AccountId,
    pub likee: AccountId,
    pub ts: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LikesDocument {
    pub likes: Vec<RawLike>,
}

/// Account as decoded from the wire; every field is optional at this level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAccount {
    pub id: Option<AccountId>,
    pub email: Option<String>,
    pub fname: Option<String>,
    pub sname: Option<String>,
    pub phone: Option<String>,
    pub sex: Option<Sex>,
    pub birth: Option<i64>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub joined: Option<u32>,
    pub status: Option<Status>,
    pub interests: Option<Vec<String>>,
    pub premium: Option<Premium>,
    pub likes: Option<Vec<LikeRef>>,
}

/// Stored account. Optional string attributes are interned; 0 means absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub sex: Sex,
    pub status: Status,
    pub email: String,
    pub email_domain: usize,
    pub fname: NameId,
    pub sname: NameId,
    pub phone: Option<String>,
    pub phone_code: u16,
    pub country: NameId,
    pub city: NameId,
    pub birth: i64,
    pub birth_year: u16,
    pub joined: u32,
    pub joined_year: u16,
    pub premium: Option<Premium>,
    pub interests: Vec<NameId>,
}

impl Account {
    pub fn domain(&self) -> &str {
        &self.email[self.email_domain..]
    }

    pub fn is_premium_now(&self, now: u32) -> bool {
        self.premium.map_or(false, |p| p.is_active(now))
    }

    pub fn shared_interests(&self, other: &Account) -> usize {
        self.interests
            .iter()
            .filter(|interest| other.interests.contains(interest))
            .count()
    }
}
