use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{debug, info};
use crate::core::config::Config;
use crate::core::dict::{DictKind, Dictionary, Dicts};
use crate::core::error::{Error, Result};
use crate::core::types::{Account, AccountId, LikeRef, NameId, RawAccount, RawLike};
use crate::core::utils::{email_domain_offset, phone_code_of, year_of};
use crate::index::catalog::{Catalog, Index, IndexStats};
use crate::writer::batch::{IndexBatch, IndexMode};

/// Records plus the email uniqueness map, guarded by one lock.
#[derive(Debug, Default)]
pub struct AccountTable {
    pub accounts: HashMap<AccountId, Account>,
    pub emails: HashMap<String, AccountId>,
}

pub struct Store {
    config: Config,
    now: AtomicU32,
    dict: Arc<dyn Dictionary>,
    table: RwLock<AccountTable>,
    index: Index,
}

impl Store {
    pub fn new(config: Config) -> Result<Self> {
        Store::with_dictionary(config, Arc::new(Dicts::new()))
    }

    pub fn with_dictionary(config: Config, dict: Arc<dyn Dictionary>) -> Result<Self> {
        let index = Index::new(Arc::clone(&dict), &config)?;
        Ok(Store {
            now: AtomicU32::new(config.now),
            config,
            dict,
            table: RwLock::new(AccountTable::default()),
            index,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Synthetic current time used for premium windows.
    pub fn now(&self) -> u32 {
        self.now.load(Ordering::Relaxed)
    }

    /// Only meaningful before the first account is indexed: premium routing
    /// is decided when a batch is built.
    pub fn set_now(&self, now: u32) {
        self.now.store(now, Ordering::Relaxed);
    }

    pub fn dictionary(&self) -> &dyn Dictionary {
        self.dict.as_ref()
    }

    pub fn catalog(&self) -> &Catalog {
        self.index.catalog()
    }

    pub(crate) fn table(&self) -> RwLockReadGuard<'_, AccountTable> {
        self.table.read()
    }

    pub fn get(&self, id: AccountId) -> Option<Account> {
        self.table.read().accounts.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.table.read().accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn intern(&self, kind: DictKind, value: &Option<String>) -> Result<NameId> {
        match value.as_deref() {
            Some(v) => self.dict.intern(kind, v),
            None => Ok(0),
        }
    }

    fn intern_interests(&self, interests: &[String]) -> Result<Vec<NameId>> {
        let mut ids: Vec<NameId> = Vec::with_capacity(interests.len());
        for interest in interests {
            let id = self.dict.intern(DictKind::Interest, interest)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn check_email(email: &str) -> Result<usize> {
        email_domain_offset(email).ok_or_else(|| Error::validation(format!("invalid email {:?}", email)))
    }

    fn check_raw(raw: &RawAccount) -> Result<()> {
        if let Some(premium) = &raw.premium {
            if premium.start > premium.finish {
                return Err(Error::validation("premium start after finish"));
            }
        }
        if let Some(interests) = &raw.interests {
            if interests.iter().any(|i| i.is_empty()) {
                return Err(Error::validation("empty interest"));
            }
        }
        Ok(())
    }

    fn like_ops(batch: &mut IndexBatch, liker: AccountId, likes: &[LikeRef]) {
        for like in likes {
            batch.like(liker, like.id, like.ts);
        }
    }

    /// Store a new account and index it according to `mode`.
    /// Required: id, email, sex, status, birth, joined.
    pub fn add(&self, raw: RawAccount, validate: bool, mode: IndexMode) -> Result<AccountId> {
        let id = raw.id.filter(|&id| id != 0).ok_or_else(|| Error::validation("id is required"))?;
        let email = raw.email.clone().ok_or_else(|| Error::validation("email is required"))?;
        let sex = raw.sex.ok_or_else(|| Error::validation("sex is required"))?;
        let status = raw.status.ok_or_else(|| Error::validation("status is required"))?;
        let birth = raw.birth.ok_or_else(|| Error::validation("birth is required"))?;
        let joined = raw.joined.ok_or_else(|| Error::validation("joined is required"))?;

        let email_domain = if validate {
            Self::check_raw(&raw)?;
            Self::check_email(&email)?
        } else {
            email_domain_offset(&email).unwrap_or(email.len())
        };

        let phone_code = raw.phone.as_deref().map_or(0, phone_code_of);
        let account = Account {
            id,
            sex,
            status,
            email_domain,
            fname: self.intern(DictKind::FirstName, &raw.fname)?,
            sname: self.intern(DictKind::Surname, &raw.sname)?,
            phone: raw.phone.clone(),
            phone_code,
            country: self.intern(DictKind::Country, &raw.country)?,
            city: self.intern(DictKind::City, &raw.city)?,
            birth,
            birth_year: year_of(birth),
            joined,
            joined_year: year_of(joined as i64),
            premium: raw.premium,
            interests: self.intern_interests(raw.interests.as_deref().unwrap_or(&[]))?,
            email,
        };

        let mut batch = IndexBatch::insert(&account, self.now());
        Self::like_ops(&mut batch, id, raw.likes.as_deref().unwrap_or(&[]));

        {
            let mut table = self.table.write();
            if table.accounts.contains_key(&id) {
                return Err(Error::conflict(format!("account {} exists", id)));
            }
            if table.emails.contains_key(&account.email) {
                return Err(Error::conflict(format!("email {} is taken", account.email)));
            }
            table.emails.insert(account.email.clone(), id);
            table.accounts.insert(id, account);
        }

        self.index.submit(batch, mode);
        Ok(id)
    }

    /// Apply the fields present in `raw` to account `id`.
    pub fn update(&self, id: AccountId, raw: RawAccount, mode: IndexMode) -> Result<()> {
        Self::check_raw(&raw)?;
        if raw.id.is_some_and(|raw_id| raw_id != id) {
            return Err(Error::validation("id cannot be changed"));
        }
        let email_domain = match &raw.email {
            Some(email) => Some(Self::check_email(email)?),
            None => None,
        };

        let (old, new) = {
            let mut table = self.table.write();
            let old = table
                .accounts
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::not_found(format!("account {}", id)))?;

            if let Some(email) = &raw.email {
                if table.emails.get(email).is_some_and(|&owner| owner != id) {
                    return Err(Error::conflict(format!("email {} is taken", email)));
                }
            }

            let mut new = old.clone();
            if let (Some(email), Some(offset)) = (&raw.email, email_domain) {
                new.email = email.clone();
                new.email_domain = offset;
            }
            if let Some(sex) = raw.sex {
                new.sex = sex;
            }
            if let Some(status) = raw.status {
                new.status = status;
            }
            if raw.fname.is_some() {
                new.fname = self.intern(DictKind::FirstName, &raw.fname)?;
            }
            if raw.sname.is_some() {
                new.sname = self.intern(DictKind::Surname, &raw.sname)?;
            }
            if let Some(phone) = &raw.phone {
                new.phone_code = phone_code_of(phone);
                new.phone = Some(phone.clone());
            }
            if raw.country.is_some() {
                new.country = self.intern(DictKind::Country, &raw.country)?;
            }
            if raw.city.is_some() {
                new.city = self.intern(DictKind::City, &raw.city)?;
            }
            if let Some(birth) = raw.birth {
                new.birth = birth;
                new.birth_year = year_of(birth);
            }
            if let Some(joined) = raw.joined {
                new.joined = joined;
                new.joined_year = year_of(joined as i64);
            }
            if let Some(premium) = raw.premium {
                new.premium = Some(premium);
            }
            if let Some(interests) = &raw.interests {
                new.interests = self.intern_interests(interests)?;
            }

            if new.email != old.email {
                table.emails.remove(&old.email);
                table.emails.insert(new.email.clone(), id);
            }
            table.accounts.insert(id, new.clone());
            (old, new)
        };

        let mut batch = IndexBatch::update(&old, &new, self.now());
        Self::like_ops(&mut batch, id, raw.likes.as_deref().unwrap_or(&[]));
        debug!(id, ops = batch.len(), "update batch");
        if !batch.is_empty() {
            self.index.submit(batch, mode);
        }
        Ok(())
    }

    /// Record like edges; every liker and likee must exist or nothing is applied.
    pub fn add_likes(&self, likes: &[RawLike], mode: IndexMode) -> Result<()> {
        {
            let table = self.table.read();
            for like in likes {
                for id in [like.liker, like.likee] {
                    if !table.accounts.contains_key(&id) {
                        return Err(Error::not_found(format!("account {}", id)));
                    }
                }
            }
        }

        let mut batch = IndexBatch::new();
        for like in likes {
            batch.like(like.liker, like.likee, like.ts);
        }
        if !batch.is_empty() {
            self.index.submit(batch, mode);
        }
        Ok(())
    }

    /// Sort every index once after bulk appends.
    pub fn finish_load(&self) {
        self.index.update_all();
        info!(accounts = self.len(), now = self.now(), "load finished");
        self.catalog().log_stats();
    }

    /// Block until queued index batches are applied.
    pub fn wait_for_index(&self) {
        self.index.wait_idle();
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }
}
