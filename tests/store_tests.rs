mod common;

use common::*;
use Matchdex::core::types::{RawAccount, RawLike, Sex, Status};
use Matchdex::query::types::FilterQuery;
use Matchdex::{ErrorKind, IndexMode};

#[test]
fn add_stores_and_indexes() {
    let store = store();
    add(&store, with_interests(with_city(raw(1, Sex::Female, Status::Single), "Россия", "Москва"), &["Пиво", "Пиво", "Кино"]));

    let account = store.get(1).unwrap();
    assert_eq!(account.domain(), "mail.ru");
    assert_eq!(account.birth_year, 1990);
    assert_eq!(account.joined_year, 2015);
    assert_eq!(account.interests.len(), 2);

    let stats = store.stats();
    assert_eq!(stats.accounts, 1);
    assert_eq!(stats.cities, 1);
    assert_eq!(stats.interests, 2);
    assert_eq!(stats.single_tier, 2);
    assert_eq!(stats.pending_batches, 0);
}

#[test]
fn add_rejects_missing_fields() {
    let store = store();
    for raw in [
        RawAccount { email: None, ..raw(1, Sex::Male, Status::Single) },
        RawAccount { sex: None, ..raw(1, Sex::Male, Status::Single) },
        RawAccount { status: None, ..raw(1, Sex::Male, Status::Single) },
        RawAccount { birth: None, ..raw(1, Sex::Male, Status::Single) },
        RawAccount { joined: None, ..raw(1, Sex::Male, Status::Single) },
        RawAccount { id: None, ..raw(1, Sex::Male, Status::Single) },
        RawAccount { email: Some("nodomain".to_string()), ..raw(1, Sex::Male, Status::Single) },
        with_premium(raw(1, Sex::Male, Status::Single), 20, 10),
    ] {
        let err = store.add(raw, true, IndexMode::Inline).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.status_code(), 400);
    }
    assert!(store.is_empty());
}

#[test]
fn add_rejects_duplicates() {
    let store = store();
    add(&store, raw(1, Sex::Male, Status::Single));

    let err = store.add(raw(1, Sex::Female, Status::Single), true, IndexMode::Inline).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let mut same_email = raw(2, Sex::Female, Status::Single);
    same_email.email = Some("user1@mail.ru".to_string());
    let err = store.add(same_email, true, IndexMode::Inline).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    assert_eq!(store.len(), 1);
    assert_eq!(store.get(1).unwrap().sex, Sex::Male);
}

#[test]
fn update_moves_postings() {
    let store = store();
    add(&store, with_city(raw(1, Sex::Female, Status::Single), "Россия", "Москва"));
    add(&store, with_city(raw(2, Sex::Female, Status::Single), "Россия", "Москва"));

    let patch = RawAccount {
        city: Some("Казань".to_string()),
        status: Some(Status::Complicated),
        ..RawAccount::default()
    };
    store.update(1, patch, IndexMode::Inline).unwrap();

    let mut query = FilterQuery::new(10);
    query.city_eq = Some("Москва".to_string());
    assert_eq!(ids(&store.filter(&query)), vec![2]);

    query.city_eq = Some("Казань".to_string());
    assert_eq!(ids(&store.filter(&query)), vec![1]);

    let mut query = FilterQuery::new(10);
    query.status_eq = Some(Status::Complicated);
    assert_eq!(ids(&store.filter(&query)), vec![1]);

    // untouched fields survive
    let account = store.get(1).unwrap();
    assert_eq!(account.email, "user1@mail.ru");
    assert_eq!(account.sex, Sex::Female);
}

#[test]
fn update_checks_email_and_id() {
    let store = store();
    add(&store, raw(1, Sex::Female, Status::Single));
    add(&store, raw(2, Sex::Male, Status::Single));

    let taken = RawAccount { email: Some("user2@mail.ru".to_string()), ..RawAccount::default() };
    assert_eq!(store.update(1, taken, IndexMode::Inline).unwrap_err().kind, ErrorKind::Conflict);

    let missing = RawAccount { sex: Some(Sex::Male), ..RawAccount::default() };
    let err = store.update(99, missing, IndexMode::Inline).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.status_code(), 404);

    let moved = RawAccount { email: Some("new@yandex.ru".to_string()), ..RawAccount::default() };
    store.update(1, moved, IndexMode::Inline).unwrap();
    assert_eq!(store.get(1).unwrap().domain(), "yandex.ru");

    // the old address is free again
    let reuse = RawAccount { email: Some("user1@mail.ru".to_string()), ..RawAccount::default() };
    store.update(2, reuse, IndexMode::Inline).unwrap();

    let mut query = FilterQuery::new(10);
    query.email_domain = Some("yandex.ru".to_string());
    assert_eq!(ids(&store.filter(&query)), vec![1]);
}

#[test]
fn add_likes_requires_known_accounts() {
    let store = store();
    add(&store, raw(1, Sex::Female, Status::Single));
    add(&store, raw(2, Sex::Male, Status::Single));

    let bad = [RawLike { liker: 1, likee: 2, ts: 10 }, RawLike { liker: 1, likee: 3, ts: 10 }];
    assert_eq!(store.add_likes(&bad, IndexMode::Inline).unwrap_err().kind, ErrorKind::NotFound);
    assert_eq!(store.stats().likes, 0);

    store.add_likes(&bad[..1], IndexMode::Inline).unwrap();
    assert_eq!(store.stats().likes, 1);

    let mut query = FilterQuery::new(10);
    query.likes_contains = Some(vec![2]);
    assert_eq!(ids(&store.filter(&query)), vec![1]);
}

#[test]
fn deferred_batches_apply_after_wait() {
    let store = store();
    for id in 1..=200 {
        let sex = if id % 2 == 0 { Sex::Male } else { Sex::Female };
        let raw = with_interests(with_city(raw(id, sex, Status::Single), "Россия", "Москва"), &["Кино"]);
        store.add(raw, true, IndexMode::Deferred).unwrap();
    }
    store.wait_for_index();

    let stats = store.stats();
    assert_eq!(stats.accounts, 200);
    assert_eq!(stats.pending_batches, 0);

    let mut query = FilterQuery::new(500);
    query.city_eq = Some("Москва".to_string());
    let found = ids(&store.filter(&query));
    assert_eq!(found.len(), 200);
    assert!(found.windows(2).all(|w| w[0] > w[1]));
}

#[test]
fn bulk_load_sorts_on_finish() {
    let store = store();
    for id in [5, 2, 9, 1, 7] {
        let raw = with_city(raw(id, Sex::Male, Status::Single), "Россия", "Москва");
        store.add(raw, false, IndexMode::Bulk).unwrap();
    }
    store.finish_load();

    let mut query = FilterQuery::new(10);
    query.city_eq = Some("Москва".to_string());
    assert_eq!(ids(&store.filter(&query)), vec![9, 7, 5, 2, 1]);
}
