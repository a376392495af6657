mod common;

use std::fs;
use common::ids;
use Matchdex::query::types::{FilterQuery, PairQuery};
use Matchdex::{ErrorKind, Store};

const ACCOUNTS_1: &str = r#"{"accounts": [
    {"id": 1, "email": "anna@mail.ru", "fname": "Анна", "sex": "f", "status": "свободны",
     "birth": 645400000, "joined": 1425168000, "city": "Москва", "country": "Россия",
     "interests": ["Кино"], "likes": [{"id": 3, "ts": 1500000000}]},
    {"id": 2, "email": "oleg@mail.ru", "sex": "m", "status": "заняты",
     "birth": 645400000, "joined": 1425168000, "city": "Москва", "country": "Россия",
     "interests": ["Кино"], "premium": {"start": 1500000000, "finish": 1600000000}}
]}"#;

const ACCOUNTS_2: &str = r#"{"accounts": [
    {"id": 3, "email": "ivan@mail.ru", "sex": "m", "status": "свободны",
     "birth": 645400000, "joined": 1425168000, "interests": ["Кино"]},
    {"id": 4, "email": "anna@mail.ru", "sex": "f", "status": "свободны",
     "birth": 645400000, "joined": 1425168000}
]}"#;

#[test]
fn open_dir_loads_options_and_documents() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("options.txt"), "1545834028\n1\n").unwrap();
    fs::write(dir.path().join("accounts_1.json"), ACCOUNTS_1).unwrap();
    fs::write(dir.path().join("accounts_2.json"), ACCOUNTS_2).unwrap();

    let store = Store::open_dir(dir.path()).unwrap();
    assert_eq!(store.now(), 1545834028);
    assert!(store.config().rating_mode);
    // account 4 reuses an email and is skipped
    assert_eq!(store.len(), 3);

    let stats = store.stats();
    assert_eq!(stats.accounts, 3);
    assert_eq!(stats.likes, 1);
    assert_eq!(stats.premium_tier, 1);

    let query = FilterQuery::from_params([("city_eq", "Москва"), ("limit", "5")]).unwrap();
    assert_eq!(ids(&store.filter(&query)), vec![2, 1]);

    let query = FilterQuery::from_params([("premium_now", "1"), ("limit", "5")]).unwrap();
    assert_eq!(ids(&store.filter(&query)), vec![2]);

    let query = FilterQuery::from_params([("likes_contains", "3"), ("limit", "5")]).unwrap();
    assert_eq!(ids(&store.filter(&query)), vec![1]);

    // premium first, then the single tier
    assert_eq!(ids(&store.recommend(1, &PairQuery::new(5)).unwrap()), vec![2, 3]);
}

#[test]
fn open_dir_without_options_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("accounts_1.json"), ACCOUNTS_1).unwrap();

    let store = Store::open_dir(dir.path()).unwrap();
    assert_eq!(store.now(), 0);
    assert_eq!(store.len(), 2);
}

#[test]
fn open_dir_reports_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("options.txt"), "not a number\n").unwrap();
    assert_eq!(Store::open_dir(dir.path()).err().unwrap().kind, ErrorKind::Validation);

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("accounts_1.json"), "{\"accounts\": [").unwrap();
    assert_eq!(Store::open_dir(dir.path()).err().unwrap().kind, ErrorKind::Parse);

    let missing = dir.path().join("nope");
    assert_eq!(Store::open_dir(&missing).err().unwrap().kind, ErrorKind::Io);
}

#[test]
fn load_likes_document_records_edges() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("accounts_1.json"), ACCOUNTS_1).unwrap();
    let store = Store::open_dir(dir.path()).unwrap();

    let likes = r#"{"likes": [{"liker": 2, "likee": 1, "ts": 1500000000}]}"#;
    assert_eq!(store.load_likes(likes.as_bytes()).unwrap(), 1);
    store.finish_load();
    assert_eq!(store.stats().likes, 2);

    let query = FilterQuery::from_params([("likes_contains", "1"), ("limit", "5")]).unwrap();
    assert_eq!(ids(&store.filter(&query)), vec![2]);

    let unknown = r#"{"likes": [{"liker": 2, "likee": 77, "ts": 1}]}"#;
    assert_eq!(store.load_likes(unknown.as_bytes()).unwrap_err().kind, ErrorKind::NotFound);
    assert_eq!(store.stats().likes, 2);
}
