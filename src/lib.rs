pub mod core;
pub mod index;
pub mod query;
pub mod search;
pub mod writer;

pub use crate::core::config::{Config, Options};
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::store::Store;
pub use crate::writer::batch::IndexMode;

/*
┌────────────────────────────────────────────────────────────────────────────────────────────┐
│                            MATCHDEX STRUCT ARCHITECTURE                                     │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────────── CORE LAYER ──────────────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                                 struct Store                                        │    │
│  │  ┌──────────────────────────────────────────────────────────────────────────────┐ │    │
│  │  │ config: Config                    // Workers, queue size, current time       │ │    │
│  │  │ now: AtomicU32                    // Synthetic time for premium windows      │ │    │
│  │  │ dict: Arc<dyn Dictionary>         // String ↔ id interning                   │ │    │
│  │  │ table: RwLock<AccountTable>       // Accounts + email uniqueness, one lock   │ │    │
│  │  │ index: Index                      // Catalog + index worker pool             │ │    │
│  │  └──────────────────────────────────────────────────────────────────────────────┘ │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                              │
│  ┌──────────────────┐  ┌──────────────────┐  ┌───────────────────────────────────────┐    │
│  │ struct Config    │  │ struct Account   │  │ trait Dictionary                      │    │
│  │ • index_workers  │  │ • id, sex, status│  │ • intern / lookup / resolve           │    │
│  │ • queue_capacity │  │ • email + domain │  │ • compare (absent sorts first)        │    │
│  │ • now            │  │ • interned names │  │ struct Dicts: one RwLock per kind     │    │
│  │ • rating_mode    │  │ • interests      │  └───────────────────────────────────────┘    │
│  └──────────────────┘  │ • premium window │                                                │
│                        └──────────────────┘                                                │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌───────────────────────────────────── INDEXING LAYER ────────────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                               struct Catalog                                        │    │
│  │  ┌──────────────────────────────────────────────────────────────────────────────┐ │    │
│  │  │ ids: IdIndex                        // Every account                         │ │    │
│  │  │ sex, status, status_sex             // AttributeIndex<K>                     │ │    │
│  │  │ birth_year, join_year, phone_code   // AttributeIndex<u16>                   │ │    │
│  │  │ first_name, country, city, interest // AttributeIndex<NameId>                │ │    │
│  │  │ premium                             // none / inactive / active              │ │    │
│  │  │ premium_tier, single, complicated,  // TierIndex: interest × city/country    │ │    │
│  │  │ relationship                        //                                       │ │    │
│  │  │ liker: LikerIndex, likee            // Like edges both ways                  │ │    │
│  │  │ cube: AggregationCube               // Precomputed group-by buckets          │ │    │
│  │  └──────────────────────────────────────────────────────────────────────────────┘ │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│                                                                                              │
│  ┌──────────────────┐  ┌───────────────────┐  ┌────────────────────────────────────┐      │
│  │ struct PostingLst│  │ struct GroupHash   │  │ struct AggregationCube             │      │
│  │ • ids: Arc<Vec>  │  │ • sex      8b      │  │ • slices: (filter, group) masks    │      │
│  │ • sorted desc    │  │ • status   8b      │  │ • buckets: filter value → Bucket   │      │
│  │ • copy on write  │  │ • city    16b      │  │ • Bucket: entries sorted by count  │      │
│  └──────────────────┘  │ • country  8b      │  └────────────────────────────────────┘      │
│                        │ • interest 8b      │                                               │
│                        │ • joined   8b      │                                               │
│                        │ • birth    8b      │                                               │
│                        └───────────────────┘                                               │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────────────── SEARCH LAYER ─────────────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────┐  ┌──────────────────────┐  ┌─────────────────────┐            │
│  │ trait Cursor           │  │ struct ResolvedFilter│  │ struct ResolvedGroup│            │
│  │ • PostingCursor        │  │ • names → ids        │  │ • filter/group mask │            │
│  │ • Union                │  │ • matches()          │  │ • filter value      │            │
│  │ • Intersect            │  │ plan_filter → Source │  │ • sources()         │            │
│  └────────────────────────┘  └──────────────────────┘  └─────────────────────┘            │
│                                                                                              │
│  Store::filter     sources → intersect → residual check → limit                             │
│  Store::group      cube bucket, or live scan re-aggregated into a Bucket                    │
│  Store::recommend  premium pools, then status tiers, ranked by compatibility                 │
│  Store::suggest    co-likers ranked by similarity, their targets collected                  │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌───────────────────────────────────── WRITER LAYER ──────────────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────┐  ┌──────────────────────┐  ┌─────────────────────┐            │
│  │ struct IndexBatch      │  │ struct IndexWorker   │  │ enum IndexMode      │            │
│  │ • ops: Vec<IndexOp>    │  │ • crossbeam channel  │  │ • Bulk (append)     │            │
│  │ • insert / update      │  │ • N named threads    │  │ • Inline            │            │
│  │ • like                 │  │ • pending + Condvar  │  │ • Deferred          │            │
│  └────────────────────────┘  └──────────────────────┘  └─────────────────────┘            │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────────── RELATIONSHIPS ────────────────────────────────────────────┐
│                                                                                              │
│  Store ──owns──> AccountTable                                                               │
│    │                                                                                        │
│    └──owns──> Index ──owns──> Catalog ──contains──> AttributeIndex ──contains──> PostingList│
│                 │                │                                                          │
│                 │                └──contains──> AggregationCube ──keys──> GroupHash         │
│                 │                                                                           │
│                 └──owns──> IndexWorker ──applies──> IndexBatch ──to──> Catalog              │
│                                                                                              │
│  Store::add/update ──builds──> IndexBatch ──Bulk/Inline──> Catalog::apply_batch             │
│                                     └──Deferred──> IndexWorker                              │
│                                                                                              │
│  Store::filter/group ──plans──> Source ──opens──> Cursor ──walks──> AccountTable            │
└──────────────────────────────────────────────────────────────────────────────────────────────┘
*/
