use std::sync::Arc;
use std::thread::{self, JoinHandle};
use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};
use crate::core::error::{Error, ErrorKind, Result};
use crate::index::catalog::Catalog;
use crate::writer::batch::IndexBatch;

struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Pending {
    fn enter(&self) {
        *self.count.lock() += 1;
    }

    fn leave(&self) {
        let mut count = self.count.lock();
        *count -= 1;
        if *count == 0 {
            self.idle.notify_all();
        }
    }
}

/// Fixed pool of threads, each draining its own bounded queue.
/// A batch goes to the queue picked by its account id, so batches of one
/// account apply in submission order; different accounts may interleave.
pub struct IndexWorker {
    senders: Vec<Sender<IndexBatch>>,
    handles: Vec<JoinHandle<()>>,
    pending: Arc<Pending>,
}

impl IndexWorker {
    pub fn spawn(catalog: Arc<Catalog>, workers: usize, capacity: usize) -> Result<Self> {
        let workers = workers.max(1);
        let per_queue = (capacity / workers).max(1);
        let pending = Arc::new(Pending {
            count: Mutex::new(0),
            idle: Condvar::new(),
        });

        let mut senders = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for n in 0..workers {
            let (sender, receiver) = bounded(per_queue);
            let catalog = Arc::clone(&catalog);
            let pending = Arc::clone(&pending);
            let handle = thread::Builder::new()
                .name(format!("index-worker-{}", n))
                .spawn(move || Self::run(n, receiver, catalog, pending))?;
            senders.push(sender);
            handles.push(handle);
        }

        Ok(IndexWorker {
            senders,
            handles,
            pending,
        })
    }

    fn run(n: usize, receiver: Receiver<IndexBatch>, catalog: Arc<Catalog>, pending: Arc<Pending>) {
        let mut applied = 0usize;
        while let Ok(batch) = receiver.recv() {
            catalog.apply_batch(&batch, false);
            pending.leave();
            applied += 1;
        }
        debug!(worker = n, applied, "index worker stopped");
    }

    /// Queue index of a batch.
    fn route(&self, batch: &IndexBatch) -> usize {
        batch.account().map_or(0, |id| id as usize % self.senders.len())
    }

    /// Queue a batch; blocks only while its queue is full.
    /// On a closed queue the batch is handed back inside the error.
    pub fn submit(&self, batch: IndexBatch) -> std::result::Result<(), (Error, IndexBatch)> {
        if self.senders.is_empty() {
            return Err((Error::new(ErrorKind::Internal, "index worker stopped".to_string()), batch));
        }
        let queue = self.route(&batch);

        self.pending.enter();
        if let Err(err) = self.senders[queue].send(batch) {
            self.pending.leave();
            warn!(queue, "index queue disconnected");
            return Err((
                Error::new(ErrorKind::Internal, "index queue disconnected".to_string()),
                err.into_inner(),
            ));
        }
        Ok(())
    }

    /// Block until every submitted batch has been applied.
    pub fn wait_idle(&self) {
        let mut count = self.pending.count.lock();
        while *count > 0 {
            self.pending.idle.wait(&mut count);
        }
    }

    pub fn pending(&self) -> usize {
        *self.pending.count.lock()
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for IndexWorker {
    fn drop(&mut self) {
        self.senders.clear();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dict::Dicts;
    use crate::writer::batch::{IndexKey, IndexOp};

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::new(Arc::new(Dicts::new())))
    }

    #[test]
    fn applies_all_batches() {
        let catalog = catalog();
        let worker = IndexWorker::spawn(Arc::clone(&catalog), 2, 16).unwrap();
        assert_eq!(worker.worker_count(), 2);

        for id in 1..=100 {
            let batch = IndexBatch {
                ops: vec![
                    IndexOp::Insert { id, key: IndexKey::Id },
                    IndexOp::Insert { id, key: IndexKey::City((id % 3) + 1) },
                ],
            };
            worker.submit(batch).unwrap();
        }
        worker.wait_idle();

        assert_eq!(worker.pending(), 0);
        assert_eq!(catalog.ids.len(), 100);
        assert_eq!(catalog.city.posting_count(), 100);
        assert!(catalog.city.is_sorted());
    }

    #[test]
    fn batches_of_one_account_apply_in_order() {
        let catalog = catalog();
        let worker = IndexWorker::spawn(Arc::clone(&catalog), 4, 8).unwrap();

        // every account hops through cities 1..=50 one move at a time;
        // a move applied before its predecessor leaves a stray posting
        for id in 1..=20u32 {
            worker
                .submit(IndexBatch { ops: vec![IndexOp::Insert { id, key: IndexKey::City(1) }] })
                .unwrap();
        }
        for city in 1..50u32 {
            for id in 1..=20u32 {
                let batch = IndexBatch {
                    ops: vec![
                        IndexOp::Remove { id, key: IndexKey::City(city) },
                        IndexOp::Insert { id, key: IndexKey::City(city + 1) },
                    ],
                };
                worker.submit(batch).unwrap();
            }
        }
        worker.wait_idle();

        assert_eq!(catalog.city.posting_count(), 20);
        assert_eq!(catalog.city.len(50), 20);
        for id in 1..=20u32 {
            assert!(catalog.city.contains(50, id));
        }
    }

    #[test]
    fn batches_without_account_go_to_first_queue() {
        let worker = IndexWorker::spawn(catalog(), 3, 9).unwrap();
        assert_eq!(worker.route(&IndexBatch::new()), 0);

        let batch = IndexBatch { ops: vec![IndexOp::Insert { id: 5, key: IndexKey::Id }] };
        assert_eq!(worker.route(&batch), 2);
    }
}
