//! Bucketed transposition table.
//!
//! Each bucket holds four slots and fills one 64-byte cache line. A slot is
//! two `AtomicU64` words: the packed data and `key ^ data`. A probe accepts a
//! slot only if `stored_check ^ data == key`, so a torn write or an index
//! collision reads as a miss instead of as garbage.
//!
//! ## Data layout
//!
//! ```text
//! bits  0-15: move
//! bits 16-31: score (i16, mate distance counted from the stored node)
//! bits 32-39: depth
//! bits 40-41: bound (0 = empty)
//! bits 48-55: age
//! ```

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use kestrel_core::Move;
use tracing::debug;

use crate::search::{MATE_BOUND, MAX_PLY};

const SLOTS_PER_BUCKET: usize = 4;

/// What a stored score says about the true score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    /// The search failed high: true score >= stored score.
    Lower = 1,
    /// The search failed low: true score <= stored score.
    Upper = 2,
    Exact = 3,
}

impl Bound {
    const fn from_bits(bits: u64) -> Option<Bound> {
        match bits & 0b11 {
            1 => Some(Bound::Lower),
            2 => Some(Bound::Upper),
            3 => Some(Bound::Exact),
            _ => None,
        }
    }
}

/// Result of a successful [`TranspositionTable::retrieve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtHit {
    pub mv: Move,
    /// Root-relative score.
    pub score: i32,
    pub bound: Bound,
    pub depth: i32,
    /// Deep enough and bound-compatible with the probing window.
    pub cutoff: bool,
}

/// Rewrite a root-relative mate score as distance from this node.
fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_BOUND {
        score + ply as i32
    } else if score < -MATE_BOUND {
        score - ply as i32
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_BOUND {
        score - ply as i32
    } else if score < -MATE_BOUND {
        score + ply as i32
    } else {
        score
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    mv: Move,
    score: i16,
    depth: u8,
    bound: Option<Bound>,
    age: u8,
}

impl Entry {
    fn pack(self) -> u64 {
        self.mv.raw() as u64
            | (self.score as u16 as u64) << 16
            | (self.depth as u64) << 32
            | (self.bound.map_or(0, |b| b as u64)) << 40
            | (self.age as u64) << 48
    }

    fn unpack(data: u64) -> Entry {
        Entry {
            mv: Move::from_raw(data as u16),
            score: (data >> 16) as u16 as i16,
            depth: (data >> 32) as u8,
            bound: Bound::from_bits(data >> 40),
            age: (data >> 48) as u8,
        }
    }
}

#[derive(Default)]
struct Slot {
    check: AtomicU64,
    data: AtomicU64,
}

impl Slot {
    /// The slot's entry, if it belongs to `key`.
    fn load(&self, key: u64) -> Option<Entry> {
        let data = self.data.load(Ordering::Relaxed);
        let check = self.check.load(Ordering::Relaxed);
        let entry = Entry::unpack(data);
        (check ^ data == key && entry.bound.is_some()).then_some(entry)
    }

    fn peek(&self) -> Entry {
        Entry::unpack(self.data.load(Ordering::Relaxed))
    }

    fn write(&self, key: u64, entry: Entry) {
        let data = entry.pack();
        self.data.store(data, Ordering::Relaxed);
        self.check.store(key ^ data, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.data.store(0, Ordering::Relaxed);
        self.check.store(0, Ordering::Relaxed);
    }
}

#[derive(Default)]
#[repr(align(64))]
struct Bucket([Slot; SLOTS_PER_BUCKET]);

/// Shared transposition table.
///
/// Probes and stores take `&self`, so the table can sit behind a shared
/// reference while the search runs.
pub struct TranspositionTable {
    buckets: Box<[Bucket]>,
    mask: usize,
    age: AtomicU8,
}

impl TranspositionTable {
    /// Allocate roughly `mb` MiB, rounded down to a power of two of buckets.
    pub fn new(mb: usize) -> TranspositionTable {
        let bytes = mb.max(1) * 1024 * 1024;
        let count = bytes / std::mem::size_of::<Bucket>();
        let count = if count.is_power_of_two() { count } else { count.next_power_of_two() >> 1 };
        let count = count.max(1);
        debug!(mb, buckets = count, "allocating transposition table");

        TranspositionTable {
            buckets: (0..count).map(|_| Bucket::default()).collect(),
            mask: count - 1,
            age: AtomicU8::new(0),
        }
    }

    /// Reallocate at a new size. Previous contents are gone.
    pub fn resize(&mut self, mb: usize) {
        *self = TranspositionTable::new(mb);
    }

    pub fn clear(&self) {
        for bucket in self.buckets.iter() {
            for slot in &bucket.0 {
                slot.reset();
            }
        }
        self.age.store(0, Ordering::Relaxed);
    }

    /// Start a new search generation.
    pub fn age(&self) {
        self.age.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn bucket(&self, key: u64) -> &Bucket {
        &self.buckets[key as usize & self.mask]
    }

    /// Look `key` up for a node at `ply` searched to `depth` with `[alpha, beta]`.
    pub fn retrieve(&self, key: u64, alpha: i32, beta: i32, depth: i32, ply: usize) -> Option<TtHit> {
        let entry = self.bucket(key).0.iter().find_map(|slot| slot.load(key))?;
        let bound = entry.bound?;
        let score = score_from_tt(entry.score as i32, ply);
        let deep_enough = entry.depth as i32 >= depth;
        let cutoff = deep_enough
            && match bound {
                Bound::Exact => true,
                Bound::Lower => score >= beta,
                Bound::Upper => score <= alpha,
            };
        Some(TtHit {
            mv: entry.mv,
            score,
            bound,
            depth: entry.depth as i32,
            cutoff,
        })
    }

    /// Record a search result.
    ///
    /// A slot already holding `key` is reused, and keeps its move when `mv`
    /// is null. Otherwise the stalest slot in the bucket is overwritten,
    /// staleness being `age distance * 256 + (255 - depth)` with empty slots
    /// stalest of all.
    pub fn store(&self, key: u64, mv: Move, score: i32, bound: Bound, depth: i32, ply: usize) {
        let age = self.age.load(Ordering::Relaxed);
        let bucket = self.bucket(key);

        let mut victim = &bucket.0[0];
        let mut kept_move = Move::NULL;
        let mut worst = 0u32;
        for slot in &bucket.0 {
            if let Some(existing) = slot.load(key) {
                victim = slot;
                kept_move = existing.mv;
                break;
            }
            let entry = slot.peek();
            let staleness = match entry.bound {
                None => u32::MAX,
                Some(_) => (age.wrapping_sub(entry.age) as u32) * 256 + (255 - entry.depth as u32),
            };
            if staleness > worst {
                worst = staleness;
                victim = slot;
            }
        }

        let entry = Entry {
            mv: if mv.is_null() { kept_move } else { mv },
            score: score_to_tt(score, ply) as i16,
            depth: depth.clamp(0, MAX_PLY as i32) as u8,
            bound: Some(bound),
            age,
        };
        victim.write(key, entry);
    }

    /// Per-mille of sampled slots written during the current search.
    pub fn hashfull(&self) -> u32 {
        let age = self.age.load(Ordering::Relaxed);
        let sample = self.buckets.iter().take(1000 / SLOTS_PER_BUCKET).flat_map(|b| b.0.iter());
        let (mut used, mut total) = (0u32, 0u32);
        for slot in sample {
            let entry = slot.peek();
            total += 1;
            if entry.bound.is_some() && entry.age == age {
                used += 1;
            }
        }
        if total == 0 { 0 } else { used * 1000 / total }
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("buckets", &self.buckets.len())
            .field("age", &self.age.load(Ordering::Relaxed))
            .finish()
    }
}
