//! Like/dislike bookkeeping.
//!
//! Each operation runs as one `BEGIN IMMEDIATE` transaction on the writer
//! connection: the reaction row and the denormalized counter on the parent
//! row change together or not at all. The UNIQUE constraints on
//! `(quote_id, user_id)` and `(comment_id, user_id)` back this up.

use anyhow::{Result, anyhow};
use quotes_types::models::ReactionKind;
use rusqlite::{Transaction, TransactionBehavior};
use tracing::debug;

use crate::{Database, OptionalExt};

/// What a quote reaction request did to the caller's stored reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// No reaction existed; one of this kind was recorded.
    Added(ReactionKind),
    /// The same reaction was repeated and has been removed.
    Removed(ReactionKind),
    /// The opposite reaction was replaced in place.
    Switched { from: ReactionKind, to: ReactionKind },
}

impl ReactionOutcome {
    /// Decide the outcome from the stored reaction (if any) and the request.
    pub fn resolve(existing: Option<ReactionKind>, requested: ReactionKind) -> Self {
        match existing {
            None => ReactionOutcome::Added(requested),
            Some(current) if current == requested => ReactionOutcome::Removed(requested),
            Some(current) => ReactionOutcome::Switched {
                from: current,
                to: requested,
            },
        }
    }

    /// `(likes, dislikes)` adjustments for the quote's counters.
    pub fn counter_deltas(self) -> (i64, i64) {
        fn unit(kind: ReactionKind) -> (i64, i64) {
            match kind {
                ReactionKind::Like => (1, 0),
                ReactionKind::Dislike => (0, 1),
            }
        }

        match self {
            ReactionOutcome::Added(kind) => unit(kind),
            ReactionOutcome::Removed(kind) => {
                let (l, d) = unit(kind);
                (-l, -d)
            }
            ReactionOutcome::Switched { from, to } => {
                let (fl, fd) = unit(from);
                let (tl, td) = unit(to);
                (tl - fl, td - fd)
            }
        }
    }

    /// The caller's reaction once the outcome is applied.
    pub fn current(self) -> Option<ReactionKind> {
        match self {
            ReactionOutcome::Added(kind) => Some(kind),
            ReactionOutcome::Removed(_) => None,
            ReactionOutcome::Switched { to, .. } => Some(to),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteReaction {
    pub outcome: ReactionOutcome,
    pub likes_count: i64,
    pub dislikes_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentLikeToggle {
    pub liked: bool,
    pub likes_count: i64,
}

impl Database {
    /// Apply `kind` from `user_id` to a quote: add, toggle off, or switch.
    /// Returns `None` when the quote does not exist.
    pub fn react_to_quote(
        &self,
        quote_id: i64,
        user_id: i64,
        kind: ReactionKind,
    ) -> Result<Option<QuoteReaction>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !exists(&tx, "SELECT 1 FROM quotes WHERE id = ?1", quote_id)? {
                return Ok(None);
            }

            let existing: Option<(i64, String)> = tx
                .query_row(
                    "SELECT id, kind FROM quote_likes WHERE quote_id = ?1 AND user_id = ?2",
                    [quote_id, user_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let existing = match existing {
                Some((id, stored)) => {
                    let stored = stored.parse::<ReactionKind>().map_err(|e| anyhow!(e))?;
                    Some((id, stored))
                }
                None => None,
            };

            let outcome = ReactionOutcome::resolve(existing.map(|(_, k)| k), kind);
            match (outcome, existing) {
                (ReactionOutcome::Added(kind), _) => {
                    tx.execute(
                        "INSERT INTO quote_likes (quote_id, user_id, kind) VALUES (?1, ?2, ?3)",
                        rusqlite::params![quote_id, user_id, kind.as_str()],
                    )?;
                }
                (ReactionOutcome::Removed(_), Some((id, _))) => {
                    tx.execute("DELETE FROM quote_likes WHERE id = ?1", [id])?;
                }
                (ReactionOutcome::Switched { to, .. }, Some((id, _))) => {
                    tx.execute(
                        "UPDATE quote_likes SET kind = ?1 WHERE id = ?2",
                        rusqlite::params![to.as_str(), id],
                    )?;
                }
                (outcome, None) => {
                    return Err(anyhow!("{:?} resolved without a stored reaction", outcome));
                }
            }

            let (likes_delta, dislikes_delta) = outcome.counter_deltas();
            let (likes_count, dislikes_count) = tx.query_row(
                "UPDATE quotes
                 SET likes_count = likes_count + ?1, dislikes_count = dislikes_count + ?2
                 WHERE id = ?3
                 RETURNING likes_count, dislikes_count",
                [likes_delta, dislikes_delta, quote_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            tx.commit()?;

            debug!(
                "Quote {} reaction by user {}: {:?} (likes={}, dislikes={})",
                quote_id, user_id, outcome, likes_count, dislikes_count
            );
            Ok(Some(QuoteReaction {
                outcome,
                likes_count,
                dislikes_count,
            }))
        })
    }

    /// Like a comment, or remove the like if the user already left one.
    /// Returns `None` when the comment does not exist.
    pub fn toggle_comment_like(
        &self,
        comment_id: i64,
        user_id: i64,
    ) -> Result<Option<CommentLikeToggle>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !exists(&tx, "SELECT 1 FROM comments WHERE id = ?1", comment_id)? {
                return Ok(None);
            }

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM comment_likes WHERE comment_id = ?1 AND user_id = ?2",
                    [comment_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;

            let (liked, delta) = match existing {
                Some(id) => {
                    tx.execute("DELETE FROM comment_likes WHERE id = ?1", [id])?;
                    (false, -1)
                }
                None => {
                    tx.execute(
                        "INSERT INTO comment_likes (comment_id, user_id) VALUES (?1, ?2)",
                        [comment_id, user_id],
                    )?;
                    (true, 1)
                }
            };

            let likes_count: i64 = tx.query_row(
                "UPDATE comments SET likes_count = likes_count + ?1 WHERE id = ?2
                 RETURNING likes_count",
                [delta, comment_id],
                |row| row.get(0),
            )?;

            tx.commit()?;

            debug!(
                "Comment {} like by user {}: liked={} (likes={})",
                comment_id, user_id, liked, likes_count
            );
            Ok(Some(CommentLikeToggle { liked, likes_count }))
        })
    }
}

fn exists(tx: &Transaction<'_>, sql: &str, id: i64) -> Result<bool> {
    Ok(tx.query_row(sql, [id], |_| Ok(())).optional()?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{open_temp, quote, user};
    use std::sync::Arc;

    use ReactionKind::{Dislike, Like};

    /// Stored counters must always match the reaction rows.
    fn assert_quote_consistent(db: &Database, quote_id: i64) -> (i64, i64) {
        db.with_conn(|conn| {
            let (likes, dislikes): (i64, i64) = conn.query_row(
                "SELECT likes_count, dislikes_count FROM quotes WHERE id = ?1",
                [quote_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )?;
            let (true_likes, true_dislikes): (i64, i64) = conn.query_row(
                "SELECT COALESCE(SUM(kind = 'like'), 0), COALESCE(SUM(kind = 'dislike'), 0)
                 FROM quote_likes WHERE quote_id = ?1",
                [quote_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )?;
            assert_eq!((likes, dislikes), (true_likes, true_dislikes));
            Ok((likes, dislikes))
        })
        .unwrap()
    }

    fn reaction_rows(db: &Database, quote_id: i64, user_id: i64) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM quote_likes WHERE quote_id = ?1 AND user_id = ?2",
                [quote_id, user_id],
                |r| r.get(0),
            )?)
        })
        .unwrap()
    }

    #[test]
    fn resolve_covers_add_toggle_and_switch() {
        assert_eq!(ReactionOutcome::resolve(None, Like), ReactionOutcome::Added(Like));
        assert_eq!(ReactionOutcome::resolve(Some(Like), Like), ReactionOutcome::Removed(Like));
        assert_eq!(
            ReactionOutcome::resolve(Some(Like), Dislike),
            ReactionOutcome::Switched { from: Like, to: Dislike }
        );
    }

    #[test]
    fn counter_deltas() {
        assert_eq!(ReactionOutcome::Added(Like).counter_deltas(), (1, 0));
        assert_eq!(ReactionOutcome::Added(Dislike).counter_deltas(), (0, 1));
        assert_eq!(ReactionOutcome::Removed(Like).counter_deltas(), (-1, 0));
        assert_eq!(ReactionOutcome::Removed(Dislike).counter_deltas(), (0, -1));
        assert_eq!(
            ReactionOutcome::Switched { from: Like, to: Dislike }.counter_deltas(),
            (-1, 1)
        );
        assert_eq!(
            ReactionOutcome::Switched { from: Dislike, to: Like }.counter_deltas(),
            (1, -1)
        );
    }

    #[test]
    fn liking_twice_restores_counters() {
        let (_dir, db) = open_temp();
        let alice = user(&db, "alice");
        let q = quote(&db, alice, "q");

        let first = db.react_to_quote(q, alice, Like).unwrap().unwrap();
        assert_eq!(first.outcome, ReactionOutcome::Added(Like));
        assert_eq!((first.likes_count, first.dislikes_count), (1, 0));

        let second = db.react_to_quote(q, alice, Like).unwrap().unwrap();
        assert_eq!(second.outcome, ReactionOutcome::Removed(Like));
        assert_eq!((second.likes_count, second.dislikes_count), (0, 0));

        assert_eq!(reaction_rows(&db, q, alice), 0);
        assert_quote_consistent(&db, q);
    }

    #[test]
    fn like_then_dislike_switches() {
        let (_dir, db) = open_temp();
        let alice = user(&db, "alice");
        let q = quote(&db, alice, "q");

        db.react_to_quote(q, alice, Like).unwrap().unwrap();
        let switched = db.react_to_quote(q, alice, Dislike).unwrap().unwrap();

        assert_eq!(
            switched.outcome,
            ReactionOutcome::Switched { from: Like, to: Dislike }
        );
        assert_eq!((switched.likes_count, switched.dislikes_count), (0, 1));
        assert_eq!(reaction_rows(&db, q, alice), 1);
        assert_quote_consistent(&db, q);
    }

    #[test]
    fn counters_track_rows_across_many_users() {
        let (_dir, db) = open_temp();
        let users: Vec<i64> = (0..5).map(|i| user(&db, &format!("user{}", i))).collect();
        let q = quote(&db, users[0], "q");

        // Scripted mix of adds, toggles and switches.
        let script = [
            (0, Like),
            (1, Like),
            (2, Dislike),
            (3, Like),
            (1, Dislike),
            (0, Like),
            (4, Dislike),
            (3, Dislike),
            (2, Dislike),
            (4, Like),
        ];
        for (who, kind) in script {
            db.react_to_quote(q, users[who], kind).unwrap().unwrap();
            assert_quote_consistent(&db, q);
            assert!(reaction_rows(&db, q, users[who]) <= 1);
        }

        // 4 liked; 1 and 3 disliked; 0 and 2 toggled off.
        assert_eq!(assert_quote_consistent(&db, q), (1, 2));
    }

    #[test]
    fn missing_quote_is_reported_and_nothing_changes() {
        let (_dir, db) = open_temp();
        let alice = user(&db, "alice");

        assert!(db.react_to_quote(404, alice, Like).unwrap().is_none());

        let rows: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM quote_likes", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn failed_transaction_leaves_no_trace() {
        let (_dir, db) = open_temp();
        let alice = user(&db, "alice");
        let q = quote(&db, alice, "q");

        // No such user: the insert trips the foreign key and the whole
        // transaction rolls back.
        assert!(db.react_to_quote(q, 9999, Like).is_err());
        assert_eq!(assert_quote_consistent(&db, q), (0, 0));

        // The writer is usable afterwards.
        db.react_to_quote(q, alice, Like).unwrap().unwrap();
        assert_eq!(assert_quote_consistent(&db, q), (1, 0));
    }

    #[test]
    fn comment_like_toggles() {
        let (_dir, db) = open_temp();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let q = quote(&db, alice, "q");
        let c = db.create_comment(q, alice, "hi").unwrap();

        let on = db.toggle_comment_like(c, bob).unwrap().unwrap();
        assert_eq!(on, CommentLikeToggle { liked: true, likes_count: 1 });

        let also = db.toggle_comment_like(c, alice).unwrap().unwrap();
        assert_eq!(also.likes_count, 2);

        let off = db.toggle_comment_like(c, bob).unwrap().unwrap();
        assert_eq!(off, CommentLikeToggle { liked: false, likes_count: 1 });

        assert!(db.toggle_comment_like(404, bob).unwrap().is_none());
    }

    #[test]
    fn concurrent_reactions_stay_consistent() {
        let (_dir, db) = open_temp();
        let db = Arc::new(db);
        let users: Vec<i64> = (0..8).map(|i| user(&db, &format!("user{}", i))).collect();
        let q = quote(&db, users[0], "q");

        let handles: Vec<_> = users
            .iter()
            .copied()
            .map(|uid| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    // Each user: like, dislike, like -> ends on like.
                    for kind in [Like, Dislike, Like] {
                        db.react_to_quote(q, uid, kind).unwrap().unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(assert_quote_consistent(&db, q), (8, 0));
    }
}
