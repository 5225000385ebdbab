use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, FixedOffset};
use tracing::debug;

use crate::model::{NewsItem, RankedItem};

#[derive(Debug, Clone)]
pub struct SelectorParams {
    pub window_hours: i64,
    pub min_per_feed: usize,
    /// None disables the cap entirely
    pub global_limit: Option<usize>,
}

/// What the page renders: the ordered stories, the distinct publishers in
/// them, and the window the selection ran with.
#[derive(Debug)]
pub struct Selection {
    pub items: Vec<RankedItem>,
    pub publishers: Vec<String>,
    pub window_hours: i64,
}

/// Pick and order the stories to show.
///
/// 1) Prefer items from the last `window_hours` hours (display zone).
/// 2) Guarantee at least `min_per_feed` items from each feed that returned
///    any data at all, even if older than the window.
/// 3) Sort newest to oldest and trim to `global_limit`.
///
/// Pure with respect to its inputs: no I/O, nothing shared, the same pool
/// and the same `now_local` always produce the same selection. Undated
/// items rank as `now_local`, so a feed that never sends timestamps shows
/// up at the top rather than being dropped.
pub fn select(
    pool: &[NewsItem],
    feed_names: &[String],
    params: &SelectorParams,
    now_local: DateTime<FixedOffset>,
) -> Selection {
    let offset = *now_local.offset();
    let cutoff = now_local - Duration::hours(params.window_hours);

    let ranked: Vec<RankedItem> = pool
        .iter()
        .map(|item| RankedItem {
            published_local: item
                .published_utc
                .map(|dt| dt.with_timezone(&offset))
                .unwrap_or(now_local),
            item: item.clone(),
        })
        .collect();

    // Seed: everything inside the window, newest first, deduped by
    // (feed, link) keeping the newest occurrence.
    let mut within_window: Vec<RankedItem> = ranked
        .iter()
        .filter(|r| r.published_local >= cutoff)
        .cloned()
        .collect();
    within_window.sort_by(|a, b| b.published_local.cmp(&a.published_local));

    let mut final_items: Vec<RankedItem> = Vec::with_capacity(within_window.len());
    let mut seen_keys: HashSet<(String, String)> = HashSet::new();
    for r in within_window {
        if seen_keys.insert(r.item.dedup_key()) {
            final_items.push(r);
        }
    }

    debug!(
        within_window = final_items.len(),
        window_hours = params.window_hours,
        "items after window filter"
    );

    // Floor pass, in registry order. A feed with nothing in the pool
    // imposes no floor; a feed below its floor tops up from its newest
    // not-yet-seen items regardless of the window.
    for feed_name in feed_names {
        let mut feed_pool: Vec<&RankedItem> = ranked
            .iter()
            .filter(|r| &r.item.feed_name == feed_name)
            .collect();
        if feed_pool.is_empty() {
            continue;
        }

        let mut already_in = final_items
            .iter()
            .filter(|r| &r.item.feed_name == feed_name)
            .count();
        if already_in >= params.min_per_feed {
            continue;
        }

        feed_pool.sort_by(|a, b| b.published_local.cmp(&a.published_local));
        for cand in feed_pool {
            if !seen_keys.insert(cand.item.dedup_key()) {
                continue;
            }
            final_items.push(cand.clone());
            already_in += 1;
            if already_in >= params.min_per_feed {
                break;
            }
        }
    }

    // Fallback insertions can land anywhere in recency order, so sort the
    // whole list again before trimming. Old fallback items may fall off the
    // end here when the page is full.
    final_items.sort_by(|a, b| b.published_local.cmp(&a.published_local));

    if let Some(limit) = params.global_limit {
        final_items.truncate(limit);
    }

    let mut publishers: Vec<String> = final_items
        .iter()
        .map(|r| r.item.publisher.clone())
        .collect();
    publishers.sort();
    publishers.dedup();

    let mut counts_by_feed: HashMap<&str, usize> = HashMap::new();
    for r in &final_items {
        *counts_by_feed.entry(r.item.feed_name.as_str()).or_insert(0) += 1;
    }
    debug!(?counts_by_feed, "items per feed in final selection");

    Selection {
        items: final_items,
        publishers,
        window_hours: params.window_hours,
    }
}
