use super::types::{ClusterId, Clustering};
use crate::error::DedupError;
use crate::models::Article;
use clap::ValueEnum;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;

/// Which member of a cluster survives into the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum KeepStrategy {
    /// The least sensationalised report of the story.
    #[default]
    LowestHype,
    HighestHype,
    /// Whichever article appeared first in the input.
    FirstSeen,
}

impl fmt::Display for KeepStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeepStrategy::LowestHype => "lowest-hype",
            KeepStrategy::HighestHype => "highest-hype",
            KeepStrategy::FirstSeen => "first-seen",
        };
        f.write_str(name)
    }
}

/// The article chosen to stand for one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Representative {
    pub cluster_id: ClusterId,
    /// Position of the winner in the clustered article slice.
    pub index: usize,
    pub cluster_size: usize,
}

/// Pick exactly one article per cluster.
///
/// Articles are ordered by the strategy's key with `Article::id` as the
/// final tie-break, then the first article met in each cluster wins. The
/// result is sorted by cluster id.
///
/// # Errors
///
/// - [`DedupError::LabelCount`] if `clustering` does not cover `articles`
/// - [`DedupError::EmptyCluster`] if a cluster has no members or no winner.
///   Neither can happen for a partition built by the engine, so either one
///   means its bookkeeping is broken.
pub fn select_representatives(
    articles: &[Article],
    clustering: &Clustering,
    keep: KeepStrategy,
) -> Result<Vec<Representative>, DedupError> {
    if clustering.item_count() != articles.len() {
        return Err(DedupError::LabelCount {
            expected: articles.len(),
            got: clustering.item_count(),
        });
    }

    let mut order: Vec<usize> = (0..articles.len()).collect();
    match keep {
        KeepStrategy::LowestHype => {
            order.sort_by_key(|&i| (articles[i].hype_score, articles[i].id));
        }
        KeepStrategy::HighestHype => {
            order.sort_by_key(|&i| (Reverse(articles[i].hype_score), articles[i].id));
        }
        KeepStrategy::FirstSeen => order.sort_by_key(|&i| articles[i].id),
    }

    let mut winners: BTreeMap<ClusterId, usize> = BTreeMap::new();
    for idx in order {
        winners.entry(clustering.label(idx)).or_insert(idx);
    }

    clustering
        .iter()
        .map(|(cluster_id, members)| {
            let index = winners.get(&cluster_id).copied();
            match index {
                Some(index) if !members.is_empty() => Ok(Representative {
                    cluster_id,
                    index,
                    cluster_size: members.len(),
                }),
                _ => Err(DedupError::EmptyCluster { cluster_id }),
            }
        })
        .collect()
}
